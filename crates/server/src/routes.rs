//! Route configuration.

use crate::error::ApiError;
use crate::handlers;
use crate::state::AppState;
use axum::extract::Request;
use axum::http::{header, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Rewrite preflight responses to 204. The CORS layer answers OPTIONS
/// itself with 200; the contract with the widget is 204 No Content with
/// the allow headers.
async fn preflight_no_content(request: Request, next: Next) -> Response {
    let is_options = request.method() == Method::OPTIONS;
    let mut response = next.run(request).await;
    if is_options && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    // The widget is embedded in the CMS control panel on another origin,
    // so every response carries permissive CORS headers and preflights
    // answer from the layer.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    // Middleware layers are applied in reverse order (outermost first).
    // Order of execution: TraceLayer -> preflight status -> CORS -> Handler
    Router::new()
        .route("/api/explain", post(handlers::explain))
        .route("/api/explain/stream", post(handlers::explain_stream))
        .route("/api/resolve-tenant", post(handlers::resolve_tenant))
        .route("/api/refresh-schema", post(handlers::refresh_schema))
        .route("/health", get(handlers::health_check))
        .fallback(|| async { ApiError::NotFound("no such route".to_string()) })
        .layer(cors)
        .layer(middleware::from_fn(preflight_no_content))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
