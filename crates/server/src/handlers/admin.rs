//! Tenant, schema, and health endpoints.

use crate::error::ApiResult;
use crate::handlers::require_json;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use lantern_cache::keys;
use lantern_core::tenant::parse_origin_value;
use lantern_core::Tenant;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// POST /api/resolve-tenant body.
#[derive(Debug, Deserialize)]
pub struct ResolveTenantRequest {
    pub hostname: String,
}

/// POST /api/resolve-tenant response.
#[derive(Debug, Serialize)]
pub struct ResolveTenantResponse {
    pub hostname: String,
    pub tenant: Option<String>,
}

/// POST /api/resolve-tenant - Look up the tenant mapped to a hostname.
///
/// An unmapped or malformed mapping reports `tenant: null` rather than an
/// error; the widget falls back to the default tenant.
pub async fn resolve_tenant(
    State(state): State<AppState>,
    body: Result<Json<ResolveTenantRequest>, JsonRejection>,
) -> ApiResult<Json<ResolveTenantResponse>> {
    let request = require_json(body)?;
    let tenant = match state.kv.get(&keys::origin(&request.hostname)).await {
        Ok(Some(value)) => match parse_origin_value(&value) {
            Ok(tenant) => Some(tenant.as_str().to_string()),
            Err(e) => {
                tracing::warn!(hostname = %request.hostname, error = %e, "unusable origin mapping");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(hostname = %request.hostname, error = %e, "origin lookup failed");
            None
        }
    };
    Ok(Json(ResolveTenantResponse {
        hostname: request.hostname,
        tenant,
    }))
}

/// POST /api/refresh-schema body.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshSchemaRequest {
    #[serde(default)]
    pub tenant: Option<String>,
}

/// POST /api/refresh-schema response.
#[derive(Debug, Serialize)]
pub struct RefreshSchemaResponse {
    pub status: &'static str,
    pub tenant: String,
}

/// POST /api/refresh-schema - Drop a tenant's cached schema so the next
/// request rebuilds it from the database.
pub async fn refresh_schema(
    State(state): State<AppState>,
    body: Result<Json<RefreshSchemaRequest>, JsonRejection>,
) -> ApiResult<Json<RefreshSchemaResponse>> {
    let request = require_json(body).unwrap_or_default();
    let raw = request
        .tenant
        .unwrap_or_else(|| state.config.tenancy.default_tenant.clone());
    let tenant = Tenant::parse(&raw).map_err(lantern_pipeline::PipelineError::BadTenant)?;

    lantern_db::invalidate_schema(state.kv.as_ref(), &tenant)
        .await
        .map_err(lantern_pipeline::PipelineError::Db)?;
    tracing::info!(tenant = %tenant, "schema cache invalidated");

    Ok(Json(RefreshSchemaResponse {
        status: "ok",
        tenant: tenant.as_str().to_string(),
    }))
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}

/// GET /health - Health check.
///
/// Intentionally unauthenticated and dependency-free so load balancers
/// and uptime probes get an answer even with collaborators down.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default(),
    })
}
