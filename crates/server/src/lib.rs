//! HTTP API server for Lantern.
//!
//! This crate provides the HTTP control plane:
//! - Buffered and streaming explanation endpoints
//! - Hostname-to-tenant resolution
//! - Schema cache refresh
//! - Health check
//! - CORS for the dashboard widget

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
