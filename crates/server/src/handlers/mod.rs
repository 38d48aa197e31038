//! HTTP request handlers.

pub mod admin;
pub mod explain;

pub use admin::*;
pub use explain::*;

use crate::error::ApiError;
use axum::extract::rejection::JsonRejection;
use axum::Json;

/// Unwrap a JSON body, turning extractor rejections into 400s with the
/// standard error shape instead of axum's default plain-text reply.
pub(crate) fn require_json<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
    }
}
