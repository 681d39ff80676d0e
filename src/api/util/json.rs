use anyhow::Result;
use axum::Json;

use crate::api::dto::ApiResponse;
use crate::errors::{AppError, internal_error};

/// Wraps a service result in the success envelope, or maps the failure to a
/// 500 that carries the original error text.
pub fn to_json<T: serde::Serialize>(result: Result<T>) -> Result<Json<ApiResponse<T>>, AppError> {
    match result {
        Ok(value) => Ok(Json(ApiResponse::ok(value))),
        Err(err) => Err(internal_error(err)),
    }
}
