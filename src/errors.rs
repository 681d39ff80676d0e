use std::time::Duration;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Failures raised by the time-series query paths.
///
/// A failed store call is never folded into an empty result set: callers must
/// be able to tell "no data in range" apart from "query failed".
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("time-series store request failed: {0}")]
    Store(String),

    #[error("time-series store response could not be decoded: {0}")]
    Decode(String),

    #[error("time-series store request timed out after {0:?}")]
    Timeout(Duration),

    #[error("unsupported granularity: {0:?}")]
    InvalidGranularity(String),

    #[error("unsupported sort field: {0:?}")]
    InvalidSortField(String),

    #[error("invalid time expression: {0:?}")]
    InvalidTimeExpr(String),

    #[error("unknown dimension: {0:?}")]
    InvalidDimension(String),

    #[error("result set exceeds {cap} rows; narrow the time range or coarsen the granularity")]
    ResultSetTooLarge { cap: usize },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error("Input validation failed")]
    Validation(#[from] validator::ValidationErrors),

    #[error("{0}")]
    Query(#[from] QueryError),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Helper for mapping any unknown error into internal error
pub fn internal_error<E: ToString>(err: E) -> AppError {
    AppError::InternalServerError(err.to_string())
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        // Choose status codes per variant
        let status = match &self {
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Query(err) => match err {
                QueryError::InvalidGranularity(_)
                | QueryError::InvalidSortField(_)
                | QueryError::InvalidTimeExpr(_)
                | QueryError::InvalidDimension(_) => StatusCode::BAD_REQUEST,
                QueryError::ResultSetTooLarge { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                QueryError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                QueryError::Store(_) | QueryError::Decode(_) => StatusCode::BAD_GATEWAY,
            },
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        let details = match &self {
            AppError::Validation(errors) => serde_json::to_value(errors).ok(),
            _ => None,
        };

        // Same envelope shape the success path uses, with success: false
        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
            "details": details,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_failures_map_to_bad_gateway() {
        let resp = AppError::from(QueryError::Store("connection refused".into())).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn timeouts_map_to_gateway_timeout() {
        let err = AppError::from(QueryError::Timeout(Duration::from_secs(10)));
        assert_eq!(err.into_response().status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn invalid_inputs_map_to_bad_request() {
        for err in [
            QueryError::InvalidGranularity("2min".into()),
            QueryError::InvalidSortField("speed".into()),
            QueryError::InvalidTimeExpr("yesterday".into()),
            QueryError::InvalidDimension("color".into()),
        ] {
            let resp = AppError::from(err).into_response();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn oversized_results_map_to_unprocessable() {
        let resp = AppError::from(QueryError::ResultSetTooLarge { cap: 10_000 }).into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn missing_resources_map_to_not_found() {
        let resp = AppError::NotFound("no such route".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
