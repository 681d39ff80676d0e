//! System controller: connects routes to operational usecases

use axum::extract::State;
use axum::Json;
use serde_json::Value;

use crate::api::dto::ApiResponse;
use crate::api::util::json::to_json;
use crate::app_state::AppState;
use crate::errors::AppError;

pub struct SystemController;

impl SystemController {
    pub async fn status(
        State(state): State<AppState>,
    ) -> Result<Json<ApiResponse<Value>>, AppError> {
        to_json(state.system_service.status().await)
    }

    pub async fn health(
        State(state): State<AppState>,
    ) -> Result<Json<ApiResponse<Value>>, AppError> {
        to_json(state.system_service.health().await)
    }

    pub async fn seed(
        State(state): State<AppState>,
    ) -> Result<Json<ApiResponse<Value>>, AppError> {
        to_json(state.system_service.seed().await)
    }
}
