//! System routes (e.g., /api/v1/system/*)

use crate::api::controller::system::SystemController;
use crate::app_state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn system_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(SystemController::status))
        .route("/health", get(SystemController::health))
        .route("/seed", post(SystemController::seed))
}
