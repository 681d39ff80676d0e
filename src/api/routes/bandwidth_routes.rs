//! Bandwidth routes (e.g., /api/v1/bandwidth/*)

use crate::api::controller::bandwidth::BandwidthController;
use crate::app_state::AppState;
use axum::{routing::get, Router};

pub fn bandwidth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(BandwidthController::get_bandwidth))
        .route("/series", get(BandwidthController::get_bandwidth_series))
        .route("/stats", get(BandwidthController::get_bandwidth_stats))
}
