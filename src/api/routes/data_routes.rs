//! Data routes (e.g., /api/v1/streams, /api/v1/storage)

use crate::api::controller::data::DataController;
use crate::app_state::AppState;
use axum::{routing::get, Router};

pub fn data_routes() -> Router<AppState> {
    Router::new()
        .route("/streams", get(DataController::get_streams))
        .route("/streams/live", get(DataController::get_live_streams))
        .route("/storage", get(DataController::get_storage))
        .route(
            "/dimensions/{dimension}",
            get(DataController::get_dimension_options),
        )
}
