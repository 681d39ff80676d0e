use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use crate::app_state::AppState;
use crate::errors::AppError;

/// Build the main application router
pub fn app_router() -> Router<AppState> {
    // Bandwidth, data, and system subrouters live under /api/v1
    let api_v1 = Router::new()
        .nest("/bandwidth", crate::api::routes::bandwidth_routes::bandwidth_routes())
        .merge(crate::api::routes::data_routes::data_routes())
        .nest("/system", crate::api::routes::system_routes::system_routes());

    Router::new()
        // Root route
        .route("/", get(root))
        // Health check
        .route("/health", get(health_check))
        // API v1
        .nest("/api/v1", api_v1)

        // Fallback handler for 404
        .fallback(handler_404)
        // ✅ Apply CORS layer to all routes
        .layer(CorsLayer::very_permissive())
}

// Handler for root
async fn root() -> &'static str {
    "Server is running!"
}

// Handler for health check
async fn health_check() -> &'static str {
    "OK"
}

// Handler for 404 Not Found, rendered in the same envelope as API errors
async fn handler_404() -> AppError {
    AppError::NotFound("no route matches the requested path".to_string())
}
