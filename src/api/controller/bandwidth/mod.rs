//! Bandwidth controller: connects routes to the bandwidth query engine

use axum::extract::{Query, State};
use axum::Json;
use validator::Validate;

use crate::api::dto::bandwidth_dto::{BandwidthQueryParams, SeriesQueryParams};
use crate::api::dto::ApiResponse;
use crate::app_state::AppState;
use crate::domain::bandwidth::model::{BandwidthRecord, BandwidthStats};
use crate::errors::AppError;

pub struct BandwidthController;

impl BandwidthController {
    /// The paged grid query. `data` is the page, `total` the matching row
    /// count (or `null` when the separate counting strategy lost its count).
    pub async fn get_bandwidth(
        State(state): State<AppState>,
        Query(params): Query<BandwidthQueryParams>,
    ) -> Result<Json<ApiResponse<Vec<BandwidthRecord>>>, AppError> {
        params.validate()?;
        let request = params.into_request()?;
        let page = state.bandwidth_service.query_page(request).await?;
        Ok(Json(ApiResponse::ok_with_total(page.data, page.total)))
    }

    /// Unpaged time-ascending series for charts.
    pub async fn get_bandwidth_series(
        State(state): State<AppState>,
        Query(params): Query<SeriesQueryParams>,
    ) -> Result<Json<ApiResponse<Vec<BandwidthRecord>>>, AppError> {
        let range = params.range()?;
        let filters = params.filters();
        let records = state
            .bandwidth_service
            .query_series(&range, &filters, params.granularity()?)
            .await?;
        Ok(Json(ApiResponse::ok(records)))
    }

    pub async fn get_bandwidth_stats(
        State(state): State<AppState>,
        Query(params): Query<SeriesQueryParams>,
    ) -> Result<Json<ApiResponse<BandwidthStats>>, AppError> {
        let range = params.range()?;
        let filters = params.filters();
        let stats = state.bandwidth_service.stats(&range, &filters).await?;
        Ok(Json(ApiResponse::ok(stats)))
    }
}
