//! Data controller: stream sessions, storage usage, dimension options

use axum::extract::{Path, Query, State};
use axum::Json;
use tracing::warn;
use validator::Validate;

use crate::api::dto::data_dto::{
    DimensionQueryParams, StorageQueryParams, StreamQueryParams, DEFAULT_LIVE_LIMIT,
    DEFAULT_STORAGE_LIMIT, DEFAULT_STREAM_LIMIT,
};
use crate::api::dto::ApiResponse;
use crate::app_state::AppState;
use crate::domain::dimensions::model::{Dimension, DimensionOption};
use crate::domain::storage::model::StorageUsage;
use crate::domain::streams::model::StreamSession;
use crate::errors::AppError;

pub struct DataController;

impl DataController {
    pub async fn get_streams(
        State(state): State<AppState>,
        Query(params): Query<StreamQueryParams>,
    ) -> Result<Json<ApiResponse<Vec<StreamSession>>>, AppError> {
        params.validate()?;
        let range = params.range()?;
        let limit = params.limit.unwrap_or(DEFAULT_STREAM_LIMIT);
        let sessions = state.stream_service.query_sessions(&range, limit).await?;
        Ok(Json(ApiResponse::ok(sessions)))
    }

    pub async fn get_live_streams(
        State(state): State<AppState>,
        Query(params): Query<StreamQueryParams>,
    ) -> Result<Json<ApiResponse<Vec<StreamSession>>>, AppError> {
        params.validate()?;
        let range = params.range()?;
        let limit = params.limit.unwrap_or(DEFAULT_LIVE_LIMIT);
        let sessions = state.stream_service.query_live(&range, limit).await?;
        Ok(Json(ApiResponse::ok(sessions)))
    }

    pub async fn get_storage(
        State(state): State<AppState>,
        Query(params): Query<StorageQueryParams>,
    ) -> Result<Json<ApiResponse<Vec<StorageUsage>>>, AppError> {
        params.validate()?;
        let limit = params.limit.unwrap_or(DEFAULT_STORAGE_LIMIT);
        let usage = state.storage_service.query_usage(limit).await?;
        Ok(Json(ApiResponse::ok(usage)))
    }

    /// Filter dropdown options. A store failure degrades to the sentinel-only
    /// list so the dashboard's filters stay usable; bad input is still a 400.
    pub async fn get_dimension_options(
        State(state): State<AppState>,
        Path(dimension): Path<String>,
        Query(params): Query<DimensionQueryParams>,
    ) -> Result<Json<ApiResponse<Vec<DimensionOption>>>, AppError> {
        let dimension = Dimension::parse(&dimension)?;
        let range = params.range()?;

        let options = match state.dimension_service.options(dimension, &range).await {
            Ok(options) => options,
            Err(err) => {
                warn!("dimension option query failed, serving sentinel only: {err}");
                vec![DimensionOption::sentinel(dimension)]
            }
        };
        Ok(Json(ApiResponse::ok(options)))
    }
}
