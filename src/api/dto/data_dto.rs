//! Stream, storage, and dimension-option API DTOs

use serde::Deserialize;
use validator::Validate;

use crate::domain::bandwidth::model::TimeRange;
use crate::errors::QueryError;

pub const DEFAULT_STREAM_LIMIT: u32 = 500;
pub const DEFAULT_LIVE_LIMIT: u32 = 100;
pub const DEFAULT_STORAGE_LIMIT: u32 = 500;

/// Query string of the stream listing endpoints.
#[derive(Deserialize, Debug, Default, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct StreamQueryParams {
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u32>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl StreamQueryParams {
    pub fn range(&self) -> Result<TimeRange, QueryError> {
        super::range_with_defaults(self.start_time.as_deref(), self.end_time.as_deref())
    }
}

/// Query string of the storage endpoint; the lookback window is fixed
/// server-side, only the row limit is tunable.
#[derive(Deserialize, Debug, Default, Validate)]
#[serde(default)]
pub struct StorageQueryParams {
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u32>,
}

/// Query string of `GET /api/v1/dimensions/{dimension}`.
#[derive(Deserialize, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct DimensionQueryParams {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl DimensionQueryParams {
    pub fn range(&self) -> Result<TimeRange, QueryError> {
        super::range_with_defaults(self.start_time.as_deref(), self.end_time.as_deref())
    }
}
