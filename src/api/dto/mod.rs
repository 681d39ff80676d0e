//! API DTOs

use serde::Serialize;

use crate::core::influx::TimeExpr;
use crate::domain::bandwidth::model::TimeRange;
use crate::errors::QueryError;

pub mod bandwidth_dto;
pub mod data_dto;

/// `startTime`/`endTime` with the listing defaults: each bound falls back
/// independently (`-7d` / `now()`), explicit values must parse.
pub(crate) fn range_with_defaults(
    start: Option<&str>,
    end: Option<&str>,
) -> Result<TimeRange, QueryError> {
    let start = match start.filter(|raw| !raw.is_empty()) {
        Some(raw) => TimeExpr::parse(raw)?,
        None => TimeExpr::Duration("-7d".to_string()),
    };
    let end = match end.filter(|raw| !raw.is_empty()) {
        Some(raw) => TimeExpr::parse(raw)?,
        None => TimeExpr::Now,
    };
    Ok(TimeRange { start, end })
}

/// Success envelope shared by every JSON endpoint. Failures never pass
/// through here; [`crate::errors::AppError`] renders the matching
/// `success: false` shape.
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    /// Only the paged bandwidth endpoint carries a total. `Some(None)`
    /// serializes as an explicit `null`, the "count unknown" marker of the
    /// separate counting strategy; `None` drops the key entirely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Option<u64>>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data,
            total: None,
        }
    }

    pub fn ok_with_total(data: T, total: Option<u64>) -> Self {
        ApiResponse {
            success: true,
            data,
            total: Some(total),
        }
    }
}
