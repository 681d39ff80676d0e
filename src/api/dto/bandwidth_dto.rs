//! Bandwidth API DTOs

use serde::Deserialize;
use serde_with::formats::CommaSeparator;
use serde_with::{serde_as, StringWithSeparator};
use validator::Validate;

use crate::core::influx::TimeExpr;
use crate::domain::bandwidth::model::{
    BandwidthQueryRequest, DimensionFilters, Granularity, Sort, SortField, SortOrder, TimeRange,
};
use crate::errors::QueryError;

/// Query string of `GET /api/v1/bandwidth`, the paged grid endpoint.
#[serde_as]
#[derive(Deserialize, Debug, Default, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct BandwidthQueryParams {
    /// 1-based page index; `current` is what antd-style tables send.
    #[serde(alias = "current")]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 500))]
    pub page_size: Option<u32>,
    pub project: Option<String>,
    pub domain: Option<String>,
    pub region: Option<String>,
    pub tag: Option<String>,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
    pub granularity: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// Two comma-joined instants, the date-picker's combined form.
    #[serde_as(as = "Option<StringWithSeparator<CommaSeparator, String>>")]
    pub date_range: Option<Vec<String>>,
}

impl BandwidthQueryParams {
    /// Maps the loosely typed query string onto the typed engine request.
    ///
    /// Unknown granularity and sort values are rejected. The time range comes
    /// from `startTime`+`endTime`, else from `dateRange`; when neither pair
    /// parses the rolling last 24 hours is used, which is what the dashboard
    /// opens with.
    pub fn into_request(self) -> Result<BandwidthQueryRequest, QueryError> {
        let granularity = match self.granularity.as_deref() {
            Some(raw) => Granularity::parse(raw)?,
            None => Granularity::FiveMinutes,
        };
        let field = match self.sort_field.as_deref() {
            Some(raw) => SortField::parse(raw)?,
            None => SortField::Time,
        };
        let order = self
            .sort_order
            .as_deref()
            .map(SortOrder::from_param)
            .unwrap_or_default();

        let range = parse_pair(self.start_time.as_deref(), self.end_time.as_deref())
            .or_else(|| match self.date_range.as_deref() {
                Some([start, end]) => parse_pair(Some(start.as_str()), Some(end.as_str())),
                _ => None,
            })
            .unwrap_or_else(TimeRange::last_24h);

        Ok(BandwidthQueryRequest {
            range,
            filters: DimensionFilters {
                project: self.project,
                domain: self.domain,
                region: self.region,
                tag: self.tag,
            },
            granularity,
            sort: Sort { field, order },
            page: self.page.unwrap_or(1).max(1),
            page_size: self.page_size.unwrap_or(20),
        })
    }
}

/// An explicit range only takes effect when both ends parse.
fn parse_pair(start: Option<&str>, end: Option<&str>) -> Option<TimeRange> {
    let start = TimeExpr::parse(start?).ok()?;
    let end = TimeExpr::parse(end?).ok()?;
    Some(TimeRange { start, end })
}

/// Query string of `GET /api/v1/bandwidth/series` and `/stats`: filters and
/// range without pagination or sorting. Stats ignores `granularity`.
#[derive(Deserialize, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct SeriesQueryParams {
    pub project: Option<String>,
    pub domain: Option<String>,
    pub region: Option<String>,
    pub tag: Option<String>,
    pub granularity: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl SeriesQueryParams {
    pub fn granularity(&self) -> Result<Granularity, QueryError> {
        match self.granularity.as_deref() {
            Some(raw) => Granularity::parse(raw),
            None => Ok(Granularity::FiveMinutes),
        }
    }

    pub fn range(&self) -> Result<TimeRange, QueryError> {
        super::range_with_defaults(self.start_time.as_deref(), self.end_time.as_deref())
    }

    pub fn filters(&self) -> DimensionFilters {
        DimensionFilters {
            project: self.project.clone(),
            domain: self.domain.clone(),
            region: self.region.clone(),
            tag: self.tag.clone(),
        }
    }
}
