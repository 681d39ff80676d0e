use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_with::skip_serializing_none;

use crate::core::influx::TimeExpr;
use crate::errors::QueryError;

pub const BANDWIDTH_MEASUREMENT: &str = "bandwidth_usage";

/// Aggregation step for bandwidth queries. `Raw` skips windowing entirely;
/// the rest window with a mean and drop empty windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Raw,
    OneMinute,
    FiveMinutes,
    OneHour,
    OneDay,
}

impl Granularity {
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        match raw {
            "raw" => Ok(Granularity::Raw),
            "1min" => Ok(Granularity::OneMinute),
            "5min" => Ok(Granularity::FiveMinutes),
            "1hour" => Ok(Granularity::OneHour),
            "1day" => Ok(Granularity::OneDay),
            other => Err(QueryError::InvalidGranularity(other.to_string())),
        }
    }

    /// Window size as a Flux duration, or `None` for raw samples.
    pub fn window(&self) -> Option<&'static str> {
        match self {
            Granularity::Raw => None,
            Granularity::OneMinute => Some("1m"),
            Granularity::FiveMinutes => Some("5m"),
            Granularity::OneHour => Some("1h"),
            Granularity::OneDay => Some("1d"),
        }
    }
}

/// Columns the dashboard may sort by. Keeping this a closed set is what lets
/// the sort column be interpolated into Flux without further quoting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Time,
    Upload,
    Download,
    Total,
    Project,
    Domain,
    Region,
    Tag,
}

impl SortField {
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        match raw {
            "time" => Ok(SortField::Time),
            "upload" => Ok(SortField::Upload),
            "download" => Ok(SortField::Download),
            "total" => Ok(SortField::Total),
            "project" => Ok(SortField::Project),
            "domain" => Ok(SortField::Domain),
            "region" => Ok(SortField::Region),
            "tag" => Ok(SortField::Tag),
            other => Err(QueryError::InvalidSortField(other.to_string())),
        }
    }

    pub fn flux_column(&self) -> &'static str {
        match self {
            SortField::Time => "_time",
            SortField::Upload => "upload",
            SortField::Download => "download",
            SortField::Total => "total",
            SortField::Project => "project",
            SortField::Domain => "domain",
            SortField::Region => "region",
            SortField::Tag => "tag",
        }
    }

    /// The `total` column only exists once the pipeline synthesizes it.
    pub fn needs_total_column(&self) -> bool {
        matches!(self, SortField::Total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascend,
    #[default]
    Descend,
}

impl SortOrder {
    /// Grid components send `"ascend"` or `"descend"`; anything else has
    /// always meant ascending here.
    pub fn from_param(raw: &str) -> Self {
        if raw == "descend" {
            SortOrder::Descend
        } else {
            SortOrder::Ascend
        }
    }

    pub fn desc(&self) -> bool {
        matches!(self, SortOrder::Descend)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for Sort {
    fn default() -> Self {
        Sort {
            field: SortField::Time,
            order: SortOrder::Descend,
        }
    }
}

/// How the engine produces the `total` row count for a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountStrategy {
    /// Materialize the full (capped) result and count it in memory.
    #[default]
    Exact,
    /// Page in the store and run a concurrent count query; a failed count
    /// degrades to an unknown total instead of failing the page.
    Separate,
}

impl FromStr for CountStrategy {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "exact" => Ok(CountStrategy::Exact),
            "separate" => Ok(CountStrategy::Separate),
            _ => Err(()),
        }
    }
}

pub const FILTER_ALL: &str = "all";

/// Per-dimension equality filters. `None`, the empty string, and the `all`
/// sentinel all mean "no filter on this dimension".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimensionFilters {
    pub project: Option<String>,
    pub domain: Option<String>,
    pub region: Option<String>,
    pub tag: Option<String>,
}

impl DimensionFilters {
    /// Tag/value pairs that actually constrain the query.
    pub fn active(&self) -> Vec<(&'static str, &str)> {
        [
            ("project", &self.project),
            ("domain", &self.domain),
            ("region", &self.region),
            ("tag", &self.tag),
        ]
        .into_iter()
        .filter_map(|(name, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty() && *v != FILTER_ALL)
                .map(|v| (name, v))
        })
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRange {
    pub start: TimeExpr,
    pub end: TimeExpr,
}

impl TimeRange {
    /// Rolling last-24h window, the fallback when a request carries no
    /// usable range.
    pub fn last_24h() -> Self {
        TimeRange {
            start: TimeExpr::Duration("-24h".to_string()),
            end: TimeExpr::Now,
        }
    }

    pub fn last_7d() -> Self {
        TimeRange {
            start: TimeExpr::Duration("-7d".to_string()),
            end: TimeExpr::Now,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BandwidthQueryRequest {
    pub range: TimeRange,
    pub filters: DimensionFilters,
    pub granularity: Granularity,
    pub sort: Sort,
    /// 1-based page index.
    pub page: u32,
    pub page_size: u32,
}

/// One pivoted bandwidth row: a timestamp, both rates in Mbps, and whatever
/// tags the series carried.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BandwidthRecord {
    pub time: DateTime<Utc>,
    pub upload: f64,
    pub download: f64,
    pub project: Option<String>,
    pub domain: Option<String>,
    pub region: Option<String>,
    pub tag: Option<String>,
}

/// One page of records plus the matching row count. `total` is `None` only
/// when the separate counting path could not produce a number.
#[derive(Debug, Clone)]
pub struct BandwidthPage {
    pub data: Vec<BandwidthRecord>,
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BandwidthStats {
    pub max_upload: f64,
    pub max_download: f64,
    pub avg_upload: f64,
    pub avg_download: f64,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn granularity_parses_the_supported_steps() {
        assert_eq!(Granularity::parse("raw").unwrap(), Granularity::Raw);
        assert_eq!(Granularity::parse("1min").unwrap().window(), Some("1m"));
        assert_eq!(Granularity::parse("5min").unwrap().window(), Some("5m"));
        assert_eq!(Granularity::parse("1hour").unwrap().window(), Some("1h"));
        assert_eq!(Granularity::parse("1day").unwrap().window(), Some("1d"));
        assert!(matches!(
            Granularity::parse("2min"),
            Err(QueryError::InvalidGranularity(_))
        ));
    }

    #[test]
    fn sort_field_rejects_unknown_columns() {
        assert_eq!(SortField::parse("time").unwrap().flux_column(), "_time");
        assert_eq!(SortField::parse("total").unwrap().flux_column(), "total");
        assert!(SortField::parse("total").unwrap().needs_total_column());
        assert!(!SortField::parse("upload").unwrap().needs_total_column());
        assert!(matches!(
            SortField::parse("_measurement"),
            Err(QueryError::InvalidSortField(_))
        ));
    }

    #[test]
    fn sort_order_defaults_to_descend() {
        assert_eq!(SortOrder::default(), SortOrder::Descend);
        assert_eq!(SortOrder::from_param("descend"), SortOrder::Descend);
        assert_eq!(SortOrder::from_param("ascend"), SortOrder::Ascend);
        assert_eq!(SortOrder::from_param("bogus"), SortOrder::Ascend);
    }

    #[test]
    fn filters_drop_sentinel_and_empty_values() {
        let filters = DimensionFilters {
            project: Some("proj-a".into()),
            domain: Some(FILTER_ALL.into()),
            region: Some(String::new()),
            tag: None,
        };
        assert_eq!(filters.active(), vec![("project", "proj-a")]);

        let unfiltered = DimensionFilters::default();
        assert!(unfiltered.active().is_empty());
    }

    #[test]
    fn count_strategy_parses_case_insensitively() {
        assert_eq!("exact".parse(), Ok(CountStrategy::Exact));
        assert_eq!("Separate".parse(), Ok(CountStrategy::Separate));
        assert_eq!("fallback".parse::<CountStrategy>(), Err(()));
    }
}
