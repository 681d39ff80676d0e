use chrono::{DateTime, SecondsFormat, Utc};

use crate::errors::QueryError;

/// Escapes a value for interpolation inside a double-quoted Flux string
/// literal. Backslashes first, then quotes, so escapes are not double-applied.
pub fn escape_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// One bound of a `range(start:, stop:)` call.
///
/// Untrusted input enters only through [`TimeExpr::parse`]; everything else
/// renders from validated parts, so no caller-controlled text reaches the
/// pipeline unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeExpr {
    /// An absolute instant, rendered as `time(v: "...")`.
    Instant(DateTime<Utc>),
    /// The store's `now()`.
    Now,
    /// A relative duration literal such as `-7d` or `-1d12h`.
    Duration(String),
}

impl TimeExpr {
    /// Accepts RFC 3339 timestamps, `now()`, and signed duration literals.
    /// Anything else is rejected rather than passed through to the store.
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        let raw = raw.trim();
        if raw == "now()" {
            return Ok(TimeExpr::Now);
        }
        if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
            return Ok(TimeExpr::Instant(instant.with_timezone(&Utc)));
        }
        if is_duration_literal(raw) {
            return Ok(TimeExpr::Duration(raw.to_string()));
        }
        Err(QueryError::InvalidTimeExpr(raw.to_string()))
    }

    pub fn render(&self) -> String {
        match self {
            TimeExpr::Instant(instant) => format!(
                "time(v: \"{}\")",
                instant.to_rfc3339_opts(SecondsFormat::Millis, true)
            ),
            TimeExpr::Now => "now()".to_string(),
            TimeExpr::Duration(duration) => duration.clone(),
        }
    }
}

/// `[-]<digits><unit>` with one or more components, unit in s|m|h|d|w|mo|y.
/// Covers what the dashboard sends; sub-second units are not accepted.
fn is_duration_literal(raw: &str) -> bool {
    let body = raw.strip_prefix('-').unwrap_or(raw);
    if body.is_empty() {
        return false;
    }

    let mut chars = body.chars().peekable();
    while chars.peek().is_some() {
        let mut digits = 0usize;
        while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
            chars.next();
            digits += 1;
        }
        if digits == 0 {
            return false;
        }
        match chars.next() {
            Some('s') | Some('h') | Some('d') | Some('w') | Some('y') => {}
            Some('m') => {
                // "m" is minutes; "mo" is months
                if chars.peek() == Some(&'o') {
                    chars.next();
                }
            }
            _ => return false,
        }
    }
    true
}

/// Builder for the Flux pipelines this service sends to InfluxDB.
///
/// Each call appends one pipe-forward stage. This is the only place Flux
/// source text is assembled; services never concatenate query fragments
/// themselves.
#[derive(Debug, Clone)]
pub struct FluxQuery {
    source: String,
}

impl FluxQuery {
    pub fn from_bucket(bucket: &str) -> Self {
        FluxQuery {
            source: format!("from(bucket: \"{}\")", escape_string(bucket)),
        }
    }

    pub fn range(self, start: &TimeExpr, stop: &TimeExpr) -> Self {
        self.stage(format!(
            "range(start: {}, stop: {})",
            start.render(),
            stop.render()
        ))
    }

    pub fn measurement(self, name: &str) -> Self {
        self.stage(format!(
            "filter(fn: (r) => r._measurement == \"{}\")",
            escape_string(name)
        ))
    }

    /// Equality filter on one tag. The tag name comes from a fixed dimension
    /// list upstream; only the value is caller-controlled.
    pub fn tag_eq(self, tag: &str, value: &str) -> Self {
        self.stage(format!(
            "filter(fn: (r) => r.{} == \"{}\")",
            tag,
            escape_string(value)
        ))
    }

    /// Mean per window, empty windows dropped. Rows keep Flux's default
    /// window-end timestamps (`timeSrc: "_stop"`).
    pub fn aggregate_window_mean(self, every: &str) -> Self {
        self.stage(format!(
            "aggregateWindow(every: {every}, fn: mean, createEmpty: false)"
        ))
    }

    /// Turns per-field rows into one row per timestamp with a column per field.
    pub fn pivot_fields(self) -> Self {
        self.stage(
            "pivot(rowKey: [\"_time\"], columnKey: [\"_field\"], valueColumn: \"_value\")"
                .to_string(),
        )
    }

    /// Collapses all result tables into one so later sort and limit stages are
    /// global rather than per series.
    pub fn ungroup(self) -> Self {
        self.stage("group()".to_string())
    }

    pub fn group_by(self, column: &str) -> Self {
        self.stage(format!("group(columns: [\"{}\"])", escape_string(column)))
    }

    pub fn distinct(self, column: &str) -> Self {
        self.stage(format!("distinct(column: \"{}\")", escape_string(column)))
    }

    /// Replaces nulls with 0.0 for fields that may be absent from a pivoted
    /// row. Field names are compile-time constants, never caller input.
    pub fn zero_missing(self, fields: &[&str]) -> Self {
        let patches = fields
            .iter()
            .map(|f| format!("{f}: if exists r.{f} then r.{f} else 0.0"))
            .collect::<Vec<_>>()
            .join(", ");
        self.stage(format!("map(fn: (r) => ({{ r with {patches} }}))"))
    }

    /// Adds the synthetic `total` column as upload + download.
    pub fn map_total(self) -> Self {
        self.stage("map(fn: (r) => ({ r with total: r.upload + r.download }))".to_string())
    }

    pub fn sort_by(self, column: &str, desc: bool) -> Self {
        self.stage(format!(
            "sort(columns: [\"{}\"], desc: {desc})",
            escape_string(column)
        ))
    }

    pub fn limit(self, n: usize) -> Self {
        self.stage(format!("limit(n: {n})"))
    }

    pub fn limit_offset(self, n: usize, offset: usize) -> Self {
        self.stage(format!("limit(n: {n}, offset: {offset})"))
    }

    /// Counts rows into a single cell keyed by the `_time` column.
    pub fn count_rows(self) -> Self {
        self.stage("count(column: \"_time\")".to_string())
    }

    /// Folds pivoted bandwidth rows into max/sum/count accumulators. The
    /// caller divides sums by the count to obtain averages.
    pub fn reduce_bandwidth_stats(self) -> Self {
        self.stage(
            concat!(
                "reduce(fn: (r, accumulator) => ({ ",
                "maxUpload: if r.upload > accumulator.maxUpload then r.upload else accumulator.maxUpload, ",
                "maxDownload: if r.download > accumulator.maxDownload then r.download else accumulator.maxDownload, ",
                "sumUpload: accumulator.sumUpload + r.upload, ",
                "sumDownload: accumulator.sumDownload + r.download, ",
                "count: accumulator.count + 1 }), ",
                "identity: {maxUpload: 0.0, maxDownload: 0.0, sumUpload: 0.0, sumDownload: 0.0, count: 0})"
            )
            .to_string(),
        )
    }

    pub fn build(self) -> String {
        self.source
    }

    fn stage(mut self, stage: String) -> Self {
        self.source.push_str("\n  |> ");
        self.source.push_str(&stage);
        self
    }
}
