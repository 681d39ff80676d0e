//! Distinct tag values for the filter dropdowns.

use std::sync::Arc;

use crate::core::influx::{FluxQuery, FluxReader, FluxRow};
use crate::domain::bandwidth::model::{TimeRange, BANDWIDTH_MEASUREMENT};
use crate::domain::dimensions::model::{Dimension, DimensionOption};
use crate::errors::QueryError;

/// Writers record `unknown` for tags they could not resolve; it is not a
/// value worth offering as a filter.
const UNKNOWN_TAG_VALUE: &str = "unknown";

pub struct DimensionService<R: FluxReader> {
    store: Arc<R>,
    bucket: String,
}

impl<R: FluxReader> DimensionService<R> {
    pub fn new(store: Arc<R>, bucket: String) -> Self {
        DimensionService { store, bucket }
    }

    /// Sorted distinct values seen in the range, headed by the `all`
    /// sentinel entry.
    pub async fn options(
        &self,
        dimension: Dimension,
        range: &TimeRange,
    ) -> Result<Vec<DimensionOption>, QueryError> {
        let column = dimension.column();
        let flux = FluxQuery::from_bucket(&self.bucket)
            .range(&range.start, &range.end)
            .measurement(BANDWIDTH_MEASUREMENT)
            .group_by(column)
            .distinct(column)
            .sort_by(column, false)
            .build();

        let rows = self.store.read_rows(&flux).await?;

        let mut options = vec![DimensionOption::sentinel(dimension)];
        options.extend(rows.iter().filter_map(|row| option_from_row(row, column)));
        Ok(options)
    }
}

fn option_from_row(row: &FluxRow, column: &str) -> Option<DimensionOption> {
    // distinct() reports the value both under the group key and `_value`
    let value = row.tag(column).or_else(|| row.tag("_value"))?;
    if value == UNKNOWN_TAG_VALUE {
        return None;
    }
    Some(DimensionOption {
        label: value.clone(),
        value,
    })
}
