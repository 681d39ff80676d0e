//! Storage-usage reads: the newest sample per project/domain pair over the
//! trailing thirty days.

use std::collections::HashSet;
use std::sync::Arc;

use crate::core::influx::{FluxQuery, FluxReader, FluxRow, TimeExpr};
use crate::domain::storage::model::{StorageUsage, STORAGE_MEASUREMENT};
use crate::errors::QueryError;

/// Storage reporters write on a daily cadence; a month of history always
/// covers the latest sample for every live pair.
const STORAGE_LOOKBACK: &str = "-30d";

pub struct StorageService<R: FluxReader> {
    store: Arc<R>,
    bucket: String,
}

impl<R: FluxReader> StorageService<R> {
    pub fn new(store: Arc<R>, bucket: String) -> Self {
        StorageService { store, bucket }
    }

    pub async fn query_usage(&self, limit: u32) -> Result<Vec<StorageUsage>, QueryError> {
        let flux = FluxQuery::from_bucket(&self.bucket)
            .range(
                &TimeExpr::Duration(STORAGE_LOOKBACK.to_string()),
                &TimeExpr::Now,
            )
            .measurement(STORAGE_MEASUREMENT)
            .pivot_fields()
            .ungroup()
            .sort_by("_time", true)
            .limit(limit as usize)
            .build();

        let rows = self.store.read_rows(&flux).await?;
        Ok(usage_from_rows(&rows))
    }
}

/// Newest-first rows collapse to the latest sample per project/domain pair.
fn usage_from_rows(rows: &[FluxRow]) -> Vec<StorageUsage> {
    let mut seen = HashSet::new();
    let mut usage = Vec::new();
    for row in rows {
        let Some(update_time) = row.get_time("_time") else {
            continue;
        };
        let project = row.tag("project").unwrap_or_default();
        let domain = row.tag("domain").unwrap_or_default();
        let id = format!("{project}-{domain}");
        if !seen.insert(id.clone()) {
            continue;
        }
        usage.push(StorageUsage {
            id,
            project,
            domain,
            size: row.get_f64("size").unwrap_or(0.0),
            update_time,
        });
    }
    usage
}
