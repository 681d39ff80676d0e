use chrono::{DateTime, Utc};
use serde::Serialize;

pub const STORAGE_MEASUREMENT: &str = "storage_usage";

/// Latest reported storage footprint for one project/domain pair. The id is
/// the `project-domain` key the dashboard rows key off.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageUsage {
    pub id: String,
    pub project: String,
    pub domain: String,
    /// Gigabytes.
    pub size: f64,
    pub update_time: DateTime<Utc>,
}
