use std::time::Instant;

use anyhow::Result;
use chrono::Utc;
use serde_json::{json, Value};

use crate::config::InfluxConfig;

/// Process-level status: echoes the configured store coordinates but does no
/// I/O, so it answers even when InfluxDB is down.
pub async fn status(started_at: Instant, cfg: &InfluxConfig) -> Result<Value> {
    Ok(json!({
        "status": "healthy",
        "message": "Application is running",
        "timestamp": Utc::now().to_rfc3339(),
        "uptimeSecs": started_at.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
        "influxdb": {
            "org": cfg.org,
            "bucket": cfg.bucket,
        },
    }))
}
