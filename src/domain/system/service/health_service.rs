use anyhow::Result;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;

use crate::core::influx::InfluxClient;

/// Dependency report: pings InfluxDB and echoes the connection settings
/// (minus the token itself) so a misconfigured deployment is easy to spot.
pub async fn health(influx: &InfluxClient) -> Result<Value> {
    let influx_status = match influx.ping().await {
        Ok(()) => "healthy",
        Err(err) => {
            warn!("influxdb ping failed: {err}");
            "error"
        }
    };
    let cfg = influx.config();

    Ok(json!({
        "healthy": influx_status == "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "influxdb": {
            "url": cfg.url,
            "org": cfg.org,
            "bucket": cfg.bucket,
            "tokenExists": !cfg.token.is_empty(),
        },
        "status": {
            "influxdb": influx_status,
        },
    }))
}
