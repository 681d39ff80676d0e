use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::config::Config;
use crate::core::influx::InfluxClient;
use crate::domain::bandwidth::service::BandwidthService;
use crate::domain::dimensions::service::DimensionService;
use crate::domain::storage::service::StorageService;
use crate::domain::streams::service::StreamService;

#[derive(Clone)]
pub struct AppState {
    pub bandwidth_service: Arc<BandwidthService<InfluxClient>>,
    pub stream_service: Arc<StreamService<InfluxClient>>,
    pub storage_service: Arc<StorageService<InfluxClient>>,
    pub dimension_service: Arc<DimensionService<InfluxClient>>,
    pub system_service: Arc<SystemService>,
}

/// One shared store handle feeds every service.
pub fn build_app_state(cfg: &Config) -> AppState {
    let influx = Arc::new(InfluxClient::new(cfg.influx.clone()));
    let bucket = cfg.influx.bucket.clone();

    AppState {
        bandwidth_service: Arc::new(BandwidthService::new(
            influx.clone(),
            bucket.clone(),
            cfg.influx.max_result_rows,
            cfg.influx.count_strategy,
        )),
        stream_service: Arc::new(StreamService::new(influx.clone(), bucket.clone())),
        storage_service: Arc::new(StorageService::new(influx.clone(), bucket.clone())),
        dimension_service: Arc::new(DimensionService::new(influx.clone(), bucket)),
        system_service: Arc::new(SystemService::new(influx)),
    }
}

/// Operational usecases: holds the store handle and the process start time.
#[derive(Clone)]
pub struct SystemService {
    influx: Arc<InfluxClient>,
    started_at: Instant,
}

impl SystemService {
    pub fn new(influx: Arc<InfluxClient>) -> Self {
        SystemService {
            influx,
            started_at: Instant::now(),
        }
    }

    pub async fn status(&self) -> anyhow::Result<Value> {
        let cfg = self.influx.config();
        crate::domain::system::service::status_service::status(self.started_at, cfg).await
    }

    pub async fn health(&self) -> anyhow::Result<Value> {
        crate::domain::system::service::health_service::health(&self.influx).await
    }

    pub async fn seed(&self) -> anyhow::Result<Value> {
        crate::domain::system::service::seed_service::seed_sample_data(&self.influx).await
    }
}
