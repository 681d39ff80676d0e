use std::env;
use std::time::Duration;

use tracing::warn;

use crate::domain::bandwidth::model::CountStrategy;

/// Connection and query-shaping settings for the InfluxDB backend.
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
    /// Per-request budget for query and write calls.
    pub query_timeout: Duration,
    /// Hard cap on rows the exact counting path may materialize.
    pub max_result_rows: usize,
    pub count_strategy: CountStrategy,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub log_dir: String,
    pub influx: InfluxConfig,
}

impl Config {
    /// Reads configuration from the environment, falling back to local-dev
    /// defaults. Unparseable values are logged and replaced by the default
    /// rather than aborting startup.
    pub fn from_env() -> Self {
        let influx = InfluxConfig {
            url: env_or("INFLUX_URL", "http://localhost:8086"),
            token: env::var("INFLUX_TOKEN").unwrap_or_default(),
            org: env_or("INFLUX_ORG", "streaming-org"),
            bucket: env_or("INFLUX_BUCKET", "streaming-data"),
            query_timeout: Duration::from_secs(parsed_env("STREAMSCOPE_QUERY_TIMEOUT_SECS", 10)),
            max_result_rows: parsed_env("STREAMSCOPE_MAX_RESULT_ROWS", 10_000),
            count_strategy: count_strategy_from_env(),
        };

        if influx.token.is_empty() {
            warn!("INFLUX_TOKEN is not set; store requests will be unauthenticated");
        }

        Config {
            port: parsed_env("STREAMSCOPE_PORT", 3000),
            log_dir: env_or("STREAMSCOPE_LOG_DIR", "./logs"),
            influx,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed_env<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(%key, value = %raw, "ignoring unparseable environment value");
            default
        }),
        Err(_) => default,
    }
}

fn count_strategy_from_env() -> CountStrategy {
    match env::var("STREAMSCOPE_COUNT_STRATEGY") {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(value = %raw, "unknown STREAMSCOPE_COUNT_STRATEGY; using exact");
            CountStrategy::Exact
        }),
        Err(_) => CountStrategy::Exact,
    }
}
