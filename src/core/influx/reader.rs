use async_trait::async_trait;

use crate::core::influx::csv::FluxRow;
use crate::errors::QueryError;

/// Read access to the time-series store.
///
/// Services take this seam instead of the concrete client so query logic can
/// run against canned rows in tests.
#[async_trait]
pub trait FluxReader: Send + Sync {
    async fn read_rows(&self, flux: &str) -> Result<Vec<FluxRow>, QueryError>;
}
