//! The bandwidth query engine: filtered, window-aggregated, sorted, and
//! paginated reads of the `bandwidth_usage` measurement.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::influx::{FluxQuery, FluxReader, FluxRow};
use crate::domain::bandwidth::model::{
    BandwidthPage, BandwidthQueryRequest, BandwidthRecord, BandwidthStats, CountStrategy,
    DimensionFilters, Granularity, TimeRange, BANDWIDTH_MEASUREMENT,
};
use crate::errors::QueryError;

pub struct BandwidthService<R: FluxReader> {
    store: Arc<R>,
    bucket: String,
    max_result_rows: usize,
    count_strategy: CountStrategy,
}

impl<R: FluxReader> BandwidthService<R> {
    pub fn new(
        store: Arc<R>,
        bucket: String,
        max_result_rows: usize,
        count_strategy: CountStrategy,
    ) -> Self {
        BandwidthService {
            store,
            bucket,
            max_result_rows,
            count_strategy,
        }
    }

    /// Runs the dashboard's paginated bandwidth query.
    ///
    /// Filtering, windowing, and ordering all happen in the store; only the
    /// counting strategy decides whether pagination is sliced here or pushed
    /// down as `limit(n:, offset:)`.
    pub async fn query_page(
        &self,
        req: BandwidthQueryRequest,
    ) -> Result<BandwidthPage, QueryError> {
        debug!(
            page = req.page,
            page_size = req.page_size,
            "running bandwidth page query"
        );
        match self.count_strategy {
            CountStrategy::Exact => self.query_page_exact(&req).await,
            CountStrategy::Separate => self.query_page_separate(&req).await,
        }
    }

    async fn query_page_exact(
        &self,
        req: &BandwidthQueryRequest,
    ) -> Result<BandwidthPage, QueryError> {
        // One row past the cap distinguishes "exactly at the cap" from over it
        let flux = self
            .record_pipeline(req)
            .limit(self.max_result_rows + 1)
            .build();

        let rows = self.store.read_rows(&flux).await?;
        if rows.len() > self.max_result_rows {
            return Err(QueryError::ResultSetTooLarge {
                cap: self.max_result_rows,
            });
        }

        let records = records_from_rows(&rows);
        let total = records.len() as u64;
        let data = page_slice(records, req.page, req.page_size);
        Ok(BandwidthPage {
            data,
            total: Some(total),
        })
    }

    async fn query_page_separate(
        &self,
        req: &BandwidthQueryRequest,
    ) -> Result<BandwidthPage, QueryError> {
        let offset = req.page.saturating_sub(1) as usize * req.page_size as usize;
        let data_flux = self
            .record_pipeline(req)
            .limit_offset(req.page_size as usize, offset)
            .build();
        let count_flux = self.count_pipeline(req).build();

        let (data_result, count_result) = futures::join!(
            self.store.read_rows(&data_flux),
            self.store.read_rows(&count_flux),
        );

        // The page itself is load-bearing; the count is best-effort
        let data = records_from_rows(&data_result?);
        let total = match count_result {
            Ok(rows) => Some(extract_count(&rows)),
            Err(err) => {
                warn!("bandwidth count query failed, reporting unknown total: {err}");
                None
            }
        };
        Ok(BandwidthPage { data, total })
    }

    /// Unpaginated time-ascending series for charts.
    pub async fn query_series(
        &self,
        range: &TimeRange,
        filters: &DimensionFilters,
        granularity: Granularity,
    ) -> Result<Vec<BandwidthRecord>, QueryError> {
        let mut flux = self.base_pipeline(range, filters);
        if let Some(window) = granularity.window() {
            flux = flux.aggregate_window_mean(window);
        }
        let flux = flux
            .pivot_fields()
            .ungroup()
            .sort_by("_time", false)
            .limit(self.max_result_rows + 1)
            .build();

        let rows = self.store.read_rows(&flux).await?;
        if rows.len() > self.max_result_rows {
            return Err(QueryError::ResultSetTooLarge {
                cap: self.max_result_rows,
            });
        }
        Ok(records_from_rows(&rows))
    }

    /// Max/average/count summary over raw samples in the range.
    pub async fn stats(
        &self,
        range: &TimeRange,
        filters: &DimensionFilters,
    ) -> Result<BandwidthStats, QueryError> {
        let flux = self
            .base_pipeline(range, filters)
            .pivot_fields()
            .ungroup()
            .zero_missing(&["upload", "download"])
            .reduce_bandwidth_stats()
            .build();

        let rows = self.store.read_rows(&flux).await?;
        let Some(row) = rows.first() else {
            return Ok(BandwidthStats::default());
        };

        let count = row.get_i64("count").unwrap_or(0).max(0) as u64;
        let divisor = if count == 0 { 1.0 } else { count as f64 };
        Ok(BandwidthStats {
            max_upload: row.get_f64("maxUpload").unwrap_or(0.0),
            max_download: row.get_f64("maxDownload").unwrap_or(0.0),
            avg_upload: row.get_f64("sumUpload").unwrap_or(0.0) / divisor,
            avg_download: row.get_f64("sumDownload").unwrap_or(0.0) / divisor,
            count,
        })
    }

    fn base_pipeline(&self, range: &TimeRange, filters: &DimensionFilters) -> FluxQuery {
        let mut flux = FluxQuery::from_bucket(&self.bucket)
            .range(&range.start, &range.end)
            .measurement(BANDWIDTH_MEASUREMENT);
        for (tag, value) in filters.active() {
            flux = flux.tag_eq(tag, value);
        }
        flux
    }

    /// Shared head of the data pipelines: filter, window, pivot, normalize,
    /// sort. Missing fields are zeroed in the store so sorting by a sparse
    /// field orders those rows as zero rather than null.
    fn record_pipeline(&self, req: &BandwidthQueryRequest) -> FluxQuery {
        let mut flux = self.base_pipeline(&req.range, &req.filters);
        if let Some(window) = req.granularity.window() {
            flux = flux.aggregate_window_mean(window);
        }
        flux = flux
            .pivot_fields()
            .ungroup()
            .zero_missing(&["upload", "download"]);
        if req.sort.field.needs_total_column() {
            flux = flux.map_total();
        }
        flux.sort_by(req.sort.field.flux_column(), req.sort.order.desc())
    }

    /// Row count over the same filtered, windowed, pivoted shape the data
    /// pipeline produces; sorting would not change the number.
    fn count_pipeline(&self, req: &BandwidthQueryRequest) -> FluxQuery {
        let mut flux = self.base_pipeline(&req.range, &req.filters);
        if let Some(window) = req.granularity.window() {
            flux = flux.aggregate_window_mean(window);
        }
        flux.pivot_fields().ungroup().count_rows()
    }
}

fn records_from_rows(rows: &[FluxRow]) -> Vec<BandwidthRecord> {
    rows.iter().filter_map(record_from_row).collect()
}

fn record_from_row(row: &FluxRow) -> Option<BandwidthRecord> {
    Some(BandwidthRecord {
        time: row.get_time("_time")?,
        upload: row.get_f64("upload").unwrap_or(0.0),
        download: row.get_f64("download").unwrap_or(0.0),
        project: row.tag("project"),
        domain: row.tag("domain"),
        region: row.tag("region"),
        tag: row.tag("tag"),
    })
}

fn page_slice(records: Vec<BandwidthRecord>, page: u32, page_size: u32) -> Vec<BandwidthRecord> {
    let offset = page.saturating_sub(1) as usize * page_size as usize;
    records
        .into_iter()
        .skip(offset)
        .take(page_size as usize)
        .collect()
}

fn extract_count(rows: &[FluxRow]) -> u64 {
    // count(column: "_time") leaves the count in the _time cell; an empty
    // result means the pipeline matched nothing
    rows.first()
        .and_then(|row| row.get_i64("_time"))
        .unwrap_or(0)
        .max(0) as u64
}
