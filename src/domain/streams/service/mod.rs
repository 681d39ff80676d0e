//! Streaming-session reads: recent sessions and the live subset.

use std::collections::HashSet;
use std::sync::Arc;

use crate::core::influx::{FluxQuery, FluxReader, FluxRow};
use crate::domain::bandwidth::model::TimeRange;
use crate::domain::streams::model::{
    StreamSession, SESSION_STATUS_ACTIVE, SESSION_TYPE_PUSH, STREAMING_MEASUREMENT,
};
use crate::errors::QueryError;

pub struct StreamService<R: FluxReader> {
    store: Arc<R>,
    bucket: String,
}

impl<R: FluxReader> StreamService<R> {
    pub fn new(store: Arc<R>, bucket: String) -> Self {
        StreamService { store, bucket }
    }

    /// Most recent sessions in the range, one row per stream id.
    pub async fn query_sessions(
        &self,
        range: &TimeRange,
        limit: u32,
    ) -> Result<Vec<StreamSession>, QueryError> {
        self.query(range, limit, false).await
    }

    /// Sessions currently marked active.
    pub async fn query_live(
        &self,
        range: &TimeRange,
        limit: u32,
    ) -> Result<Vec<StreamSession>, QueryError> {
        self.query(range, limit, true).await
    }

    async fn query(
        &self,
        range: &TimeRange,
        limit: u32,
        only_active: bool,
    ) -> Result<Vec<StreamSession>, QueryError> {
        let mut flux = FluxQuery::from_bucket(&self.bucket)
            .range(&range.start, &range.end)
            .measurement(STREAMING_MEASUREMENT);
        if only_active {
            flux = flux.tag_eq("status", SESSION_STATUS_ACTIVE);
        }
        // The limit bounds scanned rows; dedup below may return fewer sessions
        let flux = flux
            .pivot_fields()
            .ungroup()
            .sort_by("_time", true)
            .limit(limit as usize)
            .build();

        let rows = self.store.read_rows(&flux).await?;
        Ok(sessions_from_rows(&rows))
    }
}

/// Newest-first rows collapse to one session per id; rows with no id carry
/// nothing to key on and are skipped.
fn sessions_from_rows(rows: &[FluxRow]) -> Vec<StreamSession> {
    let mut seen = HashSet::new();
    let mut sessions = Vec::new();
    for row in rows {
        let Some(id) = row.tag("id") else { continue };
        if !seen.insert(id.clone()) {
            continue;
        }
        sessions.push(StreamSession {
            id,
            stream_name: row.tag("streamName").unwrap_or_default(),
            session_type: row
                .tag("type")
                .unwrap_or_else(|| SESSION_TYPE_PUSH.to_string()),
            domain: row.tag("domain").unwrap_or_default(),
            region: row.tag("region").unwrap_or_default(),
            bandwidth: row.get_f64("bandwidth").unwrap_or(0.0),
            duration: row.get_i64("duration").unwrap_or(0),
            viewers: row.get_i64("viewers").unwrap_or(0),
            status: row
                .tag("status")
                .unwrap_or_else(|| SESSION_STATUS_ACTIVE.to_string()),
            start_time: row.tag("startTime").unwrap_or_default(),
        });
    }
    sessions
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MockStore {
        rows: Result<Vec<FluxRow>, QueryError>,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl FluxReader for MockStore {
        async fn read_rows(&self, flux: &str) -> Result<Vec<FluxRow>, QueryError> {
            self.queries.lock().unwrap().push(flux.to_string());
            match &self.rows {
                Ok(rows) => Ok(rows.clone()),
                Err(_) => Err(QueryError::Store("stream query failed".into())),
            }
        }
    }

    fn session_row(id: &str, minute: u32, status: &str) -> FluxRow {
        let time = format!("2024-03-01T10:{minute:02}:00Z");
        FluxRow::from_pairs(&[
            ("_time", time.as_str()),
            ("id", id),
            ("streamName", "live-show"),
            ("type", "push"),
            ("domain", "cdn.example.com"),
            ("region", "eu-west"),
            ("bandwidth", "12.5"),
            ("duration", "360"),
            ("viewers", "250"),
            ("status", status),
            ("startTime", "2024-03-01T10:00:00Z"),
        ])
    }

    fn service(rows: Result<Vec<FluxRow>, QueryError>) -> StreamService<MockStore> {
        StreamService::new(
            Arc::new(MockStore {
                rows,
                queries: Mutex::new(Vec::new()),
            }),
            "streaming-data".to_string(),
        )
    }

    #[tokio::test]
    async fn sessions_deduplicate_by_id_keeping_the_newest() {
        let rows = vec![
            session_row("s-1", 30, "active"),
            session_row("s-2", 25, "ended"),
            session_row("s-1", 10, "ended"),
        ];
        let svc = service(Ok(rows));
        let sessions = svc
            .query_sessions(&TimeRange::last_7d(), 500)
            .await
            .unwrap();

        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, "s-1");
        // The first (newest) occurrence wins
        assert_eq!(sessions[0].status, "active");
        assert_eq!(sessions[1].id, "s-2");
    }

    #[tokio::test]
    async fn rows_without_an_id_are_skipped() {
        let anonymous = FluxRow::from_pairs(&[("_time", "2024-03-01T10:00:00Z")]);
        let svc = service(Ok(vec![anonymous, session_row("s-9", 5, "active")]));
        let sessions = svc
            .query_sessions(&TimeRange::last_7d(), 500)
            .await
            .unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, "s-9");
    }

    #[tokio::test]
    async fn live_query_filters_on_active_status() {
        let svc = service(Ok(vec![]));
        svc.query_live(&TimeRange::last_7d(), 100).await.unwrap();

        let flux = svc.store.queries.lock().unwrap()[0].clone();
        assert!(flux.contains("r.status == \"active\""));
        assert!(flux.contains("limit(n: 100)"));
        assert!(flux.contains("sort(columns: [\"_time\"], desc: true)"));
    }

    #[tokio::test]
    async fn missing_fields_fall_back_to_defaults() {
        let sparse = FluxRow::from_pairs(&[("_time", "2024-03-01T10:00:00Z"), ("id", "s-1")]);
        let svc = service(Ok(vec![sparse]));
        let sessions = svc
            .query_sessions(&TimeRange::last_7d(), 10)
            .await
            .unwrap();

        let session = &sessions[0];
        assert_eq!(session.session_type, "push");
        assert_eq!(session.status, "active");
        assert_eq!(session.bandwidth, 0.0);
        assert_eq!(session.viewers, 0);
        assert_eq!(session.stream_name, "");
    }

    #[tokio::test]
    async fn store_failures_surface_as_errors() {
        let svc = service(Err(QueryError::Store("boom".into())));
        let err = svc
            .query_sessions(&TimeRange::last_7d(), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Store(_)));
    }
}
