//! Writes a week of shaped sample traffic so a fresh bucket has something
//! to chart: bandwidth samples per project, a few stream sessions, and one
//! storage snapshot per project.

use anyhow::Result;
use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use rand::Rng;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::core::influx::{InfluxClient, Point};
use crate::domain::bandwidth::model::BANDWIDTH_MEASUREMENT;
use crate::domain::storage::model::STORAGE_MEASUREMENT;
use crate::domain::streams::model::{
    STREAMING_MEASUREMENT, SESSION_STATUS_ACTIVE, SESSION_TYPE_PUSH,
};

const SEED_DAYS: i64 = 7;
const SEED_STEP_MINUTES: i64 = 5;
// Keeps write bodies well under the store's request size limits.
const WRITE_BATCH_SIZE: usize = 500;

struct SeedProject {
    name: &'static str,
    domain: &'static str,
    region: &'static str,
    tag: &'static str,
    size_gb: f64,
}

const SEED_PROJECTS: &[SeedProject] = &[
    SeedProject {
        name: "Interstellar_4K.mp4",
        domain: "cdn.example.com",
        region: "us-east",
        tag: "movie",
        size_gb: 15.6,
    },
    SeedProject {
        name: "WinterfellS8_Full.mkv",
        domain: "cdn.example.com",
        region: "us-east",
        tag: "series",
        size_gb: 23.2,
    },
    SeedProject {
        name: "PlanetEarth_1080p.mp4",
        domain: "cdn.example.com",
        region: "eu-west",
        tag: "documentary",
        size_gb: 8.9,
    },
    SeedProject {
        name: "Nocturnes_FLAC.zip",
        domain: "cdn.example.com",
        region: "us-east",
        tag: "music",
        size_gb: 1.2,
    },
    SeedProject {
        name: "DevTools_v2.1.tar.gz",
        domain: "cdn.example.com",
        region: "eu-west",
        tag: "software",
        size_gb: 0.5,
    },
];

/// Generates and writes the whole sample data set, returning per-measurement
/// point counts.
pub async fn seed_sample_data(influx: &InfluxClient) -> Result<Value> {
    let now = Utc::now();

    // ThreadRng is Rc-backed and not Send; it must go out of scope before
    // the writes below await.
    let bandwidth = {
        let mut rng = rand::thread_rng();
        generate_bandwidth_points(now, &mut rng)
    };
    let streams = generate_stream_points(now);
    let storage = generate_storage_points(now);

    info!(
        bandwidth = bandwidth.len(),
        streams = streams.len(),
        storage = storage.len(),
        "writing sample data"
    );

    for batch in bandwidth.chunks(WRITE_BATCH_SIZE) {
        influx.write(batch).await?;
    }
    influx.write(&streams).await?;
    influx.write(&storage).await?;

    Ok(json!({
        "seeded": true,
        "bandwidthPoints": bandwidth.len(),
        "streamPoints": streams.len(),
        "storagePoints": storage.len(),
    }))
}

/// One bandwidth sample per project every five minutes over the past week.
///
/// Evening hours (19:00-23:00) and weekends pull more download traffic for
/// video content; a multiplicative jitter in [0.8, 1.2) plus a slow sinusoid
/// keep neighbouring samples correlated instead of producing white noise.
pub fn generate_bandwidth_points(now: DateTime<Utc>, rng: &mut impl Rng) -> Vec<Point> {
    let start = now - Duration::days(SEED_DAYS);
    let mut points = Vec::new();

    for project in SEED_PROJECTS {
        let mut at = start;
        while at <= now {
            let peak = (19..=23).contains(&at.hour());
            let weekend = matches!(at.weekday(), Weekday::Sat | Weekday::Sun);
            let (base_upload, base_download) = bandwidth_profile(project.tag, peak, weekend);

            let jitter = 0.8 + rng.gen::<f64>() * 0.4;
            let drift = 1.0 + (at.timestamp_millis() as f64 / 1_000_000.0).sin() * 0.2;
            let upload = (base_upload * jitter * drift).max(0.0);
            let download = (base_download * jitter * drift).max(0.0);

            points.push(
                Point::new(BANDWIDTH_MEASUREMENT)
                    .tag("project", project.name)
                    .tag("domain", project.domain)
                    .tag("region", project.region)
                    .tag("tag", project.tag)
                    .float_field("upload", upload)
                    .float_field("download", download)
                    .timestamp(at),
            );

            at += Duration::minutes(SEED_STEP_MINUTES);
        }
    }

    points
}

fn bandwidth_profile(tag: &str, peak: bool, weekend: bool) -> (f64, f64) {
    match tag {
        "movie" | "series" => {
            let mut download = if peak { 3.0 } else { 1.5 };
            if weekend {
                download *= 1.3;
            }
            (0.2, download)
        }
        "documentary" => (0.15, if peak { 2.0 } else { 1.0 }),
        "music" => (0.05, 0.8),
        _ => (0.3, 1.2),
    }
}

/// Three example sessions: two live, one already ended. Ids are fresh UUIDs
/// so repeated seeds add sessions instead of overwriting the same series.
pub fn generate_stream_points(now: DateTime<Utc>) -> Vec<Point> {
    struct SeedSession {
        stream_name: &'static str,
        session_type: &'static str,
        domain: &'static str,
        region: &'static str,
        bandwidth: f64,
        duration: i64,
        viewers: i64,
        status: &'static str,
        started_hours_ago: i64,
    }

    let sessions = [
        SeedSession {
            stream_name: "live_001",
            session_type: SESSION_TYPE_PUSH,
            domain: "cdn.example.com",
            region: "us-east",
            bandwidth: 2.5,
            duration: 120,
            viewers: 1500,
            status: SESSION_STATUS_ACTIVE,
            started_hours_ago: 2,
        },
        SeedSession {
            stream_name: "live_002",
            session_type: "pull",
            domain: "cdn.example.com",
            region: "eu-west",
            bandwidth: 1.8,
            duration: 90,
            viewers: 800,
            status: SESSION_STATUS_ACTIVE,
            started_hours_ago: 1,
        },
        SeedSession {
            stream_name: "live_003",
            session_type: SESSION_TYPE_PUSH,
            domain: "cdn-test.example.com",
            region: "us-east",
            bandwidth: 3.2,
            duration: 180,
            viewers: 2200,
            status: "ended",
            started_hours_ago: 4,
        },
    ];

    sessions
        .iter()
        .map(|session| {
            let started_at = now - Duration::hours(session.started_hours_ago);
            Point::new(STREAMING_MEASUREMENT)
                .tag("id", &Uuid::new_v4().to_string())
                .tag("streamName", session.stream_name)
                .tag("type", session.session_type)
                .tag("domain", session.domain)
                .tag("region", session.region)
                .tag("status", session.status)
                .float_field("bandwidth", session.bandwidth)
                .int_field("duration", session.duration)
                .int_field("viewers", session.viewers)
                .string_field("startTime", &started_at.to_rfc3339())
                .timestamp(started_at)
        })
        .collect()
}

/// One storage snapshot per project, stamped at seed time.
pub fn generate_storage_points(now: DateTime<Utc>) -> Vec<Point> {
    SEED_PROJECTS
        .iter()
        .map(|project| {
            Point::new(STORAGE_MEASUREMENT)
                .tag("project", project.name)
                .tag("domain", project.domain)
                .float_field("size", project.size_gb)
                .timestamp(now)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InfluxConfig;
    use crate::domain::bandwidth::model::CountStrategy;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 8, 12, 0, 0).unwrap()
    }

    #[test]
    fn bandwidth_points_cover_a_week_per_project() {
        let mut rng = StdRng::seed_from_u64(7);
        let points = generate_bandwidth_points(fixed_now(), &mut rng);

        // 7 days on a 5 minute grid, both endpoints included.
        let per_project = (SEED_DAYS * 24 * 60 / SEED_STEP_MINUTES + 1) as usize;
        assert_eq!(points.len(), per_project * SEED_PROJECTS.len());

        let lines: Vec<String> = points.iter().filter_map(Point::to_line).collect();
        assert_eq!(lines.len(), points.len());
        assert!(lines[0].starts_with("bandwidth_usage,project="));
        assert!(lines[0].contains("tag=movie"));
        assert!(lines[0].contains("upload="));
    }

    #[test]
    fn bandwidth_samples_stay_non_negative() {
        let mut rng = StdRng::seed_from_u64(42);
        for line in generate_bandwidth_points(fixed_now(), &mut rng)
            .iter()
            .filter_map(Point::to_line)
        {
            assert!(!line.contains("=-"), "negative sample in {line}");
        }
    }

    #[test]
    fn stream_points_carry_session_fields() {
        let points = generate_stream_points(fixed_now());
        assert_eq!(points.len(), 3);

        let first = points[0].to_line().unwrap();
        assert!(first.starts_with("streaming_data,id="));
        assert!(first.contains(",streamName=live_001,type=push"));
        assert!(first.contains("duration=120i"));
        assert!(first.contains("viewers=1500i"));
        assert!(first.contains("startTime=\"2024-03-08T10:00:00+00:00\""));

        let ended = points[2].to_line().unwrap();
        assert!(ended.contains("status=ended"));
    }

    #[test]
    fn stream_points_get_distinct_ids() {
        let ids: Vec<String> = generate_stream_points(fixed_now())
            .iter()
            .filter_map(Point::to_line)
            .map(|line| line.split(',').nth(1).unwrap_or_default().to_string())
            .collect();
        assert_eq!(ids.len(), 3);
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
    }

    #[test]
    fn storage_points_snapshot_every_project() {
        let points = generate_storage_points(fixed_now());
        assert_eq!(points.len(), SEED_PROJECTS.len());
        let first = points[0].to_line().unwrap();
        assert!(first.starts_with("storage_usage,project=Interstellar_4K.mp4"));
        assert!(first.contains("size=15.6"));
    }

    #[tokio::test]
    async fn seeding_writes_every_measurement_from_a_spawned_task() {
        let per_project = (SEED_DAYS * 24 * 60 / SEED_STEP_MINUTES + 1) as usize;
        let bandwidth_points = per_project * SEED_PROJECTS.len();
        // One write call per bandwidth batch, plus streams and storage.
        let write_calls = (bandwidth_points + WRITE_BATCH_SIZE - 1) / WRITE_BATCH_SIZE + 2;

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/write"))
            .respond_with(ResponseTemplate::new(204))
            .expect(write_calls as u64)
            .mount(&server)
            .await;

        let client = InfluxClient::new(InfluxConfig {
            url: server.uri(),
            token: "seed-token".to_string(),
            org: "streaming-org".to_string(),
            bucket: "streaming-data".to_string(),
            query_timeout: std::time::Duration::from_secs(5),
            max_result_rows: 10_000,
            count_strategy: CountStrategy::Exact,
        });

        // Spawning pins down that the composed seed future stays Send.
        let report = tokio::spawn(async move { seed_sample_data(&client).await })
            .await
            .expect("seed task should not panic")
            .expect("seed should succeed");

        assert_eq!(report["seeded"], true);
        assert_eq!(report["bandwidthPoints"], bandwidth_points);
        assert_eq!(report["streamPoints"], 3);
        assert_eq!(report["storagePoints"], SEED_PROJECTS.len());
    }
}
