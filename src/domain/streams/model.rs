use serde::Serialize;

pub const STREAMING_MEASUREMENT: &str = "streaming_data";

/// One streaming session, pivoted from the `streaming_data` measurement.
///
/// `start_time` stays the string the writer recorded; sessions are keyed and
/// deduplicated by `id`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StreamSession {
    pub id: String,
    pub stream_name: String,
    #[serde(rename = "type")]
    pub session_type: String,
    pub domain: String,
    pub region: String,
    pub bandwidth: f64,
    pub duration: i64,
    pub viewers: i64,
    pub status: String,
    pub start_time: String,
}

pub const SESSION_TYPE_PUSH: &str = "push";
pub const SESSION_STATUS_ACTIVE: &str = "active";
