use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use ephemera_core::ContentLimits;
use ephemera_relay::MetricsSnapshot;

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status indicator.
    #[schema(example = "ok")]
    pub status: String,
    /// Connected event stream observers.
    #[schema(example = 3)]
    pub observers: usize,
    /// Entries currently held, including expired ones awaiting the sweeper.
    #[schema(example = 12)]
    pub entries: usize,
}

/// Relay counters.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MetricsResponse {
    /// Files accepted.
    #[schema(example = 10)]
    pub files_shared: u64,
    /// Text snippets accepted.
    #[schema(example = 25)]
    pub texts_shared: u64,
    /// Total bytes of accepted files.
    #[schema(example = 1_048_576)]
    pub bytes_shared: u64,
    /// Entries removed by the expiry sweeper.
    pub expired_swept: u64,
    /// Entries removed because a lookup found them expired.
    pub lazily_evicted: u64,
    /// Observers that connected.
    pub observers_connected: u64,
    /// Observers that disconnected or were dropped.
    pub observers_disconnected: u64,
    /// Events delivered to observers.
    pub events_delivered: u64,
    /// Events an observer could not accept.
    pub delivery_failures: u64,
    /// Sweeper runs.
    pub sweeps: u64,
}

impl From<MetricsSnapshot> for MetricsResponse {
    fn from(snap: MetricsSnapshot) -> Self {
        Self {
            files_shared: snap.files_shared,
            texts_shared: snap.texts_shared,
            bytes_shared: snap.bytes_shared,
            expired_swept: snap.expired_swept,
            lazily_evicted: snap.lazily_evicted,
            observers_connected: snap.observers_connected,
            observers_disconnected: snap.observers_disconnected,
            events_delivered: snap.events_delivered,
            delivery_failures: snap.delivery_failures,
            sweeps: snap.sweeps,
        }
    }
}

/// Limits a client needs to validate input before sending it.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LimitsResponse {
    /// Seconds an entry stays available.
    #[schema(example = 600)]
    pub ttl_seconds: i64,
    /// Largest accepted upload, in bytes.
    #[schema(example = 104_857_600)]
    pub max_file_size: u64,
    /// Longest accepted text, in characters.
    #[schema(example = 1000)]
    pub max_text_length: usize,
    /// Accepted upload MIME types; `*` suffixes match by prefix.
    pub allowed_mime_types: Vec<String>,
}

impl From<&ContentLimits> for LimitsResponse {
    fn from(limits: &ContentLimits) -> Self {
        Self {
            ttl_seconds: limits.ttl.num_seconds(),
            max_file_size: limits.max_file_size,
            max_text_length: limits.max_text_length,
            allowed_mime_types: limits.allowed_mime_types.clone(),
        }
    }
}

/// Body of `POST /api/text`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ShareTextRequest {
    /// The text to share.
    #[schema(example = "Check https://example.com now")]
    pub content: String,
    /// Render the text as markdown.
    #[serde(default)]
    pub markdown: bool,
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message.
    #[schema(example = "content not found: 0192f0c4-7a1e-7c3b-9d1e-3f4a5b6c7d8e")]
    pub error: String,
}
