use std::time::Duration;

use serde::Deserialize;

use ephemera_core::{
    ContentLimits, DEFAULT_ALLOWED_MIME_TYPES, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_TEXT_LENGTH,
    DEFAULT_TTL_SECONDS,
};

/// Longest accepted TTL: 30 days.
pub const MAX_TTL_SECONDS: u64 = 30 * 24 * 60 * 60;

/// Content lifetime and acceptance policy.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentConfig {
    /// Seconds an entry stays available after it is shared.
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Seconds between expiry sweeps.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    /// Largest accepted upload, in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,
    /// Longest accepted text snippet, in characters.
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,
    /// Accepted upload MIME types. Entries ending in `*` match by prefix.
    #[serde(default = "default_allowed_mime_types")]
    pub allowed_mime_types: Vec<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            sweep_interval_seconds: default_sweep_interval(),
            max_file_size_bytes: default_max_file_size(),
            max_text_length: default_max_text_length(),
            allowed_mime_types: default_allowed_mime_types(),
        }
    }
}

impl ContentConfig {
    /// The limits handed to the entry factory.
    ///
    /// The TTL is clamped to [`MAX_TTL_SECONDS`]; `EphemeraConfig::validate`
    /// rejects larger values before this is called.
    pub fn limits(&self) -> ContentLimits {
        let ttl = self.ttl_seconds.min(MAX_TTL_SECONDS);
        ContentLimits {
            ttl: chrono::Duration::seconds(i64::try_from(ttl).unwrap_or(DEFAULT_TTL_SECONDS)),
            max_file_size: self.max_file_size_bytes,
            max_text_length: self.max_text_length,
            allowed_mime_types: self.allowed_mime_types.clone(),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }
}

fn default_ttl() -> u64 {
    DEFAULT_TTL_SECONDS.unsigned_abs()
}

fn default_sweep_interval() -> u64 {
    30
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_max_text_length() -> usize {
    DEFAULT_MAX_TEXT_LENGTH
}

fn default_allowed_mime_types() -> Vec<String> {
    DEFAULT_ALLOWED_MIME_TYPES
        .iter()
        .map(|s| (*s).to_owned())
        .collect()
}
