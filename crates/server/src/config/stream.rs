use std::time::Duration;

use serde::Deserialize;

/// Server-Sent Events configuration for `GET /api/events`.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    /// Events buffered per observer before it is considered too slow and
    /// disconnected.
    #[serde(default = "default_observer_buffer")]
    pub observer_buffer: usize,
    /// Seconds between keep-alive comments on idle streams.
    #[serde(default = "default_keep_alive")]
    pub keep_alive_seconds: u64,
    /// Maximum concurrent observers across all clients.
    #[serde(default = "default_max_observers")]
    pub max_observers: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            observer_buffer: default_observer_buffer(),
            keep_alive_seconds: default_keep_alive(),
            max_observers: default_max_observers(),
        }
    }
}

impl StreamConfig {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_seconds)
    }
}

fn default_observer_buffer() -> usize {
    64
}

fn default_keep_alive() -> u64 {
    15
}

fn default_max_observers() -> usize {
    256
}
