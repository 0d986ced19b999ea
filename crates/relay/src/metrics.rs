use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Atomic counters tracking shares, expiry and broadcast delivery.
///
/// All counters use relaxed ordering. For a point-in-time view, call
/// [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct RelayMetrics {
    /// Files accepted into the store.
    pub files_shared: AtomicU64,
    /// Text snippets accepted into the store.
    pub texts_shared: AtomicU64,
    /// Total payload bytes of accepted files.
    pub bytes_shared: AtomicU64,
    /// Entries removed by the periodic sweep.
    pub expired_swept: AtomicU64,
    /// Entries removed because a lookup found them expired.
    pub lazily_evicted: AtomicU64,
    /// Observers that registered with the hub.
    pub observers_connected: AtomicU64,
    /// Observers that left, including ones pruned after a failed delivery.
    pub observers_disconnected: AtomicU64,
    /// Events handed to an observer sink.
    pub events_delivered: AtomicU64,
    /// Events an observer sink refused.
    pub delivery_failures: AtomicU64,
    /// Completed sweeper ticks.
    pub sweeps: AtomicU64,
}

impl RelayMetrics {
    pub fn increment_files_shared(&self, bytes: u64) {
        self.files_shared.fetch_add(1, Ordering::Relaxed);
        self.bytes_shared.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn increment_texts_shared(&self) {
        self.texts_shared.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_expired_swept(&self, n: u64) {
        self.expired_swept.fetch_add(n, Ordering::Relaxed);
    }

    pub fn increment_lazily_evicted(&self) {
        self.lazily_evicted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_observers_connected(&self) {
        self.observers_connected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_observers_disconnected(&self) {
        self.observers_disconnected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_events_delivered(&self) {
        self.events_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_delivery_failures(&self) {
        self.delivery_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_sweeps(&self) {
        self.sweeps.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            files_shared: self.files_shared.load(Ordering::Relaxed),
            texts_shared: self.texts_shared.load(Ordering::Relaxed),
            bytes_shared: self.bytes_shared.load(Ordering::Relaxed),
            expired_swept: self.expired_swept.load(Ordering::Relaxed),
            lazily_evicted: self.lazily_evicted.load(Ordering::Relaxed),
            observers_connected: self.observers_connected.load(Ordering::Relaxed),
            observers_disconnected: self.observers_disconnected.load(Ordering::Relaxed),
            events_delivered: self.events_delivered.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            sweeps: self.sweeps.load(Ordering::Relaxed),
        }
    }
}

/// A plain data snapshot of [`RelayMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub files_shared: u64,
    pub texts_shared: u64,
    pub bytes_shared: u64,
    pub expired_swept: u64,
    pub lazily_evicted: u64,
    pub observers_connected: u64,
    pub observers_disconnected: u64,
    pub events_delivered: u64,
    pub delivery_failures: u64,
    pub sweeps: u64,
}
