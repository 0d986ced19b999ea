//! Observer registry and event fan-out.
//!
//! The hub keeps every connected observer in a single map guarded by one
//! mutex. Each publish walks the map and hands the event to every sink
//! without blocking; sinks that refuse an event are pruned once the walk is
//! complete and the survivors receive the new observer count.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, warn};

use ephemera_core::{ContentEntry, ContentId, HubEvent};
use ephemera_store::ContentStore;

use crate::metrics::RelayMetrics;
use crate::observer::{ObserverId, ObserverSink};

type Registry = HashMap<ObserverId, Box<dyn ObserverSink>>;

/// Outcome of handing one event to every registered observer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FanOutReport {
    /// Observers that accepted the event.
    pub delivered: usize,
    /// Observers that refused it and were dropped from the registry.
    pub failed: usize,
}

/// Tracks connected observers and publishes content events to them.
pub struct BroadcastHub {
    store: Arc<dyn ContentStore>,
    observers: Mutex<Registry>,
    next_id: AtomicU64,
    metrics: Arc<RelayMetrics>,
}

impl BroadcastHub {
    /// Create a hub whose initial snapshots are read from `store`.
    pub fn new(store: Arc<dyn ContentStore>, metrics: Arc<RelayMetrics>) -> Self {
        Self {
            store,
            observers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            metrics,
        }
    }

    /// Register an observer.
    ///
    /// The observer first receives `initial-snapshot` with every entry live
    /// at `now`, then every observer (including this one) receives the new
    /// `client-count`. Returns `None` if the snapshot cannot be delivered, in
    /// which case the observer is not registered.
    pub fn connect(&self, sink: Box<dyn ObserverSink>, now: DateTime<Utc>) -> Option<ObserverId> {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut observers = self.observers.lock();

        let entries = self
            .store
            .list_live_at(now)
            .iter()
            .map(|e| e.view())
            .collect();
        let snapshot = Arc::new(HubEvent::InitialSnapshot { entries });
        if let Err(e) = sink.deliver(&snapshot) {
            warn!(observer = %id, error = %e, "failed to deliver initial snapshot");
            self.metrics.increment_delivery_failures();
            return None;
        }
        self.metrics.increment_events_delivered();

        observers.insert(id, sink);
        self.metrics.increment_observers_connected();
        debug!(observer = %id, observers = observers.len(), "observer connected");

        let count = observers.len();
        self.fan_out(&mut observers, HubEvent::ClientCount { count });
        Some(id)
    }

    /// Deregister an observer and tell the rest about the new count.
    ///
    /// Returns `false` if the observer was not registered (already gone or
    /// pruned after a failed delivery).
    pub fn disconnect(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.lock();
        if observers.remove(&id).is_none() {
            return false;
        }
        self.metrics.increment_observers_disconnected();
        debug!(observer = %id, observers = observers.len(), "observer disconnected");

        let count = observers.len();
        self.fan_out(&mut observers, HubEvent::ClientCount { count });
        true
    }

    /// Announce a newly stored entry. The payload never leaves the entry;
    /// observers receive its view.
    pub fn publish_added(&self, entry: &ContentEntry) -> FanOutReport {
        let event = HubEvent::ContentAdded {
            entry: entry.view(),
        };
        let mut observers = self.observers.lock();
        self.fan_out(&mut observers, event)
    }

    /// Announce that an entry has left the store.
    pub fn publish_removed(&self, id: &ContentId) -> FanOutReport {
        let event = HubEvent::ContentRemoved { id: id.clone() };
        let mut observers = self.observers.lock();
        self.fan_out(&mut observers, event)
    }

    /// Number of currently registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }

    fn fan_out(&self, observers: &mut Registry, event: HubEvent) -> FanOutReport {
        let event = Arc::new(event);
        let (report, mut dead) = self.deliver_all(observers, &event);

        // Pruning changes the count, which may itself fail to deliver to
        // someone else; repeat until the registry is stable.
        while !dead.is_empty() {
            for id in dead.drain(..) {
                observers.remove(&id);
                self.metrics.increment_observers_disconnected();
            }
            let count = Arc::new(HubEvent::ClientCount {
                count: observers.len(),
            });
            dead = self.deliver_all(observers, &count).1;
        }

        report
    }

    fn deliver_all(
        &self,
        observers: &Registry,
        event: &Arc<HubEvent>,
    ) -> (FanOutReport, Vec<ObserverId>) {
        let mut report = FanOutReport::default();
        let mut dead = Vec::new();

        for (id, sink) in observers {
            match sink.deliver(event) {
                Ok(()) => {
                    report.delivered += 1;
                    self.metrics.increment_events_delivered();
                }
                Err(e) => {
                    warn!(
                        observer = %id,
                        event = event.name(),
                        error = %e,
                        "dropping observer after failed delivery"
                    );
                    report.failed += 1;
                    self.metrics.increment_delivery_failures();
                    dead.push(*id);
                }
            }
        }

        (report, dead)
    }
}

impl std::fmt::Debug for BroadcastHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastHub")
            .field("observers", &self.observer_count())
            .finish_non_exhaustive()
    }
}
