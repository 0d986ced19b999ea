use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, info};

use ephemera_core::{
    Clock, CommonMarkRenderer, ContentBody, ContentEntry, ContentError, ContentId, ContentLimits,
    EntryFactory, EntryView, IdGenerator, MarkdownRenderer, SystemClock, UuidIdGenerator,
};
use ephemera_store::{ContentStore, MemoryContentStore};

use crate::hub::BroadcastHub;
use crate::metrics::RelayMetrics;
use crate::observer::{ObserverId, ObserverSink};

/// Result of one expiry sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Ids removed from the store, oldest first.
    pub removed: Vec<ContentId>,
    /// Observers dropped while announcing the removals.
    pub failed_deliveries: usize,
}

/// The share pipeline: validates new content, stores it and tells every
/// observer about it.
///
/// Every store mutation and the broadcast that announces it happen under one
/// sequencing lock, which is also held while a new observer takes its
/// snapshot. An observer therefore sees each entry exactly once (in its
/// snapshot or as `content-added`) and only hears `content-removed` for
/// entries it has seen.
pub struct ContentRelay {
    store: Arc<dyn ContentStore>,
    hub: BroadcastHub,
    factory: EntryFactory,
    clock: Arc<dyn Clock>,
    metrics: Arc<RelayMetrics>,
    sequencer: Mutex<()>,
}

impl ContentRelay {
    /// Start building a relay with default components.
    pub fn builder() -> RelayBuilder {
        RelayBuilder::new()
    }

    pub fn factory(&self) -> &EntryFactory {
        &self.factory
    }

    pub fn limits(&self) -> &ContentLimits {
        self.factory.limits()
    }

    pub fn metrics(&self) -> &RelayMetrics {
        &self.metrics
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Store a prepared entry and announce it.
    pub fn share(&self, entry: ContentEntry) -> Result<EntryView, ContentError> {
        let view = entry.view();
        let file_size = match entry.body() {
            ContentBody::File(file) => Some(file.size_bytes),
            ContentBody::Text(_) => None,
        };

        let _seq = self.sequencer.lock();
        let id = self.store.insert(entry.clone())?;
        let report = self.hub.publish_added(&entry);

        match file_size {
            Some(size) => self.metrics.increment_files_shared(size),
            None => self.metrics.increment_texts_shared(),
        }
        info!(
            id = %id,
            kind = ?entry.kind(),
            observers = report.delivered,
            "content shared"
        );
        Ok(view)
    }

    /// Validate and share an uploaded file.
    pub fn share_file(
        &self,
        filename: &str,
        mime_type: &str,
        payload: Bytes,
    ) -> Result<EntryView, ContentError> {
        let entry = self.factory.make_file_entry(filename, mime_type, payload)?;
        self.share(entry)
    }

    /// Validate and share a text snippet.
    pub fn share_text(&self, raw_content: &str, markdown: bool) -> Result<EntryView, ContentError> {
        let entry = self.factory.make_text_entry(raw_content, markdown)?;
        self.share(entry)
    }

    /// Look up a live entry, including its payload.
    ///
    /// An entry found past its expiry is evicted, announced as removed and
    /// reported as [`ContentError::Expired`].
    pub fn fetch(&self, id: &ContentId) -> Result<Arc<ContentEntry>, ContentError> {
        let _seq = self.sequencer.lock();
        match self.store.get(id) {
            Err(ContentError::Expired(id)) => {
                self.metrics.increment_lazily_evicted();
                self.hub.publish_removed(&id);
                debug!(id = %id, "announced lazily evicted entry");
                Err(ContentError::Expired(id))
            }
            other => other,
        }
    }

    /// Views of all live entries, newest first.
    pub fn list(&self) -> Vec<EntryView> {
        self.store.list_all().iter().map(|e| e.view()).collect()
    }

    /// Register an observer. It receives the snapshot first, then every
    /// event published after it. Returns `None` if the snapshot could not be
    /// delivered.
    ///
    /// Entries already expired are swept before the snapshot is taken, and
    /// both use the same instant, so every entry still in the store is one
    /// the new observer has seen.
    pub fn connect(&self, sink: Box<dyn ObserverSink>) -> Option<ObserverId> {
        let _seq = self.sequencer.lock();
        let now = self.clock.now();
        self.sweep_locked(now);
        self.hub.connect(sink, now)
    }

    pub fn disconnect(&self, id: ObserverId) -> bool {
        let _seq = self.sequencer.lock();
        self.hub.disconnect(id)
    }

    pub fn observer_count(&self) -> usize {
        self.hub.observer_count()
    }

    /// Number of entries physically held, including expired ones not yet
    /// swept.
    pub fn store_len(&self) -> usize {
        self.store.len()
    }

    /// Remove every entry expired at `now` and announce each removal.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> SweepReport {
        let _seq = self.sequencer.lock();
        self.sweep_locked(now)
    }

    fn sweep_locked(&self, now: DateTime<Utc>) -> SweepReport {
        let removed = self.store.sweep_expired(now);
        let mut failed_deliveries = 0;
        for id in &removed {
            failed_deliveries += self.hub.publish_removed(id).failed;
        }
        self.metrics.add_expired_swept(removed.len() as u64);
        SweepReport {
            removed,
            failed_deliveries,
        }
    }
}

impl std::fmt::Debug for ContentRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentRelay")
            .field("entries", &self.store.len())
            .field("hub", &self.hub)
            .finish_non_exhaustive()
    }
}

/// Fluent builder for a [`ContentRelay`].
///
/// Every component has a default: a [`MemoryContentStore`] reading the
/// relay's clock, UUIDv7 ids, the system clock, CommonMark rendering and
/// [`ContentLimits::default`].
pub struct RelayBuilder {
    store: Option<Arc<dyn ContentStore>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    renderer: Option<Arc<dyn MarkdownRenderer>>,
    limits: ContentLimits,
    metrics: Option<Arc<RelayMetrics>>,
}

impl RelayBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            clock: None,
            ids: None,
            renderer: None,
            limits: ContentLimits::default(),
            metrics: None,
        }
    }

    /// Use a specific store. It should read time from the same clock as the
    /// relay.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn ContentStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    #[must_use]
    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    #[must_use]
    pub fn renderer(mut self, renderer: Arc<dyn MarkdownRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    #[must_use]
    pub fn limits(mut self, limits: ContentLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Share a metrics instance with the caller.
    #[must_use]
    pub fn metrics(mut self, metrics: Arc<RelayMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self) -> ContentRelay {
        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };
        let store: Arc<dyn ContentStore> = match self.store {
            Some(store) => store,
            None => Arc::new(MemoryContentStore::new(Arc::clone(&clock))),
        };
        let ids: Arc<dyn IdGenerator> = match self.ids {
            Some(ids) => ids,
            None => Arc::new(UuidIdGenerator),
        };
        let renderer: Arc<dyn MarkdownRenderer> = match self.renderer {
            Some(renderer) => renderer,
            None => Arc::new(CommonMarkRenderer),
        };
        let metrics = self.metrics.unwrap_or_default();

        let factory = EntryFactory::new(ids, Arc::clone(&clock), renderer, self.limits);
        let hub = BroadcastHub::new(Arc::clone(&store), Arc::clone(&metrics));

        ContentRelay {
            store,
            hub,
            factory,
            clock,
            metrics,
            sequencer: Mutex::new(()),
        }
    }
}

impl Default for RelayBuilder {
    fn default() -> Self {
        Self::new()
    }
}
