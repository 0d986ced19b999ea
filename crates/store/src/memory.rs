use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;

use ephemera_core::{Clock, ContentEntry, ContentError, ContentId, SystemClock};

use crate::store::ContentStore;

/// A stored entry together with its insertion sequence number.
#[derive(Debug)]
struct Slot {
    seq: u64,
    entry: Arc<ContentEntry>,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<ContentId, Slot>,
    /// Insertion order; iterate in reverse for newest first.
    order: BTreeMap<u64, ContentId>,
    next_seq: u64,
}

impl Inner {
    fn evict(&mut self, id: &ContentId) -> Option<Arc<ContentEntry>> {
        let slot = self.entries.remove(id)?;
        self.order.remove(&slot.seq);
        Some(slot.entry)
    }
}

/// In-memory [`ContentStore`] guarded by a single [`RwLock`].
///
/// Expired entries are evicted lazily on `get` and in bulk by
/// `sweep_expired`. Lookups of live entries and listings only take the read
/// lock.
pub struct MemoryContentStore {
    inner: RwLock<Inner>,
    clock: Arc<dyn Clock>,
}

impl MemoryContentStore {
    /// Create an empty store that reads time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            clock,
        }
    }
}

impl Default for MemoryContentStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl std::fmt::Debug for MemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryContentStore")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl ContentStore for MemoryContentStore {
    fn insert(&self, entry: ContentEntry) -> Result<ContentId, ContentError> {
        let id = entry.id().clone();
        let mut inner = self.inner.write();
        if inner.entries.contains_key(&id) {
            return Err(ContentError::DuplicateId(id));
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.order.insert(seq, id.clone());
        inner.entries.insert(
            id.clone(),
            Slot {
                seq,
                entry: Arc::new(entry),
            },
        );
        Ok(id)
    }

    fn get(&self, id: &ContentId) -> Result<Arc<ContentEntry>, ContentError> {
        let now = self.clock.now();

        {
            let inner = self.inner.read();
            match inner.entries.get(id) {
                None => return Err(ContentError::NotFound(id.clone())),
                Some(slot) if slot.entry.is_live_at(now) => return Ok(Arc::clone(&slot.entry)),
                Some(_) => {}
            }
        }

        // Expired: take the write lock and evict. Another writer may have
        // beaten us to it, in which case the entry is simply gone.
        let mut inner = self.inner.write();
        let live = inner
            .entries
            .get(id)
            .map(|slot| slot.entry.is_live_at(now).then(|| Arc::clone(&slot.entry)));
        match live {
            Some(Some(entry)) => Ok(entry),
            Some(None) => {
                inner.evict(id);
                debug!(id = %id, "lazily evicted expired entry");
                Err(ContentError::Expired(id.clone()))
            }
            None => Err(ContentError::NotFound(id.clone())),
        }
    }

    fn list_all(&self) -> Vec<Arc<ContentEntry>> {
        self.list_live_at(self.clock.now())
    }

    fn list_live_at(&self, now: DateTime<Utc>) -> Vec<Arc<ContentEntry>> {
        let inner = self.inner.read();
        inner
            .order
            .values()
            .rev()
            .filter_map(|id| inner.entries.get(id))
            .filter(|slot| slot.entry.is_live_at(now))
            .map(|slot| Arc::clone(&slot.entry))
            .collect()
    }

    fn remove(&self, id: &ContentId) -> bool {
        self.inner.write().evict(id).is_some()
    }

    fn sweep_expired(&self, now: DateTime<Utc>) -> Vec<ContentId> {
        let mut inner = self.inner.write();
        let expired: Vec<ContentId> = inner
            .order
            .values()
            .filter(|id| {
                inner
                    .entries
                    .get(*id)
                    .is_some_and(|slot| !slot.entry.is_live_at(now))
            })
            .cloned()
            .collect();

        for id in &expired {
            inner.evict(id);
        }
        expired
    }

    fn len(&self) -> usize {
        self.inner.read().entries.len()
    }
}
