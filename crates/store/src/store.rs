use std::sync::Arc;

use chrono::{DateTime, Utc};

use ephemera_core::{ContentEntry, ContentError, ContentId};

/// Trait for holding live shared entries.
///
/// Implementations must be `Send + Sync` and safe for concurrent access from
/// request handlers and the expiry sweeper. Mutating operations (insert,
/// remove, sweep, and the eviction performed by `get`) are mutually
/// exclusive; `list_all` may run alongside other reads.
pub trait ContentStore: Send + Sync {
    /// Store `entry` under its id. Fails with `DuplicateId` if the id is
    /// already present.
    fn insert(&self, entry: ContentEntry) -> Result<ContentId, ContentError>;

    /// Look up a live entry.
    ///
    /// If the entry is present but expired it is evicted by this call and
    /// `Expired` is returned; subsequent lookups return `NotFound`.
    fn get(&self, id: &ContentId) -> Result<Arc<ContentEntry>, ContentError>;

    /// Every live entry, newest first. Expired entries that have not been
    /// swept yet are filtered out.
    fn list_all(&self) -> Vec<Arc<ContentEntry>>;

    /// Every entry live at `now`, newest first. Lets a caller that has just
    /// swept at `now` take a listing that agrees with the sweep.
    fn list_live_at(&self, now: DateTime<Utc>) -> Vec<Arc<ContentEntry>>;

    /// Delete an entry regardless of expiry. Returns `true` if it existed.
    fn remove(&self, id: &ContentId) -> bool;

    /// Remove every entry with `expires_at <= now` and return their ids,
    /// oldest first.
    fn sweep_expired(&self, now: DateTime<Utc>) -> Vec<ContentId>;

    /// Number of physically stored entries, including expired ones that have
    /// not been evicted yet.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
