use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Opaque identifier of a shared content entry.
///
/// Identifiers are assigned once at creation by an [`IdGenerator`] and are
/// never reused for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ContentId(String);

impl ContentId {
    /// Wrap an existing identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ContentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Source of unique content identifiers.
pub trait IdGenerator: Send + Sync {
    /// Produce a fresh identifier that has never been returned before.
    fn next_id(&self) -> ContentId;
}

/// Generates time-ordered `UUIDv7` identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self) -> ContentId {
        ContentId(uuid::Uuid::now_v7().to_string())
    }
}

/// Deterministic generator producing `{prefix}-1`, `{prefix}-2`, ...
///
/// Useful in tests where ids must be predictable.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    /// Create a generator whose ids start with `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new("entry")
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> ContentId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        ContentId(format!("{}-{n}", self.prefix))
    }
}
