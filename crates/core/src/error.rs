use thiserror::Error;

use crate::id::ContentId;

/// Errors raised by content construction and lookup.
///
/// None of these are fatal to the process; all are per-request conditions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    /// Input has the wrong shape (empty text, empty filename, too long).
    #[error("validation error: {0}")]
    Validation(String),

    /// A file exceeds the configured maximum size.
    #[error("file is {size} bytes, maximum is {max} bytes")]
    PayloadTooLarge { size: u64, max: u64 },

    /// A file's MIME type is not in the allow-list.
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// No entry with this id exists.
    #[error("content not found: {0}")]
    NotFound(ContentId),

    /// The entry existed but its time-to-live has elapsed.
    #[error("content expired: {0}")]
    Expired(ContentId),

    /// An entry with this id is already stored.
    #[error("duplicate content id: {0}")]
    DuplicateId(ContentId),
}

impl ContentError {
    /// `true` for both [`NotFound`](Self::NotFound) and
    /// [`Expired`](Self::Expired): the caller cannot retrieve the entry.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Expired(_))
    }

    /// `true` for input rejections that happen before the store is touched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::PayloadTooLarge { .. } | Self::UnsupportedMediaType(_)
        )
    }
}
