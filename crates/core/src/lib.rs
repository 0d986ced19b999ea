pub mod clock;
pub mod entry;
pub mod error;
pub mod event;
pub mod factory;
pub mod id;
pub mod limits;
pub mod links;
pub mod markdown;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{ContentBody, ContentEntry, ContentKind, EntryView, FileContent, TextContent};
pub use error::ContentError;
pub use event::HubEvent;
pub use factory::EntryFactory;
pub use id::{ContentId, IdGenerator, SequentialIdGenerator, UuidIdGenerator};
pub use limits::{
    ContentLimits, DEFAULT_ALLOWED_MIME_TYPES, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_TEXT_LENGTH,
    DEFAULT_TTL_SECONDS,
};
pub use links::{LinkMetadata, extract_link_metadata};
pub use markdown::{CommonMarkRenderer, MarkdownRenderer};
