use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::id::ContentId;
use crate::links::LinkMetadata;

/// Discriminates the two kinds of shared content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ContentKind {
    File,
    Text,
}

/// An uploaded file. The payload is owned by the entry and only leaves it
/// through [`ContentEntry::payload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub payload: Bytes,
}

/// A shared text snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextContent {
    pub raw_content: String,
    /// Equal to `raw_content` unless the text was rendered as markdown.
    pub rendered_content: String,
    pub is_markdown: bool,
    pub link_metadata: Option<LinkMetadata>,
}

/// Kind-specific body of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBody {
    File(FileContent),
    Text(TextContent),
}

/// One shared item.
///
/// Entries never change after construction. Expiry is observed by comparing
/// [`expires_at`](Self::expires_at) with the current time; it is not a flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEntry {
    id: ContentId,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    body: ContentBody,
}

impl ContentEntry {
    /// Build an entry created at `created_at` that lives for `ttl`.
    pub fn new(id: ContentId, created_at: DateTime<Utc>, ttl: Duration, body: ContentBody) -> Self {
        Self {
            id,
            created_at,
            expires_at: created_at + ttl,
            body,
        }
    }

    pub fn id(&self) -> &ContentId {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn body(&self) -> &ContentBody {
        &self.body
    }

    pub fn kind(&self) -> ContentKind {
        match self.body {
            ContentBody::File(_) => ContentKind::File,
            ContentBody::Text(_) => ContentKind::Text,
        }
    }

    /// An entry is live strictly before its expiry instant.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Raw file bytes, or `None` for text entries.
    pub fn payload(&self) -> Option<&Bytes> {
        match &self.body {
            ContentBody::File(file) => Some(&file.payload),
            ContentBody::Text(_) => None,
        }
    }

    /// Project the entry into its broadcastable view (no payload bytes).
    pub fn view(&self) -> EntryView {
        match &self.body {
            ContentBody::File(file) => EntryView::File {
                id: self.id.clone(),
                filename: file.filename.clone(),
                mime_type: file.mime_type.clone(),
                size_bytes: file.size_bytes,
                uploaded_at: self.created_at,
                expires_at: self.expires_at,
            },
            ContentBody::Text(text) => EntryView::Text {
                id: self.id.clone(),
                raw_content: text.raw_content.clone(),
                rendered_content: text.rendered_content.clone(),
                is_markdown: text.is_markdown,
                link_metadata: text.link_metadata.clone(),
                shared_at: self.created_at,
                expires_at: self.expires_at,
            },
        }
    }
}

/// The subset of an entry that is safe to list and broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EntryView {
    /// File metadata. The payload is fetched separately by id.
    File {
        id: ContentId,
        filename: String,
        mime_type: String,
        size_bytes: u64,
        uploaded_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    },
    /// A text snippet with its rendered form and detected links.
    Text {
        id: ContentId,
        raw_content: String,
        rendered_content: String,
        is_markdown: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        link_metadata: Option<LinkMetadata>,
        shared_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    },
}

impl EntryView {
    pub fn id(&self) -> &ContentId {
        match self {
            Self::File { id, .. } | Self::Text { id, .. } => id,
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        match self {
            Self::File { expires_at, .. } | Self::Text { expires_at, .. } => *expires_at,
        }
    }
}
