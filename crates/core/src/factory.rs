use std::sync::Arc;

use bytes::Bytes;

use crate::clock::Clock;
use crate::entry::{ContentBody, ContentEntry, FileContent, TextContent};
use crate::error::ContentError;
use crate::id::IdGenerator;
use crate::limits::ContentLimits;
use crate::links::extract_link_metadata;
use crate::markdown::MarkdownRenderer;

/// Builds validated [`ContentEntry`] values.
///
/// Assigns ids, stamps the creation time, applies [`ContentLimits`] and
/// renders markdown. Everything it returns is ready to be stored.
#[derive(Clone)]
pub struct EntryFactory {
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    renderer: Arc<dyn MarkdownRenderer>,
    limits: ContentLimits,
}

impl EntryFactory {
    pub fn new(
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
        renderer: Arc<dyn MarkdownRenderer>,
        limits: ContentLimits,
    ) -> Self {
        Self {
            ids,
            clock,
            renderer,
            limits,
        }
    }

    pub fn limits(&self) -> &ContentLimits {
        &self.limits
    }

    /// Build a file entry. The size is taken from the payload length.
    pub fn make_file_entry(
        &self,
        filename: &str,
        mime_type: &str,
        payload: Bytes,
    ) -> Result<ContentEntry, ContentError> {
        let size_bytes = payload.len() as u64;
        self.limits.validate_file(filename, mime_type, size_bytes)?;

        let body = ContentBody::File(FileContent {
            filename: filename.trim().to_owned(),
            mime_type: mime_type.to_owned(),
            size_bytes,
            payload,
        });
        Ok(self.stamp(body))
    }

    /// Build a text entry, optionally rendering it as markdown.
    ///
    /// Link metadata always comes from the raw text.
    pub fn make_text_entry(
        &self,
        raw_content: &str,
        render_as_markdown: bool,
    ) -> Result<ContentEntry, ContentError> {
        self.limits.validate_text(raw_content)?;

        let rendered_content = if render_as_markdown {
            self.renderer.render(raw_content)
        } else {
            raw_content.to_owned()
        };

        let body = ContentBody::Text(TextContent {
            raw_content: raw_content.to_owned(),
            rendered_content,
            is_markdown: render_as_markdown,
            link_metadata: extract_link_metadata(raw_content),
        });
        Ok(self.stamp(body))
    }

    fn stamp(&self, body: ContentBody) -> ContentEntry {
        ContentEntry::new(self.ids.next_id(), self.clock.now(), self.limits.ttl, body)
    }
}
