use chrono::Duration;

use crate::error::ContentError;

/// Default time-to-live of a shared entry: 10 minutes.
pub const DEFAULT_TTL_SECONDS: i64 = 600;

/// Default maximum file size: 100 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Default maximum text length, in characters.
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 1000;

/// MIME types accepted when no allow-list is configured.
pub const DEFAULT_ALLOWED_MIME_TYPES: &[&str] = &[
    "image/*",
    "video/*",
    "audio/*",
    "text/*",
    "application/pdf",
    "application/zip",
    "application/json",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.*",
    "application/vnd.oasis.opendocument.*",
    "application/octet-stream",
];

/// Size, length and type policy applied to content before it is stored.
#[derive(Debug, Clone)]
pub struct ContentLimits {
    /// How long an entry stays live after creation.
    pub ttl: Duration,
    /// Largest accepted file payload, in bytes.
    pub max_file_size: u64,
    /// Longest accepted text, in Unicode scalar values.
    pub max_text_length: usize,
    /// Accepted MIME types. An entry ending in `/*` (or `.*`) matches by prefix.
    pub allowed_mime_types: Vec<String>,
}

impl Default for ContentLimits {
    fn default() -> Self {
        Self {
            ttl: Duration::seconds(DEFAULT_TTL_SECONDS),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
            allowed_mime_types: DEFAULT_ALLOWED_MIME_TYPES
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
        }
    }
}

impl ContentLimits {
    /// Check a file's name, size and MIME type.
    pub fn validate_file(
        &self,
        filename: &str,
        mime_type: &str,
        size_bytes: u64,
    ) -> Result<(), ContentError> {
        if filename.trim().is_empty() {
            return Err(ContentError::Validation("filename must not be empty".into()));
        }
        if size_bytes > self.max_file_size {
            return Err(ContentError::PayloadTooLarge {
                size: size_bytes,
                max: self.max_file_size,
            });
        }
        if !self.is_mime_allowed(mime_type) {
            return Err(ContentError::UnsupportedMediaType(mime_type.to_owned()));
        }
        Ok(())
    }

    /// Check that text is non-blank and within the length limit.
    pub fn validate_text(&self, raw: &str) -> Result<(), ContentError> {
        if raw.trim().is_empty() {
            return Err(ContentError::Validation("text must not be empty".into()));
        }
        let length = raw.chars().count();
        if length > self.max_text_length {
            return Err(ContentError::Validation(format!(
                "text is {length} characters, maximum is {}",
                self.max_text_length
            )));
        }
        Ok(())
    }

    /// Whether `mime_type` matches any allow-list entry.
    ///
    /// Parameters such as `; charset=utf-8` are ignored and matching is
    /// case-insensitive.
    pub fn is_mime_allowed(&self, mime_type: &str) -> bool {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if essence.is_empty() {
            return false;
        }
        self.allowed_mime_types.iter().any(|pattern| {
            let pattern = pattern.trim().to_ascii_lowercase();
            match pattern.strip_suffix('*') {
                Some(prefix) => essence.starts_with(prefix),
                None => essence == pattern,
            }
        })
    }
}
