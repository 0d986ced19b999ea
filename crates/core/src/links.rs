use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("URL pattern is valid"));

/// Links detected in shared text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LinkMetadata {
    /// Whether the text contains at least one URL.
    pub has_links: bool,
    /// The first URL found, scanning left to right.
    pub first_url: String,
}

/// Scan `raw` for the first `http://` or `https://` URL.
///
/// The URL extends up to the next whitespace character. Returns `None`
/// when the text contains no URL.
pub fn extract_link_metadata(raw: &str) -> Option<LinkMetadata> {
    URL_PATTERN.find(raw).map(|m| LinkMetadata {
        has_links: true,
        first_url: m.as_str().to_owned(),
    })
}
