//! Feed domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum byte length for a normalized item description.
pub const MAX_DESCRIPTION_BYTES: usize = 500;

/// Maximum feed document size in bytes (5MB).
pub const MAX_FEED_SIZE: u64 = 5 * 1024 * 1024;

/// One syndicated entry, normalized regardless of source format
/// (RSS 2.0, Atom, RDF/RSS 1.0).
///
/// Serialized with camelCase keys; this is the wire shape returned by
/// the search and feed APIs and stored in the per-feed cache files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    /// Item title, HTML-stripped and entity-decoded.
    pub title: String,
    /// Item summary, HTML-stripped and capped at a byte budget.
    pub description: String,
    /// Absolute link to the original article when resolvable.
    pub link: String,
    /// Publication date as an RFC 2822 string. Always parseable;
    /// entries without a usable date never become items.
    pub pub_date: String,
    /// Title of the feed this item came from.
    pub source: String,
    /// Site link of the source feed.
    pub source_link: String,
    /// Item image, falling back to the feed's default image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// URL of the feed this item came from; lets merged result lists
    /// be traced back to their feed.
    #[serde(default)]
    pub feed_url: String,
}

impl FeedItem {
    /// Parse the item's publication date.
    ///
    /// Returns `None` only for items that somehow carry an
    /// unparseable date (hand-edited cache files); extraction never
    /// produces them.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        parse_pub_date(&self.pub_date)
    }
}

/// One entry per configured feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedMetadata {
    /// Feed URL. Primary key across the system.
    pub url: String,
    /// Feed title.
    pub title: String,
    /// Feed description.
    #[serde(default)]
    pub description: String,
    /// Image applied to items that carry none of their own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_image_url: Option<String>,
}

impl FeedMetadata {
    /// Create metadata for a feed URL.
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            description: String::new(),
            default_image_url: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the default image URL.
    pub fn with_default_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.default_image_url = Some(image_url.into());
        self
    }
}

/// Parse a feed date string. Feeds in the wild carry RFC 2822
/// (`Tue, 25 Aug 2026 06:00:00 +0000`) or RFC 3339
/// (`2026-08-25T06:00:00Z`); both are accepted.
pub fn parse_pub_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(s)
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
