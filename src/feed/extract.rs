//! Extraction of cacheable items from parsed feed documents.
//!
//! Takes the [`feed_rs`] model and produces the aggregator's item
//! shape: HTML stripped, descriptions capped, links absolutized and
//! every item stamped with its source feed. Items without a
//! publication date or a usable link are dropped here so the rest of
//! the pipeline never sees them.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::cache::CachedFeedDoc;
use crate::config::FeedsConfig;
use crate::feed::types::{FeedItem, FeedMetadata};
use crate::text::{normalize_summary, strip_html};

/// Feed-level data plus extracted items, ready to cache.
#[derive(Debug, Clone)]
pub struct ExtractedFeed {
    pub title: String,
    pub site_link: String,
    pub image_url: Option<String>,
    pub items: Vec<FeedItem>,
}

impl ExtractedFeed {
    /// Package the extraction as a cache document.
    pub fn into_cached_doc(self, feed_url: &str, fetched_at: DateTime<Utc>) -> CachedFeedDoc {
        CachedFeedDoc {
            feed_url: feed_url.to_string(),
            title: self.title,
            site_link: self.site_link,
            image_url: self.image_url,
            fetched_at,
            items: self.items,
        }
    }
}

/// Extract items from a parsed feed document.
///
/// The configured metadata supplies fallbacks for the feed title and
/// image; `max_item_age_days` (when non-zero) drops items older than
/// the cutoff.
pub fn extract_feed(
    feed: feed_rs::model::Feed,
    metadata: &FeedMetadata,
    config: &FeedsConfig,
) -> ExtractedFeed {
    let title = feed
        .title
        .map(|t| strip_html(&t.content))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| metadata.title.clone());

    let site_link = feed
        .links
        .first()
        .map(|l| l.href.clone())
        .unwrap_or_else(|| metadata.url.clone());

    let feed_image = feed
        .logo
        .or(feed.icon)
        .map(|img| img.uri)
        .or_else(|| metadata.default_image_url.clone());

    let cutoff = (config.max_item_age_days > 0)
        .then(|| Utc::now() - Duration::days(i64::from(config.max_item_age_days)));

    let mut dated: Vec<(DateTime<Utc>, FeedItem)> = Vec::with_capacity(feed.entries.len());
    for entry in feed.entries {
        let published = match entry.published.or(entry.updated) {
            Some(published) => published,
            None => {
                debug!(feed = %metadata.url, entry = %entry.id, "dropping item without date");
                continue;
            }
        };
        if let Some(cutoff) = cutoff {
            if published < cutoff {
                continue;
            }
        }

        let image_url = entry_image(&entry).or_else(|| feed_image.clone());
        let link = match entry.links.first() {
            Some(link) => resolve_link(&link.href, &site_link),
            None => {
                debug!(feed = %metadata.url, entry = %entry.id, "dropping item without link");
                continue;
            }
        };

        let item_title = entry
            .title
            .map(|t| strip_html(&t.content))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Untitled".to_string());

        let description = entry
            .summary
            .map(|t| t.content)
            .or_else(|| entry.content.and_then(|c| c.body))
            .map(|d| normalize_summary(&d, config.description_max_bytes))
            .unwrap_or_default();

        dated.push((
            published,
            FeedItem {
                title: item_title,
                description,
                link,
                pub_date: published.to_rfc2822(),
                source: title.clone(),
                source_link: site_link.clone(),
                image_url,
                feed_url: metadata.url.clone(),
            },
        ));
    }

    dated.sort_by(|a, b| b.0.cmp(&a.0));
    let items = dated.into_iter().map(|(_, item)| item).collect();

    ExtractedFeed {
        title,
        site_link,
        image_url: feed_image,
        items,
    }
}

/// First usable image URL attached to an entry.
fn entry_image(entry: &feed_rs::model::Entry) -> Option<String> {
    for media in &entry.media {
        if let Some(thumbnail) = media.thumbnails.first() {
            return Some(thumbnail.image.uri.clone());
        }
        for content in &media.content {
            if let Some(url) = &content.url {
                return Some(url.to_string());
            }
        }
    }
    None
}

/// Absolutize an item link against the feed's site link. Links that
/// resolve nowhere are kept as written.
fn resolve_link(href: &str, base: &str) -> String {
    match url::Url::parse(href) {
        Ok(absolute) => absolute.to_string(),
        Err(_) => match url::Url::parse(base).and_then(|b| b.join(href)) {
            Ok(joined) => joined.to_string(),
            Err(_) => href.to_string(),
        },
    }
}
