//! Shared helpers for integration tests.
//!
//! Builds configs over a temp directory and seeds the cache store
//! with feed documents, so tests exercise the real OPML registry and
//! on-disk cache without any network access.

use chrono::Utc;
use tempfile::TempDir;

use feedscout::cache::{CacheStore, CachedFeedDoc};
use feedscout::config::Config;
use feedscout::feed::FeedItem;

pub const FEED_A: &str = "https://alpha.example.com/feed.xml";
pub const FEED_B: &str = "https://beta.example.com/feed.xml";

/// Config whose OPML file registers the given `(url, title)` feeds,
/// with the OPML file and cache directory both inside `dir`.
pub fn config_with_feeds(dir: &TempDir, feeds: &[(&str, &str)]) -> Config {
    let outlines: String = feeds
        .iter()
        .map(|(url, title)| format!(r#"<outline text="{}" xmlUrl="{}"/>"#, title, url))
        .collect();
    let opml_path = dir.path().join("feeds.opml");
    std::fs::write(
        &opml_path,
        format!(r#"<opml version="2.0"><body>{}</body></opml>"#, outlines),
    )
    .unwrap();

    let mut config = Config::default();
    config.cache.dir = dir.path().join("cache").to_string_lossy().into_owned();
    config.feeds.opml_path = opml_path.to_string_lossy().into_owned();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0; // Use random port
    config
}

/// A cached item. The link is derived from the title so every item
/// stays unique at the aggregation boundary.
pub fn item(feed_url: &str, source: &str, title: &str, pub_date: &str) -> FeedItem {
    FeedItem {
        title: title.to_string(),
        description: String::new(),
        link: format!("{}#{}", feed_url, title.replace(' ', "-")),
        pub_date: pub_date.to_string(),
        source: source.to_string(),
        source_link: feed_url.to_string(),
        image_url: None,
        feed_url: feed_url.to_string(),
    }
}

/// Store a cached document for `feed_url` containing `items`.
pub async fn store_doc(store: &CacheStore, feed_url: &str, title: &str, items: Vec<FeedItem>) {
    let doc = CachedFeedDoc {
        feed_url: feed_url.to_string(),
        title: title.to_string(),
        site_link: feed_url.to_string(),
        image_url: None,
        fetched_at: Utc::now(),
        items,
    };
    store.store_feed(&doc).await.unwrap();
}
