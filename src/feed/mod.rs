//! Feed acquisition and aggregation: fetching, extraction, the OPML
//! registry, the background updater and the combined output feed.

pub mod aggregate;
pub mod extract;
pub mod fetcher;
pub mod opml;
pub mod registry;
pub mod types;
pub mod updater;

pub use extract::{extract_feed, ExtractedFeed};
pub use fetcher::FeedFetcher;
pub use opml::parse_opml;
pub use registry::FeedRegistry;
pub use types::{parse_pub_date, FeedItem, FeedMetadata};
pub use updater::{start_updater, FeedUpdater, RefreshSummary};
