//! Search orchestration across cached feeds.
//!
//! The engine parses the query once, compiles one [`Scorer`] per
//! call, then fans out over the selected feeds in fixed-size batches.
//! Per-feed work reads only the disk cache; a feed that was never
//! fetched or whose cache cannot be read contributes nothing instead
//! of failing the search.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, NaiveDate, Utc};
use futures::future::join_all;
use tracing::{debug, warn};

use crate::cache::CacheStore;
use crate::error::Result;
use crate::feed::types::{FeedItem, FeedMetadata};
use crate::search::matching::{FuzzyMatcher, LevenshteinMatcher};
use crate::search::query;
use crate::search::score::Scorer;
use crate::search::types::{ScoredItem, SearchMetadata, SearchOptions, SearchResult};

/// Relevance search over the feed cache.
pub struct SearchEngine {
    store: Arc<CacheStore>,
    batch_size: usize,
    fuzzy: Box<dyn FuzzyMatcher>,
}

impl SearchEngine {
    pub fn new(store: Arc<CacheStore>, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
            fuzzy: Box::new(LevenshteinMatcher),
        }
    }

    /// Replace the fuzzy matcher.
    pub fn with_matcher(mut self, fuzzy: Box<dyn FuzzyMatcher>) -> Self {
        self.fuzzy = fuzzy;
        self
    }

    /// Run one search over the given feeds.
    ///
    /// Feeds are processed in batches of the configured size, each
    /// batch concurrently, batches in sequence. Results are capped
    /// per feed before the global sort and cut; `totalMatches` counts
    /// everything that survived the per-feed cap.
    pub async fn search(
        &self,
        feeds: &[FeedMetadata],
        raw_query: &str,
        options: &SearchOptions,
    ) -> Result<SearchResult> {
        let started = Instant::now();
        let parsed = query::parse(raw_query);
        let tolerance = options.clamped_fuzzy_tolerance();
        let bounds = DateBounds::from_options(options);
        let scorer = Scorer::compile(
            &parsed,
            options.use_word_boundary,
            tolerance,
            self.fuzzy.as_ref(),
        )?;

        let selected: Vec<&FeedMetadata> = match &options.feed_urls {
            Some(urls) => feeds
                .iter()
                .filter(|feed| urls.iter().any(|url| url == &feed.url))
                .collect(),
            None => feeds.iter().collect(),
        };
        let feeds_searched = selected.len();

        let mut merged: Vec<ScoredItem> = Vec::new();
        for batch in selected.chunks(self.batch_size) {
            let outcomes = join_all(
                batch
                    .iter()
                    .map(|feed| self.search_feed(feed, &scorer, bounds, options.per_feed_limit)),
            )
            .await;
            for feed_results in outcomes {
                merged.extend(feed_results);
            }
        }

        let total_matches = merged.len();
        merged.sort_by(compare_merged);
        merged.truncate(options.limit);

        let feeds_with_matches = merged
            .iter()
            .map(|scored| scored.item.feed_url.as_str())
            .collect::<BTreeSet<_>>()
            .len();

        Ok(SearchResult {
            query: raw_query.to_string(),
            metadata: SearchMetadata {
                total_matches,
                returned_matches: merged.len(),
                feeds_searched,
                feeds_with_matches,
                search_time_ms: started.elapsed().as_millis() as u64,
                query_parsed: parsed,
            },
            results: merged,
        })
    }

    /// Score one feed's cached items: date filter, score, drop
    /// non-matches, sort by score, cap.
    async fn search_feed(
        &self,
        feed: &FeedMetadata,
        scorer: &Scorer<'_>,
        bounds: DateBounds,
        per_feed_limit: usize,
    ) -> Vec<ScoredItem> {
        let items = match self.store.cached_items(&feed.url).await {
            Ok(Some(items)) => items,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(feed = %feed.url, error = %e, "skipping unreadable feed cache");
                return Vec::new();
            }
        };

        let mut scored: Vec<ScoredItem> = Vec::new();
        for item in items {
            if !bounds.admits(&item) {
                continue;
            }
            let hit = scorer.score(&item);
            if !hit.is_match() {
                continue;
            }
            scored.push(ScoredItem {
                item,
                relevance_score: hit.score,
                matched_fields: hit.matched_fields,
                match_positions: hit.match_positions,
            });
        }

        // Stable sort keeps the cached newest-first order for ties.
        scored.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap_or(Ordering::Equal)
        });
        scored.truncate(per_feed_limit);
        scored
    }
}

/// Global ordering: score descending, then publication date
/// descending. Items without a parseable date sort last among equal
/// scores.
fn compare_merged(a: &ScoredItem, b: &ScoredItem) -> Ordering {
    b.relevance_score
        .partial_cmp(&a.relevance_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.item.published_at().cmp(&a.item.published_at()))
}

/// Publication-date window for one search call, both ends inclusive.
#[derive(Debug, Clone, Copy)]
struct DateBounds {
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
}

impl DateBounds {
    fn from_options(options: &SearchOptions) -> Self {
        Self {
            from: parse_date_bound(options.date_from.as_deref()),
            to: parse_date_bound(options.date_to.as_deref()),
        }
    }

    fn is_active(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    /// While bounds are active, an item whose date cannot be parsed
    /// is excluded.
    fn admits(&self, item: &FeedItem) -> bool {
        if !self.is_active() {
            return true;
        }
        let Some(published) = item.published_at() else {
            return false;
        };
        if let Some(from) = self.from {
            if published < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if published > to {
                return false;
            }
        }
        true
    }
}

/// Parse one date bound. Full RFC 3339 timestamps and bare ISO dates
/// are accepted; a bare date means midnight UTC. Anything else drops
/// the bound.
fn parse_date_bound(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    debug!(bound = raw, "ignoring unparseable date bound");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CachedFeedDoc;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn meta(url: &str, title: &str) -> FeedMetadata {
        FeedMetadata::new(url, title)
    }

    fn item(feed_url: &str, title: &str, description: &str, pub_date: &str) -> FeedItem {
        FeedItem {
            title: title.to_string(),
            description: description.to_string(),
            link: format!("{}/{}", feed_url, title.replace(' ', "-")),
            pub_date: pub_date.to_string(),
            source: "Test Feed".to_string(),
            source_link: feed_url.to_string(),
            image_url: None,
            feed_url: feed_url.to_string(),
        }
    }

    fn doc(feed_url: &str, items: Vec<FeedItem>) -> CachedFeedDoc {
        CachedFeedDoc {
            feed_url: feed_url.to_string(),
            title: "Test Feed".to_string(),
            site_link: feed_url.to_string(),
            image_url: None,
            fetched_at: Utc::now(),
            items,
        }
    }

    async fn store_with_docs(docs: Vec<CachedFeedDoc>) -> (TempDir, Arc<CacheStore>) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(CacheStore::open(dir.path()).unwrap());
        for doc in &docs {
            store.store_feed(doc).await.unwrap();
        }
        (dir, store)
    }

    const FEED_A: &str = "https://a.example.com/feed.xml";
    const FEED_B: &str = "https://b.example.com/feed.xml";

    #[tokio::test]
    async fn test_search_merges_and_ranks_across_feeds() {
        let (_dir, store) = store_with_docs(vec![
            doc(
                FEED_B,
                vec![item(
                    FEED_B,
                    "Weekly notes",
                    "notes on mapping",
                    "Mon, 24 Aug 2026 10:00:00 +0000",
                )],
            ),
            doc(
                FEED_A,
                vec![item(
                    FEED_A,
                    "Mapping tools roundup",
                    "",
                    "Tue, 25 Aug 2026 10:00:00 +0000",
                )],
            ),
        ])
        .await;

        let engine = SearchEngine::new(store, 10);
        let metas = vec![meta(FEED_A, "A"), meta(FEED_B, "B")];
        let result = engine
            .search(&metas, "mapping", &SearchOptions::default())
            .await
            .unwrap();

        // Title match (9.0) outranks description match (4.0).
        assert_eq!(result.results.len(), 2);
        assert_eq!(result.results[0].relevance_score, 9.0);
        assert_eq!(result.results[0].item.feed_url, FEED_A);
        assert_eq!(result.results[1].relevance_score, 4.0);
        assert_eq!(result.metadata.total_matches, 2);
        assert_eq!(result.metadata.returned_matches, 2);
        assert_eq!(result.metadata.feeds_searched, 2);
        assert_eq!(result.metadata.feeds_with_matches, 2);
    }

    #[tokio::test]
    async fn test_per_feed_limit_keeps_top_scored() {
        let (_dir, store) = store_with_docs(vec![doc(
            FEED_A,
            vec![
                item(FEED_A, "mapping one", "", "Tue, 25 Aug 2026 10:00:00 +0000"),
                item(FEED_A, "mapping two", "", "Mon, 24 Aug 2026 10:00:00 +0000"),
                item(
                    FEED_A,
                    "Other title",
                    "notes about mapping",
                    "Mon, 24 Aug 2026 09:00:00 +0000",
                ),
            ],
        )])
        .await;

        let engine = SearchEngine::new(store, 10);
        let metas = vec![meta(FEED_A, "A")];
        let options = SearchOptions::default().with_per_feed_limit(2);
        let result = engine.search(&metas, "mapping", &options).await.unwrap();

        // The description-only match (4.0) is cut by the per-feed cap
        // and does not count toward the total either.
        assert_eq!(result.metadata.total_matches, 2);
        assert_eq!(result.results.len(), 2);
        assert!(result
            .results
            .iter()
            .all(|scored| scored.relevance_score == 9.0));
    }

    #[tokio::test]
    async fn test_global_limit_truncates_after_counting() {
        let (_dir, store) = store_with_docs(vec![
            doc(
                FEED_A,
                vec![
                    item(FEED_A, "gis one", "", "Tue, 25 Aug 2026 10:00:00 +0000"),
                    item(FEED_A, "gis two", "", "Mon, 24 Aug 2026 10:00:00 +0000"),
                ],
            ),
            doc(
                FEED_B,
                vec![
                    item(FEED_B, "gis three", "", "Tue, 25 Aug 2026 09:00:00 +0000"),
                    item(FEED_B, "gis four", "", "Mon, 24 Aug 2026 09:00:00 +0000"),
                ],
            ),
        ])
        .await;

        let engine = SearchEngine::new(store, 10);
        let metas = vec![meta(FEED_A, "A"), meta(FEED_B, "B")];
        let options = SearchOptions::default().with_limit(3);
        let result = engine.search(&metas, "gis", &options).await.unwrap();

        assert_eq!(result.metadata.total_matches, 4);
        assert_eq!(result.metadata.returned_matches, 3);
        assert_eq!(result.results.len(), 3);
    }

    #[tokio::test]
    async fn test_missing_feed_cache_is_tolerated() {
        let (_dir, store) = store_with_docs(vec![doc(
            FEED_A,
            vec![item(FEED_A, "gis news", "", "Tue, 25 Aug 2026 10:00:00 +0000")],
        )])
        .await;

        let engine = SearchEngine::new(store, 10);
        let metas = vec![meta(FEED_A, "A"), meta(FEED_B, "never fetched")];
        let result = engine
            .search(&metas, "gis", &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(result.metadata.feeds_searched, 2);
        assert_eq!(result.metadata.feeds_with_matches, 1);
        assert_eq!(result.results.len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_feed_cache_is_tolerated() {
        let (_dir, store) = store_with_docs(vec![
            doc(
                FEED_A,
                vec![item(FEED_A, "gis news", "", "Tue, 25 Aug 2026 10:00:00 +0000")],
            ),
            doc(
                FEED_B,
                vec![item(FEED_B, "gis extra", "", "Mon, 24 Aug 2026 10:00:00 +0000")],
            ),
        ])
        .await;
        std::fs::write(store.feed_doc_path(FEED_B), b"not json").unwrap();

        let engine = SearchEngine::new(store, 10);
        let metas = vec![meta(FEED_A, "A"), meta(FEED_B, "B")];
        let result = engine
            .search(&metas, "gis", &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(result.results.len(), 1);
        assert_eq!(result.results[0].item.feed_url, FEED_A);
    }

    #[tokio::test]
    async fn test_date_window_inclusive_bounds() {
        let (_dir, store) = store_with_docs(vec![doc(
            FEED_A,
            vec![
                item(FEED_A, "gis alpha", "", "Fri, 27 Feb 2026 12:00:00 +0000"),
                item(FEED_A, "gis beta", "", "Sat, 28 Feb 2026 00:00:00 +0000"),
                item(FEED_A, "gis gamma", "", "Sat, 28 Feb 2026 08:00:00 +0000"),
                item(FEED_A, "gis delta", "", "Thu, 26 Feb 2026 09:00:00 +0000"),
            ],
        )])
        .await;

        let engine = SearchEngine::new(store, 10);
        let metas = vec![meta(FEED_A, "A")];
        let options = SearchOptions::default()
            .with_date_range(Some("2026-02-27".into()), Some("2026-02-28".into()));
        let result = engine.search(&metas, "gis", &options).await.unwrap();

        let titles: Vec<&str> = result
            .results
            .iter()
            .map(|scored| scored.item.title.as_str())
            .collect();
        // A bare end date means midnight UTC: beta (exactly midnight)
        // is inside the window, gamma (later that day) is not.
        assert_eq!(titles, vec!["gis beta", "gis alpha"]);
    }

    #[tokio::test]
    async fn test_rfc3339_bound_carries_time_of_day() {
        let (_dir, store) = store_with_docs(vec![doc(
            FEED_A,
            vec![
                item(FEED_A, "gis beta", "", "Sat, 28 Feb 2026 00:00:00 +0000"),
                item(FEED_A, "gis gamma", "", "Sat, 28 Feb 2026 08:00:00 +0000"),
            ],
        )])
        .await;

        let engine = SearchEngine::new(store, 10);
        let metas = vec![meta(FEED_A, "A")];
        let options = SearchOptions::default()
            .with_date_range(Some("2026-02-28T06:00:00Z".into()), None);
        let result = engine.search(&metas, "gis", &options).await.unwrap();

        assert_eq!(result.results.len(), 1);
        assert_eq!(result.results[0].item.title, "gis gamma");
    }

    #[tokio::test]
    async fn test_unparseable_item_date_excluded_only_when_filtering() {
        let (_dir, store) = store_with_docs(vec![doc(
            FEED_A,
            vec![item(FEED_A, "gis undated", "", "soon")],
        )])
        .await;

        let engine = SearchEngine::new(store, 10);
        let metas = vec![meta(FEED_A, "A")];

        let result = engine
            .search(&metas, "gis", &SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(result.results.len(), 1);

        let options = SearchOptions::default().with_date_range(Some("2026-02-27".into()), None);
        let result = engine.search(&metas, "gis", &options).await.unwrap();
        assert!(result.results.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_date_bound_is_ignored() {
        let (_dir, store) = store_with_docs(vec![doc(
            FEED_A,
            vec![item(FEED_A, "gis news", "", "Thu, 26 Feb 2026 09:00:00 +0000")],
        )])
        .await;

        let engine = SearchEngine::new(store, 10);
        let metas = vec![meta(FEED_A, "A")];
        let options = SearchOptions::default().with_date_range(Some("27/02/2026".into()), None);
        let result = engine.search(&metas, "gis", &options).await.unwrap();

        assert_eq!(result.results.len(), 1);
    }

    #[tokio::test]
    async fn test_feed_urls_filter_restricts_search() {
        let (_dir, store) = store_with_docs(vec![
            doc(
                FEED_A,
                vec![item(FEED_A, "gis one", "", "Tue, 25 Aug 2026 10:00:00 +0000")],
            ),
            doc(
                FEED_B,
                vec![item(FEED_B, "gis two", "", "Mon, 24 Aug 2026 10:00:00 +0000")],
            ),
        ])
        .await;

        let engine = SearchEngine::new(store, 10);
        let metas = vec![meta(FEED_A, "A"), meta(FEED_B, "B")];
        let options = SearchOptions::default().with_feed_urls(vec![FEED_A.to_string()]);
        let result = engine.search(&metas, "gis", &options).await.unwrap();

        assert_eq!(result.metadata.feeds_searched, 1);
        assert_eq!(result.results.len(), 1);
        assert_eq!(result.results[0].item.feed_url, FEED_A);
    }

    #[tokio::test]
    async fn test_equal_scores_order_newest_first() {
        let (_dir, store) = store_with_docs(vec![
            doc(
                FEED_A,
                vec![item(FEED_A, "gis older", "", "Mon, 24 Aug 2026 10:00:00 +0000")],
            ),
            doc(
                FEED_B,
                vec![item(FEED_B, "gis newer", "", "Tue, 25 Aug 2026 10:00:00 +0000")],
            ),
        ])
        .await;

        let engine = SearchEngine::new(store, 10);
        let metas = vec![meta(FEED_A, "A"), meta(FEED_B, "B")];
        let result = engine
            .search(&metas, "gis", &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(result.results[0].item.title, "gis newer");
        assert_eq!(result.results[1].item.title, "gis older");
    }

    #[tokio::test]
    async fn test_empty_query_matches_nothing() {
        let (_dir, store) = store_with_docs(vec![doc(
            FEED_A,
            vec![item(FEED_A, "gis news", "", "Tue, 25 Aug 2026 10:00:00 +0000")],
        )])
        .await;

        let engine = SearchEngine::new(store, 10);
        let metas = vec![meta(FEED_A, "A")];
        let result = engine
            .search(&metas, "   ", &SearchOptions::default())
            .await
            .unwrap();

        assert!(result.results.is_empty());
        assert_eq!(result.metadata.total_matches, 0);
        assert_eq!(result.metadata.feeds_searched, 1);
        assert!(result.metadata.query_parsed.is_empty());
    }

    #[tokio::test]
    async fn test_small_batches_cover_all_feeds() {
        let (_dir, store) = store_with_docs(vec![
            doc(
                FEED_A,
                vec![item(FEED_A, "gis one", "", "Tue, 25 Aug 2026 10:00:00 +0000")],
            ),
            doc(
                FEED_B,
                vec![item(FEED_B, "gis two", "", "Mon, 24 Aug 2026 10:00:00 +0000")],
            ),
        ])
        .await;

        let engine = SearchEngine::new(store, 1);
        let metas = vec![meta(FEED_A, "A"), meta(FEED_B, "B")];
        let result = engine
            .search(&metas, "gis", &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(result.results.len(), 2);
    }

    #[test]
    fn test_parse_date_bound_variants() {
        assert_eq!(
            parse_date_bound(Some("2026-02-27")),
            Some(Utc.with_ymd_and_hms(2026, 2, 27, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_date_bound(Some("2026-02-27T06:30:00Z")),
            Some(Utc.with_ymd_and_hms(2026, 2, 27, 6, 30, 0).unwrap())
        );
        assert_eq!(parse_date_bound(Some("not a date")), None);
        assert_eq!(parse_date_bound(Some("   ")), None);
        assert_eq!(parse_date_bound(None), None);
    }
}
