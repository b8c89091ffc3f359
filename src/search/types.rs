//! Search engine types.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::feed::types::FeedItem;

/// Default maximum number of results returned by a search.
pub const DEFAULT_LIMIT: usize = 20;

/// Default per-feed result cap applied before the global merge.
pub const DEFAULT_PER_FEED_LIMIT: usize = 10;

/// Default fuzzy edit-distance tolerance.
pub const DEFAULT_FUZZY_TOLERANCE: u8 = 1;

/// Largest accepted fuzzy tolerance; higher values are clamped.
pub const MAX_FUZZY_TOLERANCE: u8 = 2;

/// Quoted-phrase hits add the field's phrase weight times this factor.
const PHRASE_BONUS_FACTOR: f64 = 10.0;

/// The three searchable item fields.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    Title,
    Description,
    Source,
}

impl SearchField {
    /// All fields, in scoring order.
    pub const ALL: [SearchField; 3] = [
        SearchField::Title,
        SearchField::Description,
        SearchField::Source,
    ];

    /// Base relevance weight of the field.
    pub fn weight(self) -> f64 {
        match self {
            SearchField::Title => 3.0,
            SearchField::Description => 2.0,
            SearchField::Source => 1.0,
        }
    }

    /// Multiplier applied on top of the base weight for an exact
    /// (substring or word-boundary) match. Changing these reorders
    /// existing result sets.
    pub fn exact_multiplier(self) -> f64 {
        match self {
            SearchField::Title => 3.0,
            SearchField::Description => 2.0,
            SearchField::Source => 1.0,
        }
    }

    /// Multiplier applied on top of the base weight for a fuzzy match.
    pub fn fuzzy_multiplier(self) -> f64 {
        match self {
            SearchField::Title => 1.0,
            SearchField::Description => 1.0,
            SearchField::Source => 0.5,
        }
    }

    /// Flat bonus added for each quoted-phrase hit in this field.
    pub fn phrase_bonus(self) -> f64 {
        let phrase_weight = match self {
            SearchField::Title => 2.0,
            SearchField::Description => 1.5,
            SearchField::Source => 1.0,
        };
        phrase_weight * PHRASE_BONUS_FACTOR
    }

    /// Resolve a field name from a query string, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "title" => Some(SearchField::Title),
            "description" => Some(SearchField::Description),
            "source" => Some(SearchField::Source),
            _ => None,
        }
    }

    /// Extract this field's text from an item.
    pub fn text_of<'a>(self, item: &'a FeedItem) -> &'a str {
        match self {
            SearchField::Title => &item.title,
            SearchField::Description => &item.description,
            SearchField::Source => &item.source,
        }
    }
}

/// Global combinator for general terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryLogic {
    And,
    Or,
}

/// Structured form of a raw query string.
///
/// Quoted phrases and field-scoped terms are evaluated independently
/// of `logic`; only `general` terms are combined with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedQuery {
    /// Exact-phrase literals in first-seen order.
    pub quoted_phrases: Vec<String>,
    /// Field-scoped terms, grouped per field.
    pub field_queries: BTreeMap<SearchField, BTreeSet<String>>,
    /// Terms matched against all fields, combined with `logic`.
    pub general: Vec<String>,
    /// Combinator for the general terms.
    pub logic: QueryLogic,
}

impl ParsedQuery {
    /// A query with no terms at all. Matches nothing.
    pub fn empty() -> Self {
        Self {
            quoted_phrases: Vec::new(),
            field_queries: BTreeMap::new(),
            general: Vec::new(),
            logic: QueryLogic::And,
        }
    }

    /// Whether the query carries no phrases, field terms, or general
    /// terms.
    pub fn is_empty(&self) -> bool {
        self.quoted_phrases.is_empty() && self.field_queries.is_empty() && self.general.is_empty()
    }
}

/// Options for one search call.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Maximum number of results after the global merge.
    pub limit: usize,
    /// Whether word-boundary matching is attempted for terms.
    pub use_word_boundary: bool,
    /// Fuzzy edit-distance tolerance. Values above
    /// [`MAX_FUZZY_TOLERANCE`] are clamped at search time.
    pub fuzzy_tolerance: u8,
    /// Inclusive lower bound on item publication dates (ISO date or
    /// datetime). Malformed values mean no bound.
    pub date_from: Option<String>,
    /// Inclusive upper bound on item publication dates.
    pub date_to: Option<String>,
    /// Allow-list of feed URLs. `None` searches all configured feeds.
    pub feed_urls: Option<Vec<String>>,
    /// Per-feed result cap applied before the global merge.
    pub per_feed_limit: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            use_word_boundary: true,
            fuzzy_tolerance: DEFAULT_FUZZY_TOLERANCE,
            date_from: None,
            date_to: None,
            feed_urls: None,
            per_feed_limit: DEFAULT_PER_FEED_LIMIT,
        }
    }
}

impl SearchOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the result limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Enable or disable word-boundary matching.
    pub fn with_word_boundary(mut self, enabled: bool) -> Self {
        self.use_word_boundary = enabled;
        self
    }

    /// Set the fuzzy tolerance.
    pub fn with_fuzzy_tolerance(mut self, tolerance: u8) -> Self {
        self.fuzzy_tolerance = tolerance;
        self
    }

    /// Set the date window.
    pub fn with_date_range(mut self, from: Option<String>, to: Option<String>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    /// Restrict the search to the given feed URLs.
    pub fn with_feed_urls(mut self, urls: Vec<String>) -> Self {
        self.feed_urls = Some(urls);
        self
    }

    /// Set the per-feed cap.
    pub fn with_per_feed_limit(mut self, limit: usize) -> Self {
        self.per_feed_limit = limit;
        self
    }

    /// Fuzzy tolerance with the upper clamp applied.
    pub fn clamped_fuzzy_tolerance(&self) -> u8 {
        self.fuzzy_tolerance.min(MAX_FUZZY_TOLERANCE)
    }
}

/// A feed item with its relevance to one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredItem {
    /// The matched item.
    #[serde(flatten)]
    pub item: FeedItem,
    /// Accumulated relevance score, strictly positive for returned
    /// items.
    pub relevance_score: f64,
    /// Fields in which something matched.
    pub matched_fields: BTreeSet<SearchField>,
    /// Byte spans of matches per field, for highlighting.
    pub match_positions: BTreeMap<SearchField, Vec<(usize, usize)>>,
}

/// Bookkeeping about one search call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMetadata {
    /// Matches across all feeds after per-feed caps, before the
    /// global truncation.
    pub total_matches: usize,
    /// Number of results actually returned.
    pub returned_matches: usize,
    /// Number of feeds the search attempted to read.
    pub feeds_searched: usize,
    /// Distinct feeds represented in the returned results.
    pub feeds_with_matches: usize,
    /// Wall time of the search call in milliseconds.
    pub search_time_ms: u64,
    /// The parsed query, echoed back for caller introspection.
    pub query_parsed: ParsedQuery,
}

/// Complete result of one search call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// The raw query string as given.
    pub query: String,
    /// Ranked results, best first.
    pub results: Vec<ScoredItem>,
    /// Search bookkeeping.
    pub metadata: SearchMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_weights() {
        assert_eq!(SearchField::Title.weight(), 3.0);
        assert_eq!(SearchField::Description.weight(), 2.0);
        assert_eq!(SearchField::Source.weight(), 1.0);
    }

    #[test]
    fn test_exact_scores() {
        for field in SearchField::ALL {
            let score = field.weight() * field.exact_multiplier();
            match field {
                SearchField::Title => assert_eq!(score, 9.0),
                SearchField::Description => assert_eq!(score, 4.0),
                SearchField::Source => assert_eq!(score, 1.0),
            }
        }
    }

    #[test]
    fn test_fuzzy_scores() {
        for field in SearchField::ALL {
            let score = field.weight() * field.fuzzy_multiplier();
            match field {
                SearchField::Title => assert_eq!(score, 3.0),
                SearchField::Description => assert_eq!(score, 2.0),
                SearchField::Source => assert_eq!(score, 0.5),
            }
        }
    }

    #[test]
    fn test_phrase_bonuses() {
        assert_eq!(SearchField::Title.phrase_bonus(), 20.0);
        assert_eq!(SearchField::Description.phrase_bonus(), 15.0);
        assert_eq!(SearchField::Source.phrase_bonus(), 10.0);
    }

    #[test]
    fn test_field_from_name() {
        assert_eq!(SearchField::from_name("title"), Some(SearchField::Title));
        assert_eq!(SearchField::from_name("TITLE"), Some(SearchField::Title));
        assert_eq!(
            SearchField::from_name("Description"),
            Some(SearchField::Description)
        );
        assert_eq!(SearchField::from_name("source"), Some(SearchField::Source));
        assert_eq!(SearchField::from_name("author"), None);
    }

    #[test]
    fn test_logic_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&QueryLogic::And).unwrap(), "\"AND\"");
        assert_eq!(serde_json::to_string(&QueryLogic::Or).unwrap(), "\"OR\"");
    }

    #[test]
    fn test_field_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SearchField::Title).unwrap(),
            "\"title\""
        );
    }

    #[test]
    fn test_default_options() {
        let options = SearchOptions::default();
        assert_eq!(options.limit, 20);
        assert!(options.use_word_boundary);
        assert_eq!(options.fuzzy_tolerance, 1);
        assert!(options.date_from.is_none());
        assert!(options.date_to.is_none());
        assert!(options.feed_urls.is_none());
        assert_eq!(options.per_feed_limit, 10);
    }

    #[test]
    fn test_options_builder() {
        let options = SearchOptions::new()
            .with_limit(5)
            .with_word_boundary(false)
            .with_fuzzy_tolerance(2)
            .with_date_range(Some("2026-02-27".to_string()), Some("2026-02-28".to_string()))
            .with_feed_urls(vec!["https://example.com/feed.xml".to_string()])
            .with_per_feed_limit(3);
        assert_eq!(options.limit, 5);
        assert!(!options.use_word_boundary);
        assert_eq!(options.fuzzy_tolerance, 2);
        assert_eq!(options.date_from.as_deref(), Some("2026-02-27"));
        assert_eq!(options.date_to.as_deref(), Some("2026-02-28"));
        assert_eq!(options.per_feed_limit, 3);
    }

    #[test]
    fn test_fuzzy_tolerance_clamped() {
        let options = SearchOptions::new().with_fuzzy_tolerance(7);
        assert_eq!(options.clamped_fuzzy_tolerance(), 2);
        let options = SearchOptions::new().with_fuzzy_tolerance(0);
        assert_eq!(options.clamped_fuzzy_tolerance(), 0);
    }

    #[test]
    fn test_empty_query() {
        let query = ParsedQuery::empty();
        assert!(query.is_empty());
        assert_eq!(query.logic, QueryLogic::And);
    }

    #[test]
    fn test_parsed_query_serializes_camel_case() {
        let mut query = ParsedQuery::empty();
        query.quoted_phrases.push("GIS mapping".to_string());
        query
            .field_queries
            .entry(SearchField::Title)
            .or_default()
            .insert("QGIS".to_string());

        let json = serde_json::to_value(&query).unwrap();
        assert!(json.get("quotedPhrases").is_some());
        assert!(json.get("fieldQueries").is_some());
        assert!(json["fieldQueries"].get("title").is_some());
        assert_eq!(json["logic"], "AND");
    }
}
