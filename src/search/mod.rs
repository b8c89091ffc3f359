//! Feed search: query parsing, relevance scoring and orchestration
//! over the disk cache.

pub mod matching;
pub mod orchestrator;
pub mod query;
pub mod score;
pub mod types;

pub use matching::{levenshtein, FuzzyMatcher, LevenshteinMatcher};
pub use orchestrator::SearchEngine;
pub use score::{ItemScore, Scorer};
pub use types::{
    ParsedQuery, QueryLogic, ScoredItem, SearchField, SearchMetadata, SearchOptions, SearchResult,
};
