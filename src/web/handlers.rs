//! HTTP handlers for the feed API.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::cache::FeedCacheInfo;
use crate::feed::aggregate;
use crate::search::SearchResult;
use crate::web::error::ApiError;

/// Query parameters for GET /api/search.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<usize>,
    pub use_word_boundary: Option<bool>,
    pub fuzzy_tolerance: Option<u8>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    /// Comma-separated feed URLs.
    pub feeds: Option<String>,
    pub per_feed_limit: Option<usize>,
}

/// GET /api/search - Relevance search over the cached feeds.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResult>, ApiError> {
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(ApiError::bad_request("missing query parameter: q"));
    }

    let mut options = state.default_search_options();
    if let Some(limit) = params.limit {
        options = options.with_limit(limit);
    }
    if let Some(use_word_boundary) = params.use_word_boundary {
        options = options.with_word_boundary(use_word_boundary);
    }
    if let Some(fuzzy_tolerance) = params.fuzzy_tolerance {
        options = options.with_fuzzy_tolerance(fuzzy_tolerance);
    }
    options = options.with_date_range(params.date_from, params.date_to);
    if let Some(per_feed_limit) = params.per_feed_limit {
        options = options.with_per_feed_limit(per_feed_limit);
    }
    if let Some(feeds) = params.feeds {
        let urls: Vec<String> = feeds
            .split(',')
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();
        if !urls.is_empty() {
            options = options.with_feed_urls(urls);
        }
    }

    let result = state.search(&query, &options).await?;
    Ok(Json(result))
}

/// GET /api/feeds - Registered feeds with cache bookkeeping.
pub async fn list_feeds(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<FeedCacheInfo>>, ApiError> {
    Ok(Json(state.feed_infos().await?))
}

/// GET /feed.xml - The aggregated RSS document.
pub async fn aggregated_feed(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let feeds = state.registry.feeds().await?;
    let xml = aggregate::build_feed(&state.store, &feeds, &state.config.aggregate).await;
    Ok((
        [(header::CONTENT_TYPE, "application/rss+xml; charset=utf-8")],
        xml,
    ))
}
