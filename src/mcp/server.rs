//! MCP server implementation.

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, tool::Parameters},
    model::{CallToolResult, Content, ErrorCode, ErrorData, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ServerHandler, ServiceExt,
};
use serde::Serialize;

use crate::app::AppState;
use crate::error::FeedscoutError;
use crate::feed::RefreshSummary;

/// Parameters for the `search_feed_items` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchFeedItemsParams {
    /// Search query. Supports quoted phrases, field scoping
    /// (title:, description:, source:) and AND/OR logic.
    pub query: String,
    /// Maximum number of results to return.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Prefer whole-word matches over bare substring containment.
    #[serde(default)]
    pub use_word_boundary: Option<bool>,
    /// Typo tolerance as edit-distance steps, clamped to 0-2.
    #[serde(default)]
    pub fuzzy_tolerance: Option<u8>,
    /// Only include items published on or after this date
    /// (ISO date or RFC 3339 timestamp).
    #[serde(default)]
    pub date_from: Option<String>,
    /// Only include items published on or before this date
    /// (ISO date or RFC 3339 timestamp).
    #[serde(default)]
    pub date_to: Option<String>,
    /// Restrict the search to these configured feed URLs.
    #[serde(default)]
    pub feed_urls: Option<Vec<String>>,
    /// Maximum number of results kept per feed.
    #[serde(default)]
    pub per_feed_limit: Option<usize>,
}

/// Parameters for the `get_feed_items` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetFeedItemsParams {
    /// URL of a configured feed.
    pub feed_url: String,
    /// Maximum number of items to return.
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Parameters for the `refresh_feed` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshFeedParams {
    /// URL of the feed to refresh. Omit to refresh all configured
    /// feeds.
    #[serde(default)]
    pub feed_url: Option<String>,
}

fn make_error(message: impl Into<String>) -> ErrorData {
    ErrorData {
        code: ErrorCode::INTERNAL_ERROR,
        message: Cow::from(message.into()),
        data: None,
    }
}

fn tool_error(err: FeedscoutError) -> ErrorData {
    let code = match &err {
        FeedscoutError::NotFound(_) | FeedscoutError::Search(_) => ErrorCode::INVALID_PARAMS,
        _ => ErrorCode::INTERNAL_ERROR,
    };
    ErrorData {
        code,
        message: Cow::from(err.to_string()),
        data: None,
    }
}

fn json_result<T: Serialize>(value: &T) -> std::result::Result<CallToolResult, ErrorData> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| make_error(format!("Failed to serialize response: {}", e)))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// MCP server exposing the feed cache and search engine.
#[derive(Clone)]
pub struct McpServer {
    state: Arc<AppState>,
    /// Tool router generated by the macro.
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    /// Create a new MCP server over shared application state.
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl McpServer {
    #[tool(
        description = "Search cached feed items by relevance. Queries support quoted phrases, field scoping (title:, description:, source:), AND/OR logic, optional fuzzy matching and an inclusive publication date window."
    )]
    async fn search_feed_items(
        &self,
        Parameters(params): Parameters<SearchFeedItemsParams>,
    ) -> std::result::Result<CallToolResult, ErrorData> {
        let mut options = self.state.default_search_options();
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
        if let Some(urls) = params.feed_urls {
            if !urls.is_empty() {
                options = options.with_feed_urls(urls);
            }
        }

        let result = self
            .state
            .search(&params.query, &options)
            .await
            .map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(
        description = "List configured feeds with their cache status (last fetch time and cached item count)."
    )]
    async fn list_feeds(&self) -> std::result::Result<CallToolResult, ErrorData> {
        let infos = self.state.feed_infos().await.map_err(tool_error)?;
        json_result(&infos)
    }

    #[tool(description = "Return cached items for one configured feed, newest first.")]
    async fn get_feed_items(
        &self,
        Parameters(params): Parameters<GetFeedItemsParams>,
    ) -> std::result::Result<CallToolResult, ErrorData> {
        let limit = params
            .limit
            .unwrap_or(self.state.config.search.default_limit);
        let items = self
            .state
            .feed_items(&params.feed_url, limit)
            .await
            .map_err(tool_error)?;
        json_result(&items)
    }

    #[tool(
        description = "Fetch and re-cache one configured feed, or all configured feeds when no URL is given."
    )]
    async fn refresh_feed(
        &self,
        Parameters(params): Parameters<RefreshFeedParams>,
    ) -> std::result::Result<CallToolResult, ErrorData> {
        let summary = match params.feed_url {
            Some(url) => {
                let items_cached = self
                    .state
                    .updater
                    .refresh_one(&url)
                    .await
                    .map_err(tool_error)?;
                RefreshSummary {
                    feeds_refreshed: 1,
                    feeds_failed: 0,
                    items_cached,
                }
            }
            None => self.state.updater.refresh_all().await.map_err(tool_error)?,
        };
        json_result(&summary)
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Feedscout aggregates configured RSS/Atom feeds into a local cache. \
                 Use 'search_feed_items' for relevance-ranked search across all cached \
                 items, 'list_feeds' to see the configured feeds, 'get_feed_items' for \
                 the latest items of one feed, and 'refresh_feed' to re-fetch before \
                 searching when freshness matters."
                    .to_string(),
            ),
            ..Default::default()
        }
    }
}

/// Run the MCP server on stdio until the client disconnects.
pub async fn serve_stdio(state: Arc<AppState>) -> crate::error::Result<()> {
    use rmcp::transport::stdio;

    let server = McpServer::new(state);

    let service = server
        .serve(stdio())
        .await
        .map_err(|e| FeedscoutError::Server(format!("MCP server failed to start: {}", e)))?;

    service
        .waiting()
        .await
        .map_err(|e| FeedscoutError::Server(format!("MCP server stopped: {}", e)))?;

    Ok(())
}
