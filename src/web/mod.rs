//! Web module for feedscout.
//!
//! Serves the aggregated feed and a small JSON API over the same
//! search engine the MCP tools use.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
