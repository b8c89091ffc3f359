//! MCP (Model Context Protocol) tool layer.
//!
//! Exposes the search engine and feed cache as MCP tools over stdio.
//! Stdout carries the protocol, so this mode logs to stderr only.

mod server;

pub use server::{serve_stdio, McpServer};
