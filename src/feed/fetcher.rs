//! Feed fetcher with security measures.
//!
//! Fetches RSS/Atom/RDF documents over HTTP with SSRF protection and
//! resource limits. Parsing into the aggregator's item model lives in
//! [`crate::feed::extract`].

use std::net::IpAddr;
use std::time::Duration;

use feed_rs::parser;
use reqwest::Client;

use crate::config::FeedsConfig;
use crate::error::{FeedscoutError, Result};

/// User agent string for feed fetching.
const USER_AGENT: &str = "Feedscout/0.1 (Feed Aggregator)";

/// Hostname suffixes that always resolve inside a private network.
const FORBIDDEN_SUFFIXES: [&str; 7] = [
    ".local",
    ".localhost",
    ".internal",
    ".intranet",
    ".corp",
    ".home",
    ".lan",
];

/// HTTP feed fetcher with SSRF protection and size limits.
pub struct FeedFetcher {
    client: Client,
    max_feed_size: u64,
}

impl FeedFetcher {
    /// Create a fetcher with timeouts and limits from the feeds
    /// configuration.
    pub fn new(config: &FeedsConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FeedscoutError::Fetch(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_feed_size: config.max_feed_size_bytes,
        })
    }

    /// Fetch the raw feed document at `url`.
    ///
    /// The URL is validated against private hosts first; the size
    /// limit is checked both from Content-Length and from the body
    /// actually read.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        validate_url(url)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FeedscoutError::Fetch(format!("failed to fetch {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(FeedscoutError::Fetch(format!(
                "HTTP error fetching {}: {}",
                url,
                response.status()
            )));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_feed_size {
                return Err(FeedscoutError::Fetch(format!(
                    "feed too large: {} bytes (max {} bytes)",
                    content_length, self.max_feed_size
                )));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FeedscoutError::Fetch(format!("failed to read {}: {}", url, e)))?;

        if bytes.len() as u64 > self.max_feed_size {
            return Err(FeedscoutError::Fetch(format!(
                "feed too large: {} bytes (max {} bytes)",
                bytes.len(),
                self.max_feed_size
            )));
        }

        Ok(bytes.to_vec())
    }

    /// Fetch and parse a feed document.
    pub async fn fetch_feed(&self, url: &str) -> Result<feed_rs::model::Feed> {
        let bytes = self.fetch(url).await?;
        parse_feed_bytes(&bytes)
    }
}

/// Parse raw bytes as an RSS/Atom/RDF document.
pub fn parse_feed_bytes(bytes: &[u8]) -> Result<feed_rs::model::Feed> {
    parser::parse(bytes).map_err(|e| FeedscoutError::Parse(format!("failed to parse feed: {}", e)))
}

/// Validate a URL for SSRF protection.
///
/// The URL must use http or https, and its host must not be a
/// private/loopback address or a reserved hostname.
pub fn validate_url(url: &str) -> Result<()> {
    let parsed =
        url::Url::parse(url).map_err(|e| FeedscoutError::Fetch(format!("invalid URL: {}", e)))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(FeedscoutError::Fetch(format!(
                "unsupported URL scheme: {}",
                scheme
            )));
        }
    }

    let host = parsed
        .host()
        .ok_or_else(|| FeedscoutError::Fetch("URL has no host".to_string()))?;

    match host {
        url::Host::Domain(domain) => {
            if is_forbidden_hostname(domain) {
                return Err(FeedscoutError::Fetch(format!("forbidden host: {}", domain)));
            }
        }
        url::Host::Ipv4(ipv4) => {
            if is_private_ip(&IpAddr::V4(ipv4)) {
                return Err(FeedscoutError::Fetch(format!(
                    "private IP address not allowed: {}",
                    ipv4
                )));
            }
        }
        url::Host::Ipv6(ipv6) => {
            if is_private_ip(&IpAddr::V6(ipv6)) {
                return Err(FeedscoutError::Fetch(format!(
                    "private IP address not allowed: {}",
                    ipv6
                )));
            }
        }
    }

    Ok(())
}

fn is_forbidden_hostname(host: &str) -> bool {
    let host = host.to_lowercase();
    host == "localhost" || FORBIDDEN_SUFFIXES.iter().any(|suffix| host.ends_with(suffix))
}

/// Check if an IP address is private or otherwise reserved.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                || v4.is_documentation()
        }
        IpAddr::V6(v6) => {
            let segments = v6.segments();
            v6.is_loopback()
                || v6.is_unspecified()
                // Unique local: fc00::/7
                || (segments[0] & 0xfe00) == 0xfc00
                // Link-local: fe80::/10
                || (segments[0] & 0xffc0) == 0xfe80
        }
    }
}
