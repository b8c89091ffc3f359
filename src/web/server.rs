//! Web server for feedscout.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::app::AppState;
use crate::error::{FeedscoutError, Result};

use super::router::create_router;

/// Web server for the HTTP API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Shared application state.
    state: Arc<AppState>,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(state: Arc<AppState>) -> Result<Self> {
        let addr = format!(
            "{}:{}",
            state.config.server.host, state.config.server.port
        )
        .parse()
        .map_err(|e| FeedscoutError::Server(format!("invalid server address: {}", e)))?;

        Ok(Self { addr, state })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Run the web server until shutdown.
    pub async fn run(self) -> Result<()> {
        let router = create_router(self.state);

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Web server listening on http://{}", local_addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Web server stopped");
        Ok(())
    }

    /// Run the server and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        let router = create_router(self.state);

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

/// Wait for ctrl-c.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
    }
}
