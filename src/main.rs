//! Feedscout server binary.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use feedscout::app::AppState;
use feedscout::config::Config;
use feedscout::feed::start_updater;
use feedscout::web::WebServer;

/// Feedscout: RSS/Atom feed aggregator with relevance search.
#[derive(Parser)]
#[command(name = "feedscout", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Option<Command>,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server and the background updater.
    Serve,

    /// Run as an MCP stdio server for AI assistants.
    Mcp,

    /// Fetch all configured feeds once and exit.
    Refresh,
}

#[tokio::main]
async fn main() -> feedscout::Result<()> {
    let cli = Cli::parse();

    let config = match Config::load_with_env(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", cli.config.display());
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_serve(config).await,
        Command::Mcp => run_mcp(config).await,
        Command::Refresh => run_refresh(config).await,
    }
}

fn init_logging(config: &Config) {
    if let Err(e) = feedscout::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        feedscout::logging::init_console_only(&config.logging.level);
    }
}

async fn run_serve(config: Config) -> feedscout::Result<()> {
    init_logging(&config);
    config.validate()?;

    info!("Feedscout v{}", env!("CARGO_PKG_VERSION"));

    let state = Arc::new(AppState::from_config(config)?);
    let updater = start_updater(state.updater.clone());

    let server = WebServer::new(state)?;
    let result = server.run().await;

    updater.abort();
    result
}

async fn run_mcp(config: Config) -> feedscout::Result<()> {
    // Stdout carries the MCP protocol, keep logs on stderr
    feedscout::logging::init_stderr_only(&config.logging.level);
    config.validate()?;

    let state = Arc::new(AppState::from_config(config)?);
    feedscout::mcp::serve_stdio(state).await
}

async fn run_refresh(config: Config) -> feedscout::Result<()> {
    init_logging(&config);
    config.validate()?;

    let state = AppState::from_config(config)?;
    let summary = state.updater.refresh_all().await?;
    println!(
        "Refreshed {} feeds ({} failed), {} items cached",
        summary.feeds_refreshed, summary.feeds_failed, summary.items_cached
    );
    Ok(())
}
