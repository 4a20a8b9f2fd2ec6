//! Bittrex v3 stream client - Entry Point
//!
//! Connects the configured feed sessions to the Bittrex push hub and logs
//! the events they deliver until Ctrl-C or every session has ended.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Bittrex v3 market data stream client
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via BITTREX_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Skip the REST market check before streaming
    #[arg(long)]
    skip_preflight: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize TLS crypto provider (must be before any hub connections)
    bittrex_ws::init_crypto();

    let args = Args::parse();

    bittrex_telemetry::init_logging()?;

    info!("Starting bittrex-stream v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > BITTREX_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("BITTREX_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");

    let mut config = bittrex_stream::AppConfig::from_file(&config_path)?;
    if args.skip_preflight {
        config.rest.preflight = false;
    }
    info!(
        host = %config.hub.host,
        sessions = config.sessions.len(),
        "Configuration loaded"
    );

    let credentials = bittrex_stream::config::credentials_from_env();
    let app = bittrex_stream::Application::new(config, credentials)?;

    let client = app.rest_client()?;
    app.run_preflight(&client).await?;

    let summary = app.run().await?;
    for (session, termination) in &summary.terminations {
        info!(%session, reason = termination.reason(), "Session ended");
    }
    info!(events = ?summary.events, "Done");

    Ok(())
}
