//! Dex API - Main entry point.
//!
//! Read-only HTTP API serving DEX market data (pools, swaps, holders, ticks)
//! from a PostgreSQL database populated by an external indexer.

use std::sync::Arc;

use clap::Parser;
use dex_api::config::Config;
use dex_api::db::{self, SchemaResolver};
use dex_api::http::{self, AppState};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env before parsing so database credentials can live there.
    dotenvy::dotenv().ok();
    let config = Config::parse();

    init_tracing(&config);

    info!("Starting Dex API v{}", env!("CARGO_PKG_VERSION"));

    // The pool connects lazily: a down database delays queries, not startup.
    let pool = db::pool::connect(&config)?;

    // Reflect the schema once; missing tables stay unbound and their
    // endpoints answer with table-not-found payloads.
    let tables = SchemaResolver::resolve(&pool).await;

    let state = Arc::new(AppState::new(pool.clone(), tables));

    let result = http::serve(state, &config.bind_addr()).await;

    info!("Closing database connection pool");
    pool.close().await;

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
