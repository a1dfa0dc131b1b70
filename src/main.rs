//! # Market Intelligence Server
//!
//! Gathers short-lived market signals (RSS news, Reddit posts, market-index
//! quotes) from free external sources, aggregates them into a single
//! intelligence report, and serves it over HTTP from a freshness-gated cache.
//!
//! ## Architecture
//! - `collectors`: one fetcher per external source; each degrades to an
//!   empty result on failure instead of aborting a collection cycle
//! - `engine`: pure sentiment scoring, ticker extraction, and aggregation
//! - `orchestrator`: concurrent fan-out across sources plus the TTL cache
//!   behind the single `get_intelligence(force_refresh)` entry point
//! - `server` / `routes`: the axum shell that renders the report as JSON
//!
//! ## Environment Setup
//! All configuration is optional; sensible free-tier defaults apply.
//! ```bash
//! cp .env.example .env
//! # Edit .env to override feeds, subreddits, or cache TTLs
//! ```
//!
//! ## Running the Server
//! ```bash
//! cargo run
//! ```
//!
//! The server starts on `http://0.0.0.0:5000` by default; verify with
//! `curl http://localhost:5000/ping`.

mod collectors;
mod config;
mod engine;
mod error;
mod models;
mod orchestrator;
mod routes;
mod server;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .init();

    tracing::info!("Starting Market Intelligence Server...");
    tracing::info!(
        "Package: {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    // Start the HTTP server - this will run indefinitely
    server::start().await;
}
