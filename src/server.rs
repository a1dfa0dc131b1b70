//! # Server Module
//!
//! HTTP server setup and route configuration for the intelligence server.

use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::collectors::{self, FinancialCollector, NewsCollector, RedditCollector};
use crate::config::Config;
use crate::orchestrator::{LiveSources, SwarmOrchestrator};
use crate::routes::{health, intelligence};

/// Application state shared across all route handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<SwarmOrchestrator>,
    pub financial: Arc<FinancialCollector>,
}

/// Starts the market intelligence HTTP server.
///
/// Builds the collectors and orchestrator from environment configuration,
/// kicks off a background warm-up refresh so the first dashboard hit
/// doesn't pay the full collection latency, then serves until terminated.
pub async fn start() {
    let config = Config::from_env().expect("Failed to load configuration from environment");

    let client = collectors::http_client();
    let financial = Arc::new(FinancialCollector::new(
        client.clone(),
        Duration::from_secs(config.quote_cache_ttl_secs),
    ));

    let sources = Arc::new(LiveSources {
        news: NewsCollector::new(client.clone()),
        reddit: RedditCollector::new(client),
        financial: Arc::clone(&financial),
        rss_feeds: config.rss_feeds.clone(),
        subreddits: config.subreddits.clone(),
        index_symbols: config.index_symbols.clone(),
    });

    let orchestrator = Arc::new(SwarmOrchestrator::new(
        sources,
        Duration::from_secs(config.cache_ttl_secs),
        Duration::from_secs(config.source_timeout_secs),
    ));

    // Warm the cache in the background; a failure here just means the
    // first request triggers the implicit refresh instead.
    {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            if let Err(e) = orchestrator.get_intelligence(true).await {
                tracing::warn!("Initial intelligence gathering failed: {}", e);
            }
        });
    }

    let app_state = AppState {
        orchestrator,
        financial,
    };

    let app = Router::new()
        .route("/ping", get(health::ping))
        .route("/api/health", get(health::health))
        .route("/api/intelligence", get(intelligence::get_intelligence))
        .route(
            "/api/intelligence/refresh",
            get(intelligence::refresh_intelligence),
        )
        .route("/api/stocks/trending", get(intelligence::get_trending_quotes))
        .layer(
            ServiceBuilder::new().layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods([axum::http::Method::GET, axum::http::Method::OPTIONS])
                    .allow_headers([
                        axum::http::header::ORIGIN,
                        axum::http::header::CONTENT_TYPE,
                        axum::http::header::ACCEPT,
                    ]),
            ),
        )
        .with_state(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address - port may already be in use");

    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Health check available at http://{}/ping", addr);
    tracing::info!("Intelligence API available at http://{}/api/intelligence", addr);

    axum::serve(listener, app).await.unwrap();
}
