//! Market intelligence endpoints. Thin wrappers over the orchestrator's
//! single `get_intelligence` entry point.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use tracing::error;

use crate::models::{IntelligenceReport, StockQuote};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct IntelligenceQuery {
    /// `?refresh=true` bypasses the report cache.
    #[serde(default)]
    pub refresh: bool,
}

/// Get the current intelligence report, served from cache while fresh.
///
/// # Route
/// - **Method**: GET
/// - **Path**: `/api/intelligence`
pub async fn get_intelligence(
    State(state): State<AppState>,
    Query(query): Query<IntelligenceQuery>,
) -> Result<Json<IntelligenceReport>, (StatusCode, String)> {
    let report = state
        .orchestrator
        .get_intelligence(query.refresh)
        .await
        .map_err(|e| {
            error!("Intelligence refresh failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok(Json((*report).clone()))
}

/// Force a full collection cycle regardless of cache freshness.
///
/// # Route
/// - **Method**: GET
/// - **Path**: `/api/intelligence/refresh`
pub async fn refresh_intelligence(
    State(state): State<AppState>,
) -> Result<Json<IntelligenceReport>, (StatusCode, String)> {
    let report = state.orchestrator.get_intelligence(true).await.map_err(|e| {
        error!("Forced intelligence refresh failed: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok(Json((*report).clone()))
}

/// Resolve quote data for the tickers currently trending in the report.
///
/// # Route
/// - **Method**: GET
/// - **Path**: `/api/stocks/trending`
pub async fn get_trending_quotes(
    State(state): State<AppState>,
) -> Result<Json<Vec<StockQuote>>, (StatusCode, String)> {
    let report = state.orchestrator.get_intelligence(false).await.map_err(|e| {
        error!("Intelligence refresh failed: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    let symbols: Vec<String> = report.trending_stocks.keys().cloned().collect();
    let quotes = state.financial.get_trending_stocks(&symbols).await;

    Ok(Json(quotes))
}
