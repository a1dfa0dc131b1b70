//! Financial collector. Free Yahoo endpoints, no API key.
//!
//! Quotes are derived from the last five daily sessions of the chart API;
//! company profile fields are enriched best-effort from quoteSummary and
//! default to empty when that endpoint is unavailable.

use chrono::Utc;
use dashmap::DashMap;
use reqwest::Client;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::IntelError;
use crate::models::StockQuote;

const CHART_API: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const QUOTE_SUMMARY_API: &str = "https://query1.finance.yahoo.com/v10/finance/quoteSummary";

/// Upper bound on symbols resolved by one `get_trending_stocks` call.
const TRENDING_LIMIT: usize = 20;

struct CachedQuote {
    quote: StockQuote,
    fetched_at: Instant,
}

/// Per-symbol quote fetcher with a component-local TTL cache.
///
/// The cache here is independent of the orchestrator's report cache: a
/// symbol appearing in both the index basket and the trending list costs
/// one upstream call per TTL window, not one per report refresh.
pub struct FinancialCollector {
    client: Client,
    cache: DashMap<String, CachedQuote>,
    cache_ttl: Duration,
}

impl FinancialCollector {
    pub fn new(client: Client, cache_ttl: Duration) -> Self {
        Self {
            client,
            cache: DashMap::new(),
            cache_ttl,
        }
    }

    /// Latest quote for one symbol, or `None` when the upstream has
    /// nothing usable. Served from the local cache within its TTL.
    pub async fn get_stock_data(&self, symbol: &str) -> Option<StockQuote> {
        if let Some(entry) = self.cache.get(symbol) {
            if entry.fetched_at.elapsed() < self.cache_ttl {
                return Some(entry.quote.clone());
            }
        }

        match self.fetch_quote(symbol).await {
            Ok(Some(quote)) => {
                self.cache.insert(
                    symbol.to_string(),
                    CachedQuote {
                        quote: quote.clone(),
                        fetched_at: Instant::now(),
                    },
                );
                Some(quote)
            }
            Ok(None) => {
                debug!("No chart data for {}", symbol);
                None
            }
            Err(e) => {
                warn!("Failed to fetch quote for {}: {}", symbol, e);
                None
            }
        }
    }

    /// Quotes for the broad-market index basket, fetched concurrently;
    /// symbols that fail are skipped.
    pub async fn get_market_indices(&self, symbols: &[String]) -> Vec<StockQuote> {
        let tasks: Vec<_> = symbols.iter().map(|s| self.get_stock_data(s)).collect();
        futures::future::join_all(tasks)
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// Quotes for up to the first 20 requested symbols.
    pub async fn get_trending_stocks(&self, symbols: &[String]) -> Vec<StockQuote> {
        let tasks: Vec<_> = symbols
            .iter()
            .take(TRENDING_LIMIT)
            .map(|s| self.get_stock_data(s))
            .collect();
        futures::future::join_all(tasks)
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Option<StockQuote>, IntelError> {
        let url = format!("{}/{}?range=5d&interval=1d", CHART_API, symbol);
        let body: Value = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut quote = match parse_chart(symbol, &body) {
            Some(quote) => quote,
            None => return Ok(None),
        };

        // Profile enrichment is best-effort; the quote stands without it.
        if let Err(e) = self.enrich_profile(&mut quote).await {
            debug!("No profile data for {}: {}", symbol, e);
        }

        Ok(Some(quote))
    }

    async fn enrich_profile(&self, quote: &mut StockQuote) -> Result<(), IntelError> {
        let url = format!(
            "{}/{}?modules=price,assetProfile",
            QUOTE_SUMMARY_API, quote.symbol
        );
        let body: Value = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        apply_profile(quote, &body);
        Ok(())
    }
}

/// Build a quote from a chart API response: change against the previous
/// session's close, or zero when only one session is available.
fn parse_chart(symbol: &str, body: &Value) -> Option<StockQuote> {
    let result = body["chart"]["result"].get(0)?;
    let meta = &result["meta"];
    let indicators = &result["indicators"]["quote"][0];

    // Sessions still in progress report null closes; skip them.
    let closes: Vec<f64> = indicators["close"]
        .as_array()?
        .iter()
        .filter_map(|v| v.as_f64())
        .collect();
    let latest = *closes.last()?;
    let previous = if closes.len() > 1 {
        closes[closes.len() - 2]
    } else {
        latest
    };

    let change = latest - previous;
    let change_percent = if previous > 0.0 {
        round2(change / previous * 100.0)
    } else {
        0.0
    };

    let volume = indicators["volume"]
        .as_array()
        .and_then(|vols| vols.iter().rev().find_map(|v| v.as_u64()))
        .unwrap_or(0);

    let name = meta["longName"]
        .as_str()
        .or_else(|| meta["shortName"].as_str())
        .unwrap_or(symbol)
        .to_string();

    Some(StockQuote {
        symbol: symbol.to_string(),
        name,
        price: latest,
        change,
        change_percent,
        volume,
        market_cap: 0,
        sector: String::new(),
        industry: String::new(),
        timestamp: Utc::now(),
    })
}

fn apply_profile(quote: &mut StockQuote, body: &Value) {
    let result = &body["quoteSummary"]["result"][0];

    if let Some(cap) = result["price"]["marketCap"]["raw"].as_u64() {
        quote.market_cap = cap;
    }
    if let Some(name) = result["price"]["longName"].as_str() {
        quote.name = name.to_string();
    }
    if let Some(sector) = result["assetProfile"]["sector"].as_str() {
        quote.sector = sector.to_string();
    }
    if let Some(industry) = result["assetProfile"]["industry"].as_str() {
        quote.industry = industry.to_string();
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
