//! Shared data shapes for collected records and the aggregated report.
//!
//! Field names follow the wire format served by `/api/intelligence`; the
//! front end depends on them, so renames here are breaking changes.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One normalized news article from an RSS feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub link: String,
    pub summary: String,
    /// Publication time; falls back to fetch time when the feed's
    /// `pubDate` is missing or unparsable, so every article stays sortable.
    pub published: DateTime<Utc>,
    pub source: String,
}

/// One normalized Reddit post from a subreddit hot listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPost {
    pub title: String,
    pub url: String,
    pub selftext: String,
    pub score: i64,
    pub num_comments: i64,
    pub created_utc: f64,
    pub subreddit: String,
    pub permalink: String,
}

/// A market quote for a single symbol, derived from the latest two
/// trading sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockQuote {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    /// Rounded to 2 decimals; zero when the previous close is <= 0.
    pub change_percent: f64,
    pub volume: u64,
    pub market_cap: u64,
    pub sector: String,
    pub industry: String,
    pub timestamp: DateTime<Utc>,
}

/// Keyword-hit counters for one or more pieces of text.
///
/// `neutral` is 1 exactly when a text matched zero polarity keywords, so
/// summing counts over many texts makes `neutral` a count of *texts* while
/// `positive`/`negative` count keyword hits. That asymmetry is part of the
/// served format and is kept as-is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentCounts {
    pub positive: u32,
    pub negative: u32,
    pub neutral: u32,
}

impl SentimentCounts {
    pub fn add(&mut self, other: SentimentCounts) {
        self.positive += other.positive;
        self.negative += other.negative;
        self.neutral += other.neutral;
    }
}

/// Per-ticker sentiment summary derived from every record mentioning it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSentiment {
    pub positive: u32,
    pub negative: u32,
    pub neutral: u32,
    /// positive / (positive + negative) * 100, rounded to 2 decimals;
    /// exactly 50.0 when there are no polarity hits at all.
    pub pct_positive: f64,
}

/// The aggregate intelligence snapshot served to clients.
///
/// Replaced wholesale by each refresh cycle; never mutated field-by-field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntelligenceReport {
    pub timestamp: DateTime<Utc>,
    pub news_sentiment: SentimentCounts,
    pub reddit_sentiment: SentimentCounts,
    pub per_ticker_sentiment: HashMap<String, TickerSentiment>,
    /// Top 20 mentioned tickers, descending by count, ties broken by
    /// first appearance in the combined news+reddit stream.
    pub trending_stocks: IndexMap<String, u64>,
    pub top_news: Vec<NewsArticle>,
    pub top_reddit: Vec<RedditPost>,
    pub market_indices: Vec<StockQuote>,
    pub summary: String,
}
