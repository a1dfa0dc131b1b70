//! Configuration module for environment variables and application settings

use anyhow::Result;
use std::env;
use url::Url;

/// Default RSS feeds, all free/no-key business news sources.
const DEFAULT_RSS_FEEDS: &[&str] = &[
    "https://feeds.finance.yahoo.com/rss/2.0/headline",
    "https://www.cnbc.com/id/100003114/device/rss/rss.html",
    "https://feeds.reuters.com/reuters/businessNews",
    "https://rss.cnn.com/rss/money_latest.rss",
];

const DEFAULT_SUBREDDITS: &[&str] = &["stocks", "investing", "StockMarket", "wallstreetbets"];

/// S&P 500, Dow, Nasdaq, Russell 2000.
const DEFAULT_INDEX_SYMBOLS: &[&str] = &["^GSPC", "^DJI", "^IXIC", "^RUT"];

#[derive(Debug, Clone)]
pub struct Config {
    /// RSS feed URLs for the news collector.
    pub rss_feeds: Vec<String>,

    /// Subreddit names for the reddit collector.
    pub subreddits: Vec<String>,

    /// Broad-market index basket for the financial collector.
    pub index_symbols: Vec<String>,

    /// Report cache TTL in seconds.
    pub cache_ttl_secs: u64,

    /// Per-symbol quote cache TTL in seconds (financial collector local).
    pub quote_cache_ttl_secs: u64,

    /// Upper bound on a single source's collection pass during a refresh.
    pub source_timeout_secs: u64,

    /// Server configuration
    pub server: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables, falling back to the
    /// defaults above for anything unset.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            rss_feeds: env_list("RSS_FEEDS", DEFAULT_RSS_FEEDS)
                .into_iter()
                .filter(|u| match Url::parse(u) {
                    Ok(_) => true,
                    Err(e) => {
                        tracing::warn!("Ignoring invalid RSS feed url {}: {}", u, e);
                        false
                    }
                })
                .collect(),

            subreddits: env_list("REDDIT_SUBREDDITS", DEFAULT_SUBREDDITS),

            index_symbols: env_list("MARKET_INDEX_SYMBOLS", DEFAULT_INDEX_SYMBOLS),

            cache_ttl_secs: env_parsed("CACHE_TTL_SECS", 600),

            quote_cache_ttl_secs: env_parsed("QUOTE_CACHE_TTL_SECS", 300),

            source_timeout_secs: env_parsed("SOURCE_TIMEOUT_SECS", 30),

            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                // PORT wins over SERVER_PORT for PaaS deployments
                port: env::var("PORT")
                    .ok()
                    .or_else(|| env::var("SERVER_PORT").ok())
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(5000),
            },
        })
    }
}

fn env_list(key: &str, defaults: &[&str]) -> Vec<String> {
    match env::var(key) {
        Ok(raw) => raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Err(_) => defaults.iter().map(|s| s.to_string()).collect(),
    }
}

fn env_parsed(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_field() {
        let config = Config::from_env().unwrap();
        assert_eq!(config.subreddits.len(), 4);
        assert_eq!(config.index_symbols, vec!["^GSPC", "^DJI", "^IXIC", "^RUT"]);
        assert_eq!(config.cache_ttl_secs, 600);
        assert_eq!(config.quote_cache_ttl_secs, 300);
        assert!(!config.rss_feeds.is_empty());
    }
}
