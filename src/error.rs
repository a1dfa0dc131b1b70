//! Error types for the intelligence engine and orchestrator.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntelError {
    /// The aggregation pass itself failed. Fatal to the current refresh
    /// cycle; the previously cached report is left in place.
    #[error("aggregation failed: {0}")]
    Aggregation(String),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed parse failed: {0}")]
    Feed(#[from] rss::Error),
}
