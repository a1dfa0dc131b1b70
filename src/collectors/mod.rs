//! Source collectors. Each one turns a single upstream endpoint into a
//! normalized record list and degrades to an empty list on failure; a
//! broken source never aborts a collection cycle.

pub mod financial;
pub mod news;
pub mod reddit;

pub use financial::FinancialCollector;
pub use news::NewsCollector;
pub use reddit::RedditCollector;

use reqwest::Client;
use std::time::Duration;

/// Descriptive identifier sent with every upstream request.
pub const USER_AGENT: &str = "intel-server/0.1 (market-intelligence; educational)";

/// HTTP client shared by all collectors. The timeout is the per-call
/// protection against hung upstreams; a timed-out call is treated the same
/// as any other source failure.
pub fn http_client() -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to create HTTP client")
}
