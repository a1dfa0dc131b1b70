//! Reddit collector. Reads public subreddit hot listings as JSON; no API
//! key involved, so the client identifier in `collectors::USER_AGENT` is
//! the only courtesy we can extend.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::IntelError;
use crate::models::RedditPost;

const REDDIT_BASE_URL: &str = "https://www.reddit.com/r";

/// Page size of one hot listing read.
const PAGE_LIMIT: usize = 25;

/// Pause between subreddits; reddit throttles aggressive anonymous readers.
const SUBREDDIT_DELAY: Duration = Duration::from_secs(2);

/// `$` followed by 1-5 uppercase letters, the cashtag convention.
static CASHTAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$[A-Z]{1,5}\b").expect("valid cashtag regex"));

pub struct RedditCollector {
    client: Client,
}

impl RedditCollector {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetch every configured subreddit, highest-score posts first.
    ///
    /// A non-200 response or malformed body yields zero posts for that
    /// subreddit and never aborts the batch.
    pub async fn collect_all(&self, subreddits: &[String]) -> Vec<RedditPost> {
        let mut posts = Vec::new();

        for (i, subreddit) in subreddits.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(SUBREDDIT_DELAY).await;
            }
            match self.fetch_subreddit(subreddit).await {
                Ok(mut batch) => {
                    let mentions: usize = batch
                        .iter()
                        .map(|p| extract_stock_mentions(&p.title).len())
                        .sum();
                    debug!(
                        "Fetched {} posts ({} cashtag mentions) from r/{}",
                        batch.len(),
                        mentions,
                        subreddit
                    );
                    posts.append(&mut batch);
                }
                Err(e) => warn!("Failed to fetch r/{}: {}", subreddit, e),
            }
        }

        posts.sort_by(|a, b| b.score.cmp(&a.score));
        posts
    }

    async fn fetch_subreddit(&self, subreddit: &str) -> Result<Vec<RedditPost>, IntelError> {
        let url = format!("{}/{}/hot.json?limit={}", REDDIT_BASE_URL, subreddit, PAGE_LIMIT);

        let listing: Value = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(parse_listing(&listing, subreddit))
    }
}

/// Extract cashtag mentions (`$AAPL` style) from raw text, `$` stripped.
///
/// Stricter than the engine's extraction pass (it requires the `$`); meant
/// for callers that want an explicit mention list from a single post.
pub fn extract_stock_mentions(text: &str) -> Vec<String> {
    CASHTAG_RE
        .find_iter(text)
        .map(|m| m.as_str().trim_start_matches('$').to_string())
        .collect()
}

/// Pull normalized posts out of a reddit listing body. Missing fields
/// default rather than fail; the upstream listing already deduplicates.
fn parse_listing(listing: &Value, subreddit: &str) -> Vec<RedditPost> {
    let children = match listing["data"]["children"].as_array() {
        Some(children) => children,
        None => return Vec::new(),
    };

    children
        .iter()
        .take(PAGE_LIMIT)
        .filter_map(|child| child.get("data"))
        .map(|data| RedditPost {
            title: data["title"].as_str().unwrap_or_default().to_string(),
            url: data["url"].as_str().unwrap_or_default().to_string(),
            selftext: data["selftext"].as_str().unwrap_or_default().to_string(),
            score: data["score"].as_i64().unwrap_or(0),
            num_comments: data["num_comments"].as_i64().unwrap_or(0),
            created_utc: data["created_utc"].as_f64().unwrap_or(0.0),
            subreddit: subreddit.to_string(),
            permalink: format!(
                "https://reddit.com{}",
                data["permalink"].as_str().unwrap_or_default()
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_hot_listing() {
        let listing = json!({
            "data": { "children": [
                { "data": {
                    "title": "$GME to the moon",
                    "url": "https://example.com/post",
                    "selftext": "diamond hands",
                    "score": 123,
                    "num_comments": 45,
                    "created_utc": 1750000000.0,
                    "permalink": "/r/stocks/comments/abc/gme/"
                }},
                { "data": { "title": "minimal post" } }
            ]}
        });

        let posts = parse_listing(&listing, "stocks");

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].title, "$GME to the moon");
        assert_eq!(posts[0].score, 123);
        assert_eq!(posts[0].subreddit, "stocks");
        assert_eq!(posts[0].permalink, "https://reddit.com/r/stocks/comments/abc/gme/");
        assert_eq!(posts[1].score, 0);
        assert_eq!(posts[1].selftext, "");
    }

    #[test]
    fn malformed_listing_yields_empty() {
        let posts = parse_listing(&json!({"error": 429}), "stocks");
        assert!(posts.is_empty());
    }

    #[test]
    fn cashtag_extraction_requires_dollar_prefix() {
        let mentions = extract_stock_mentions("$TSLA and AAPL, also $msft and $NVDA");
        assert_eq!(mentions, vec!["TSLA", "NVDA"]);
    }
}
