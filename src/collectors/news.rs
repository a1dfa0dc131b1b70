//! RSS news collector.

use chrono::{DateTime, Utc};
use reqwest::Client;
use rss::Channel;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::IntelError;
use crate::models::NewsArticle;

/// At most this many articles are kept per feed.
const MAX_PER_FEED: usize = 20;

/// Pause between consecutive feed fetches so a single host never sees a
/// burst from us. Cross-source parallelism is the orchestrator's job.
const FEED_DELAY: Duration = Duration::from_secs(1);

pub struct NewsCollector {
    client: Client,
}

impl NewsCollector {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetch every configured feed, newest articles first.
    ///
    /// Feeds are fetched sequentially with a short pause in between; a
    /// network or parse failure for one feed contributes zero articles and
    /// never aborts the batch.
    pub async fn collect_all(&self, feed_urls: &[String]) -> Vec<NewsArticle> {
        let mut articles = Vec::new();

        for (i, url) in feed_urls.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(FEED_DELAY).await;
            }
            match self.fetch_feed(url).await {
                Ok(mut batch) => {
                    debug!("Fetched {} articles from {}", batch.len(), url);
                    articles.append(&mut batch);
                }
                Err(e) => warn!("Failed to fetch RSS feed {}: {}", url, e),
            }
        }

        articles.sort_by(|a, b| b.published.cmp(&a.published));
        articles
    }

    async fn fetch_feed(&self, url: &str) -> Result<Vec<NewsArticle>, IntelError> {
        let bytes = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let channel = Channel::read_from(&bytes[..])?;
        Ok(parse_channel(&channel, url))
    }
}

/// Turn a parsed channel into normalized articles, capped per feed.
fn parse_channel(channel: &Channel, feed_url: &str) -> Vec<NewsArticle> {
    let source = if channel.title().is_empty() {
        feed_url
    } else {
        channel.title()
    };

    channel
        .items()
        .iter()
        .take(MAX_PER_FEED)
        .map(|item| NewsArticle {
            title: item.title().unwrap_or_default().to_string(),
            link: item.link().unwrap_or_default().to_string(),
            summary: item.description().unwrap_or_default().to_string(),
            published: parse_pub_date(item.pub_date()),
            source: source.to_string(),
        })
        .collect()
}

/// RSS feeds mostly use RFC 2822 dates, some use RFC 3339. Anything else
/// gets the fetch time so the article stays sortable instead of dropped.
fn parse_pub_date(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(|s| {
        DateTime::parse_from_rfc2822(s)
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(s).ok())
    })
    .map(|dt| dt.with_timezone(&Utc))
    .unwrap_or_else(Utc::now)
}
