//! Swarm orchestrator: fans collection out to all sources concurrently and
//! serves the aggregated report from a freshness-gated cache.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;
use tracing::{info, warn};

use crate::collectors::{FinancialCollector, NewsCollector, RedditCollector};
use crate::engine;
use crate::error::IntelError;
use crate::models::{IntelligenceReport, NewsArticle, RedditPost, StockQuote};

/// One collection entry point per source. Implementations are expected to
/// degrade to an empty list on failure rather than error out; a single
/// broken source must never fail a refresh cycle.
#[async_trait]
pub trait IntelSources: Send + Sync {
    async fn collect_news(&self) -> Vec<NewsArticle>;
    async fn collect_reddit(&self) -> Vec<RedditPost>;
    async fn collect_market_indices(&self) -> Vec<StockQuote>;
}

/// Production sources: the three collectors plus their configured inputs.
pub struct LiveSources {
    pub news: NewsCollector,
    pub reddit: RedditCollector,
    pub financial: Arc<FinancialCollector>,
    pub rss_feeds: Vec<String>,
    pub subreddits: Vec<String>,
    pub index_symbols: Vec<String>,
}

#[async_trait]
impl IntelSources for LiveSources {
    async fn collect_news(&self) -> Vec<NewsArticle> {
        self.news.collect_all(&self.rss_feeds).await
    }

    async fn collect_reddit(&self) -> Vec<RedditPost> {
        self.reddit.collect_all(&self.subreddits).await
    }

    async fn collect_market_indices(&self) -> Vec<StockQuote> {
        self.financial.get_market_indices(&self.index_symbols).await
    }
}

struct CacheEntry {
    report: Arc<IntelligenceReport>,
    captured_at: DateTime<Utc>,
}

/// Owns the report cache and the single `get_intelligence` entry point.
///
/// Cache lifecycle: empty until the first successful refresh, fresh while
/// younger than the TTL, stale after. A stale entry keeps being served to
/// readers while a refresh is in flight and is replaced atomically.
pub struct SwarmOrchestrator {
    sources: Arc<dyn IntelSources>,
    cache: RwLock<Option<CacheEntry>>,
    /// Serializes refresh cycles so concurrent callers coalesce onto one
    /// upstream fan-out instead of each triggering their own.
    refresh_guard: Mutex<()>,
    cache_ttl: Duration,
    source_timeout: Duration,
}

impl SwarmOrchestrator {
    pub fn new(
        sources: Arc<dyn IntelSources>,
        cache_ttl: Duration,
        source_timeout: Duration,
    ) -> Self {
        Self {
            sources,
            cache: RwLock::new(None),
            refresh_guard: Mutex::new(()),
            cache_ttl,
            source_timeout,
        }
    }

    /// Return the cached report while it is fresh, otherwise run a refresh
    /// cycle. `force_refresh` skips the freshness check. The first call on
    /// an empty cache always refreshes.
    pub async fn get_intelligence(
        &self,
        force_refresh: bool,
    ) -> Result<Arc<IntelligenceReport>, IntelError> {
        if !force_refresh {
            if let Some(report) = self.cached().await {
                return Ok(report);
            }
        }
        self.refresh().await
    }

    /// The cached report, if present and younger than the TTL.
    async fn cached(&self) -> Option<Arc<IntelligenceReport>> {
        let cache = self.cache.read().await;
        cache.as_ref().and_then(|entry| {
            let age = Utc::now().signed_duration_since(entry.captured_at);
            if age.num_seconds() >= 0 && (age.num_seconds() as u64) < self.cache_ttl.as_secs() {
                Some(Arc::clone(&entry.report))
            } else {
                None
            }
        })
    }

    /// Run one full collection + aggregation cycle and replace the cache.
    ///
    /// Callers that were queued behind an in-flight refresh pick up its
    /// result instead of starting another upstream fan-out. An aggregation
    /// failure leaves the previous cache entry in place and propagates.
    async fn refresh(&self) -> Result<Arc<IntelligenceReport>, IntelError> {
        let started = Utc::now();
        let _guard = self.refresh_guard.lock().await;

        // Someone else finished a refresh while we waited for the guard.
        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.as_ref() {
                if entry.captured_at >= started {
                    return Ok(Arc::clone(&entry.report));
                }
            }
        }

        info!("Starting intelligence gathering");

        let (news, reddit, indices) = tokio::join!(
            self.collect_or_empty("news", self.sources.collect_news()),
            self.collect_or_empty("reddit", self.sources.collect_reddit()),
            self.collect_or_empty("financial", self.sources.collect_market_indices()),
        );

        info!(
            "Collected {} news articles, {} reddit posts, {} market indices",
            news.len(),
            reddit.len(),
            indices.len()
        );

        let mut report = engine::aggregate(news, reddit, indices)?;

        let mut cache = self.cache.write().await;
        // Capture timestamps strictly increase, even across fast refreshes.
        let mut captured_at = Utc::now();
        if let Some(entry) = cache.as_ref() {
            if captured_at <= entry.captured_at {
                captured_at = entry.captured_at + ChronoDuration::milliseconds(1);
            }
        }
        report.timestamp = captured_at;

        let report = Arc::new(report);
        *cache = Some(CacheEntry {
            report: Arc::clone(&report),
            captured_at,
        });

        Ok(report)
    }

    /// Bound one source's collection pass; a timed-out source contributes
    /// an empty result for this cycle, same as any other source failure.
    async fn collect_or_empty<T>(
        &self,
        source: &str,
        collect: impl std::future::Future<Output = Vec<T>>,
    ) -> Vec<T> {
        match timeout(self.source_timeout, collect).await {
            Ok(records) => records,
            Err(_) => {
                warn!("Source {} timed out after {:?}", source, self.source_timeout);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counting stub; reddit optionally hangs to simulate a dead upstream.
    struct StubSources {
        news_calls: AtomicUsize,
        reddit_calls: AtomicUsize,
        market_calls: AtomicUsize,
        reddit_hangs: bool,
    }

    impl StubSources {
        fn new(reddit_hangs: bool) -> Self {
            Self {
                news_calls: AtomicUsize::new(0),
                reddit_calls: AtomicUsize::new(0),
                market_calls: AtomicUsize::new(0),
                reddit_hangs,
            }
        }

        fn total_calls(&self) -> usize {
            self.news_calls.load(Ordering::SeqCst)
                + self.reddit_calls.load(Ordering::SeqCst)
                + self.market_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IntelSources for StubSources {
        async fn collect_news(&self) -> Vec<NewsArticle> {
            self.news_calls.fetch_add(1, Ordering::SeqCst);
            // Yield long enough for queued callers to reach the refresh
            // guard, so the coalescing test observes overlapping cycles.
            tokio::time::sleep(Duration::from_millis(20)).await;
            vec![NewsArticle {
                title: "$AAPL hits new high".to_string(),
                link: "https://example.com/a".to_string(),
                summary: "shares surge on earnings".to_string(),
                published: Utc::now(),
                source: "stub".to_string(),
            }]
        }

        async fn collect_reddit(&self) -> Vec<RedditPost> {
            self.reddit_calls.fetch_add(1, Ordering::SeqCst);
            if self.reddit_hangs {
                std::future::pending::<()>().await;
            }
            vec![RedditPost {
                title: "$AAPL to the moon".to_string(),
                url: String::new(),
                selftext: String::new(),
                score: 10,
                num_comments: 1,
                created_utc: 0.0,
                subreddit: "stocks".to_string(),
                permalink: String::new(),
            }]
        }

        async fn collect_market_indices(&self) -> Vec<StockQuote> {
            self.market_calls.fetch_add(1, Ordering::SeqCst);
            Vec::new()
        }
    }

    fn orchestrator(sources: Arc<StubSources>, ttl_secs: u64) -> SwarmOrchestrator {
        SwarmOrchestrator::new(sources, Duration::from_secs(ttl_secs), Duration::from_millis(200))
    }

    #[tokio::test]
    async fn first_call_triggers_implicit_refresh() {
        let sources = Arc::new(StubSources::new(false));
        let orch = orchestrator(Arc::clone(&sources), 600);

        let report = orch.get_intelligence(false).await.unwrap();

        assert_eq!(sources.total_calls(), 3);
        assert_eq!(report.trending_stocks["AAPL"], 2);
    }

    #[tokio::test]
    async fn fresh_cache_serves_same_report_with_zero_calls() {
        let sources = Arc::new(StubSources::new(false));
        let orch = orchestrator(Arc::clone(&sources), 600);

        let first = orch.get_intelligence(false).await.unwrap();
        let second = orch.get_intelligence(false).await.unwrap();

        assert_eq!(sources.total_calls(), 3);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn force_refresh_recollects_and_advances_timestamp() {
        let sources = Arc::new(StubSources::new(false));
        let orch = orchestrator(Arc::clone(&sources), 600);

        let first = orch.get_intelligence(false).await.unwrap();
        let second = orch.get_intelligence(true).await.unwrap();

        assert_eq!(sources.total_calls(), 6);
        assert!(second.timestamp > first.timestamp);
    }

    #[tokio::test]
    async fn expired_cache_refreshes_on_plain_read() {
        let sources = Arc::new(StubSources::new(false));
        let orch = orchestrator(Arc::clone(&sources), 0);

        orch.get_intelligence(false).await.unwrap();
        orch.get_intelligence(false).await.unwrap();

        assert_eq!(sources.total_calls(), 6);
    }

    #[tokio::test]
    async fn hung_source_degrades_instead_of_failing() {
        let sources = Arc::new(StubSources::new(true));
        let orch = orchestrator(Arc::clone(&sources), 600);

        let report = orch.get_intelligence(false).await.unwrap();

        // Reddit timed out; news still contributed.
        assert!(report.top_reddit.is_empty());
        assert_eq!(report.top_news.len(), 1);
        assert_eq!(report.reddit_sentiment.positive, 0);
        // News summary "shares surge on earnings" carries one hit.
        assert_eq!(report.news_sentiment.positive, 1);
    }

    #[tokio::test]
    async fn concurrent_force_refreshes_coalesce() {
        let sources = Arc::new(StubSources::new(false));
        let orch = Arc::new(orchestrator(Arc::clone(&sources), 600));

        let a = {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move { orch.get_intelligence(true).await.unwrap() })
        };
        let b = {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move { orch.get_intelligence(true).await.unwrap() })
        };
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        // Whichever task lost the race to the guard reuses the winner's
        // cycle; only one upstream fan-out ran.
        assert_eq!(sources.total_calls(), 3);
        assert!(Arc::ptr_eq(&a, &b));
    }
}
