//! Intelligence engine: sentiment scoring, ticker extraction, and the
//! aggregation pass that turns raw collector output into one report.
//!
//! Everything in this module is pure. The scoring is deliberately naive
//! keyword matching; it lives behind `score_sentiment` so a smarter
//! classifier can replace it without touching the aggregation structure.

use chrono::Utc;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::error::IntelError;
use crate::models::{
    IntelligenceReport, NewsArticle, RedditPost, SentimentCounts, StockQuote, TickerSentiment,
};

const POSITIVE_WORDS: &[&str] = &[
    "bull", "bullish", "up", "rise", "gain", "profit", "buy", "moon", "rocket", "surge",
];
const NEGATIVE_WORDS: &[&str] = &[
    "bear", "bearish", "down", "fall", "loss", "crash", "sell", "dump", "plunge", "drop",
];

/// Matches 1-5 uppercase letters, with or without a leading `$`.
static TICKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?[A-Z]{1,5}\b").expect("valid ticker regex"));

/// Score a piece of text against the fixed keyword lists.
///
/// Matching is substring containment, not word-boundary matching, so a
/// keyword inside a longer word still counts ("update" hits "up"). Each
/// keyword counts at most once per text. `neutral` is 1 only when neither
/// list matched at all.
pub fn score_sentiment(text: &str) -> SentimentCounts {
    let lower = text.to_lowercase();
    let positive = POSITIVE_WORDS.iter().filter(|w| lower.contains(*w)).count() as u32;
    let negative = NEGATIVE_WORDS.iter().filter(|w| lower.contains(*w)).count() as u32;

    SentimentCounts {
        positive,
        negative,
        neutral: if positive == 0 && negative == 0 { 1 } else { 0 },
    }
}

/// Extract candidate ticker symbols from text, `$` stripped, in order of
/// appearance (duplicates included so callers can count mentions).
pub fn extract_symbols(text: &str) -> Vec<String> {
    TICKER_RE
        .find_iter(text)
        .map(|m| m.as_str().trim_start_matches('$').to_uppercase())
        .filter(|s| s.len() <= 5)
        .collect()
}

fn news_text(article: &NewsArticle) -> String {
    format!("{} {}", article.title, article.summary)
}

fn reddit_text(post: &RedditPost) -> String {
    format!("{} {}", post.title, post.selftext)
}

/// Count ticker mentions across the combined news+reddit stream and keep
/// the top 20, descending by count. Ties keep first-seen order.
pub fn tally_symbol_mentions(
    news: &[NewsArticle],
    posts: &[RedditPost],
) -> IndexMap<String, u64> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    let mut first_seen: Vec<String> = Vec::new();

    let texts = news
        .iter()
        .map(news_text)
        .chain(posts.iter().map(reddit_text));
    for text in texts {
        for symbol in extract_symbols(&text) {
            if !counts.contains_key(&symbol) {
                first_seen.push(symbol.clone());
            }
            *counts.entry(symbol).or_insert(0) += 1;
        }
    }

    // Stable sort preserves first-seen order among equal counts.
    let mut ranked = first_seen;
    ranked.sort_by_key(|s| std::cmp::Reverse(counts[s]));
    ranked
        .into_iter()
        .take(20)
        .map(|s| {
            let n = counts[&s];
            (s, n)
        })
        .collect()
}

/// Per-ticker sentiment with full fan-out: a record mentioning three
/// tickers contributes its whole sentiment to all three.
pub fn per_ticker_sentiment(
    news: &[NewsArticle],
    posts: &[RedditPost],
) -> HashMap<String, TickerSentiment> {
    let mut tallies: HashMap<String, SentimentCounts> = HashMap::new();

    let texts = news
        .iter()
        .map(news_text)
        .chain(posts.iter().map(reddit_text));
    for text in texts {
        let symbols = extract_symbols(&text);
        if symbols.is_empty() {
            continue;
        }
        let sentiment = score_sentiment(&text);
        for symbol in symbols {
            tallies.entry(symbol).or_default().add(sentiment);
        }
    }

    tallies
        .into_iter()
        .map(|(symbol, counts)| {
            let total = counts.positive + counts.negative;
            let pct_positive = if total > 0 {
                round2(counts.positive as f64 / total as f64 * 100.0)
            } else {
                50.0
            };
            (
                symbol,
                TickerSentiment {
                    positive: counts.positive,
                    negative: counts.negative,
                    neutral: counts.neutral,
                    pct_positive,
                },
            )
        })
        .collect()
}

/// Merge the three sources' output into one report.
///
/// The `Result` return is the orchestrator's contract: an error here aborts
/// the refresh cycle without replacing the cached report.
pub fn aggregate(
    news: Vec<NewsArticle>,
    posts: Vec<RedditPost>,
    indices: Vec<StockQuote>,
) -> Result<IntelligenceReport, IntelError> {
    // News sentiment scores summaries only; reddit scores title + body.
    let mut news_sentiment = SentimentCounts::default();
    for article in &news {
        news_sentiment.add(score_sentiment(&article.summary));
    }

    let mut reddit_sentiment = SentimentCounts::default();
    for post in &posts {
        reddit_sentiment.add(score_sentiment(&reddit_text(post)));
    }

    let trending_stocks = tally_symbol_mentions(&news, &posts);
    let per_ticker = per_ticker_sentiment(&news, &posts);

    // Tickers come out of the extraction pass as 1-5 uppercase letters;
    // anything else means a source handed us garbage, which is fatal to
    // this cycle rather than something to serve.
    if let Some(bad) = per_ticker
        .keys()
        .find(|s| s.is_empty() || s.len() > 5 || !s.chars().all(|c| c.is_ascii_uppercase()))
    {
        return Err(IntelError::Aggregation(format!(
            "invalid ticker symbol {:?}",
            bad
        )));
    }

    let mut top_news = news;
    top_news.sort_by(|a, b| b.published.cmp(&a.published));
    top_news.truncate(10);

    let mut top_reddit = posts;
    top_reddit.sort_by(|a, b| b.score.cmp(&a.score));
    top_reddit.truncate(10);

    let summary = generate_summary(&news_sentiment, &reddit_sentiment, &trending_stocks);

    Ok(IntelligenceReport {
        timestamp: Utc::now(),
        news_sentiment,
        reddit_sentiment,
        per_ticker_sentiment: per_ticker,
        trending_stocks,
        top_news,
        top_reddit,
        market_indices: indices,
        summary,
    })
}

fn generate_summary(
    news: &SentimentCounts,
    reddit: &SentimentCounts,
    trending: &IndexMap<String, u64>,
) -> String {
    let total_positive = news.positive + reddit.positive;
    let total_negative = news.negative + reddit.negative;

    let sentiment = if total_positive > total_negative {
        "bullish"
    } else if total_negative > total_positive {
        "bearish"
    } else {
        "neutral"
    };

    let top: Vec<&str> = trending.keys().take(5).map(|s| s.as_str()).collect();
    let stocks = if top.is_empty() {
        "None".to_string()
    } else {
        top.join(", ")
    };

    format!("Market sentiment is {}. Top trending stocks: {}", sentiment, stocks)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn article(title: &str, summary: &str, published: chrono::DateTime<Utc>) -> NewsArticle {
        NewsArticle {
            title: title.to_string(),
            link: "https://example.com/a".to_string(),
            summary: summary.to_string(),
            published,
            source: "test-feed".to_string(),
        }
    }

    fn post(title: &str, body: &str, score: i64) -> RedditPost {
        RedditPost {
            title: title.to_string(),
            url: "https://example.com/p".to_string(),
            selftext: body.to_string(),
            score,
            num_comments: 0,
            created_utc: 0.0,
            subreddit: "stocks".to_string(),
            permalink: "https://reddit.com/x".to_string(),
        }
    }

    #[test]
    fn sentiment_counts_keyword_presence() {
        let counts = score_sentiment("Bullish surge as buyers rush in, big gain");
        // bull + bullish + surge + buy (inside "buyers") + gain
        assert_eq!(counts.positive, 5);
        assert_eq!(counts.negative, 0);
        assert_eq!(counts.neutral, 0);
    }

    #[test]
    fn sentiment_matches_substrings_not_words() {
        // "update" contains "up"; "download" contains "down".
        let counts = score_sentiment("software update available for download");
        assert_eq!(counts.positive, 1);
        assert_eq!(counts.negative, 1);
        assert_eq!(counts.neutral, 0);
    }

    #[test]
    fn neutral_flags_texts_with_no_hits() {
        let counts = score_sentiment("quarterly report due next week");
        assert_eq!(counts, SentimentCounts { positive: 0, negative: 0, neutral: 1 });
    }

    #[test]
    fn symbols_extracted_with_and_without_dollar() {
        let symbols = extract_symbols("$AAPL and MSFT both up, $GOOGL flat");
        assert_eq!(symbols, vec!["AAPL", "MSFT", "GOOGL"]);
    }

    #[test]
    fn symbol_extraction_keeps_duplicates_in_order() {
        let symbols = extract_symbols("$TSLA dip. Buying more $TSLA");
        assert_eq!(symbols, vec!["TSLA", "TSLA"]);
    }

    #[test]
    fn trending_ranks_by_count_with_first_seen_tiebreak() {
        let posts = vec![
            post("$ZZZ once", "", 1),
            post("$AAA twice $BBB once", "", 1),
            post("$AAA again", "", 1),
        ];
        let trending = tally_symbol_mentions(&[], &posts);
        let order: Vec<&String> = trending.keys().collect();
        assert_eq!(order, vec!["AAA", "ZZZ", "BBB"]);
        assert_eq!(trending["AAA"], 2);
        assert_eq!(trending["ZZZ"], 1);
        assert_eq!(trending["BBB"], 1);
    }

    #[test]
    fn trending_caps_at_twenty() {
        let posts: Vec<RedditPost> = (0u8..30)
            .map(|i| {
                // $TICAA, $TICAB, ... distinct five-letter symbols
                let symbol = format!("$TIC{}{}", (b'A' + i / 26) as char, (b'A' + i % 26) as char);
                post(&symbol, "", 1)
            })
            .collect();
        let trending = tally_symbol_mentions(&[], &posts);
        assert_eq!(trending.len(), 20);
    }

    #[test]
    fn per_ticker_fan_out_credits_every_symbol() {
        let posts = vec![post("$AAPL $MSFT $NVDA all surge", "", 1)];
        let per_ticker = per_ticker_sentiment(&[], &posts);
        for symbol in ["AAPL", "MSFT", "NVDA"] {
            assert_eq!(per_ticker[symbol].positive, 1, "{symbol}");
        }
    }

    #[test]
    fn pct_positive_is_75_for_three_to_one() {
        let posts = vec![
            post("$XYZ gain", "", 1),
            post("$XYZ rise", "", 1),
            post("$XYZ profit", "", 1),
            post("$XYZ crash", "", 1),
        ];
        let per_ticker = per_ticker_sentiment(&[], &posts);
        assert_eq!(per_ticker["XYZ"].pct_positive, 75.0);
    }

    #[test]
    fn pct_positive_defaults_to_50_without_polarity() {
        let posts = vec![post("$ABC earnings call scheduled", "", 1)];
        let per_ticker = per_ticker_sentiment(&[], &posts);
        assert_eq!(per_ticker["ABC"].positive, 0);
        assert_eq!(per_ticker["ABC"].negative, 0);
        assert_eq!(per_ticker["ABC"].neutral, 1);
        assert_eq!(per_ticker["ABC"].pct_positive, 50.0);
    }

    #[test]
    fn aapl_two_post_scenario() {
        let posts = vec![
            post("$AAPL to the moon", "", 10),
            post("$AAPL crashing, sell now", "", 5),
        ];
        let report = aggregate(vec![], posts, vec![]).unwrap();

        let aapl = &report.per_ticker_sentiment["AAPL"];
        assert_eq!(aapl.positive, 1);
        // "crashing" hits crash, "sell" hits sell
        assert_eq!(aapl.negative, 2);
        assert_eq!(aapl.neutral, 0);
        assert_eq!(aapl.pct_positive, 33.33);
        assert_eq!(report.trending_stocks["AAPL"], 2);
    }

    #[test]
    fn balanced_posts_split_fifty_fifty() {
        let posts = vec![
            post("$AAPL to the moon", "", 10),
            post("$AAPL crashing", "", 5),
        ];
        let report = aggregate(vec![], posts, vec![]).unwrap();
        let aapl = &report.per_ticker_sentiment["AAPL"];
        assert_eq!(aapl.positive, 1);
        assert_eq!(aapl.negative, 1);
        assert_eq!(aapl.pct_positive, 50.0);
    }

    #[test]
    fn top_news_is_newest_first_capped_at_ten() {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let news: Vec<NewsArticle> = (0..15)
            .map(|i| article(&format!("n{i}"), "", base + Duration::hours(i)))
            .collect();
        let report = aggregate(news, vec![], vec![]).unwrap();

        assert_eq!(report.top_news.len(), 10);
        assert_eq!(report.top_news[0].title, "n14");
        assert!(report
            .top_news
            .windows(2)
            .all(|w| w[0].published >= w[1].published));
    }

    #[test]
    fn top_reddit_is_highest_score_first() {
        let posts = vec![post("a", "", 5), post("b", "", 50), post("c", "", 20)];
        let report = aggregate(vec![], posts, vec![]).unwrap();
        let scores: Vec<i64> = report.top_reddit.iter().map(|p| p.score).collect();
        assert_eq!(scores, vec![50, 20, 5]);
    }

    #[test]
    fn news_sentiment_uses_summary_only() {
        let now = Utc::now();
        let news = vec![article("bullish title ignored", "neutral body text", now)];
        let report = aggregate(news, vec![], vec![]).unwrap();
        assert_eq!(report.news_sentiment.positive, 0);
        assert_eq!(report.news_sentiment.neutral, 1);
    }

    #[test]
    fn summary_reports_tone_and_top_five() {
        let posts = vec![
            post("$AAPL surge", "", 1),
            post("$MSFT gain", "", 1),
        ];
        let report = aggregate(vec![], posts, vec![]).unwrap();
        assert!(report.summary.starts_with("Market sentiment is bullish."));
        assert!(report.summary.contains("AAPL"));

        let empty = aggregate(vec![], vec![], vec![]).unwrap();
        assert_eq!(
            empty.summary,
            "Market sentiment is neutral. Top trending stocks: None"
        );
    }

    #[test]
    fn degraded_input_still_aggregates() {
        let report = aggregate(vec![], vec![post("$GME moon", "", 3)], vec![]).unwrap();
        assert!(report.top_news.is_empty());
        assert!(report.market_indices.is_empty());
        assert_eq!(report.reddit_sentiment.positive, 1);
    }
}
