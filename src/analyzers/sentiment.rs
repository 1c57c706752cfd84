//! Social sentiment factor
//!
//! Fear & Greed index plus keyword polarity over the hot posts of a
//! subreddit. The raw combined sentiment lives in [-1, 1] and is
//! mapped onto the shared [0, 1] factor scale. Components carry the
//! week-over-week index trend and a contrarian signal at the extremes.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tracing::warn;

use super::{clamp01, lexicon_polarity, lock, FactorScore, NEUTRAL_SCORE};
use crate::cache::TtlCache;
use crate::sources::{FearGreedPoint, Post, SocialFeed};

const FNG_HISTORY: usize = 30;
const REDDIT_POSTS: usize = 10;
const SENTIMENT_KEY: &str = "social_sentiment";

pub struct SentimentAnalyzer {
    feed: Arc<dyn SocialFeed>,
    topic: String,
    cache: Mutex<TtlCache<FactorScore>>,
    ttl: Duration,
}

impl SentimentAnalyzer {
    pub fn new(feed: Arc<dyn SocialFeed>, topic: impl Into<String>) -> Self {
        Self {
            feed,
            topic: topic.into(),
            cache: Mutex::new(TtlCache::new()),
            ttl: Duration::from_secs(3600),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub async fn score(&self) -> FactorScore {
        if let Some(cached) = lock(&self.cache).get(SENTIMENT_KEY) {
            return cached;
        }
        match self.try_score().await {
            Ok(score) => {
                lock(&self.cache).put(SENTIMENT_KEY, score.clone(), self.ttl);
                score
            }
            Err(e) => {
                warn!("sentiment analyzer degraded to neutral: {e}");
                FactorScore::neutral()
            }
        }
    }

    async fn try_score(&self) -> anyhow::Result<FactorScore> {
        let history = self.feed.fear_greed(FNG_HISTORY).await?;
        let current = history
            .first()
            .ok_or_else(|| anyhow::anyhow!("empty fear & greed history"))?;

        let fng_sentiment = (current.value as f64 - 50.0) / 50.0;
        let posts = self.feed.recent_posts(&self.topic, REDDIT_POSTS).await?;
        let reddit_sentiment = average_polarity(&posts);

        let raw = match reddit_sentiment {
            Some(reddit) => (fng_sentiment + reddit) / 2.0,
            None => fng_sentiment,
        };

        let trend = index_trend(&history);
        let (signal, signal_strength) = contrarian_signal(current.value);

        Ok(FactorScore {
            value: clamp01((raw + 1.0) / 2.0),
            components: json!({
                "fear_greed": {
                    "value": current.value,
                    "classification": current.classification,
                    "trend": trend,
                    "signal": signal,
                    "signal_strength": signal_strength,
                },
                "fng_sentiment": fng_sentiment,
                "reddit_sentiment": reddit_sentiment,
            }),
        })
    }
}

fn average_polarity(posts: &[Post]) -> Option<f64> {
    if posts.is_empty() {
        return None;
    }
    let sum: f64 = posts
        .iter()
        .map(|p| lexicon_polarity(&format!("{} {}", p.title, p.body)))
        .sum();
    Some(sum / posts.len() as f64)
}

/// Week-over-week index movement, bucketed
fn index_trend(history: &[FearGreedPoint]) -> &'static str {
    let Some(current) = history.first() else {
        return "none";
    };
    let Some(week_ago) = history.get(7) else {
        return "stable";
    };
    let delta = current.value as i64 - week_ago.value as i64;
    match delta {
        d if d > 10 => "rapidly_increasing",
        d if d > 5 => "increasing",
        d if d < -10 => "rapidly_decreasing",
        d if d < -5 => "decreasing",
        _ => "stable",
    }
}

/// Extreme fear reads bullish, extreme greed bearish
fn contrarian_signal(value: u32) -> (&'static str, f64) {
    let value = value as f64;
    if value <= 20.0 {
        ("bullish", (25.0 - value) / 25.0)
    } else if value >= 75.0 {
        ("bearish", (value - 75.0) / 25.0)
    } else {
        ("neutral", 0.5 - (50.0 - value).abs() / 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;

    struct FixedFeed {
        values: Vec<u32>,
        posts: Vec<Post>,
    }

    #[async_trait]
    impl SocialFeed for FixedFeed {
        async fn fear_greed(&self, limit: usize) -> anyhow::Result<Vec<FearGreedPoint>> {
            Ok(self
                .values
                .iter()
                .take(limit)
                .map(|&value| FearGreedPoint {
                    value,
                    classification: String::from("n/a"),
                    timestamp: Utc::now(),
                })
                .collect())
        }

        async fn recent_posts(&self, _topic: &str, limit: usize) -> anyhow::Result<Vec<Post>> {
            Ok(self.posts.iter().take(limit).cloned().collect())
        }
    }

    struct FailingFeed;

    #[async_trait]
    impl SocialFeed for FailingFeed {
        async fn fear_greed(&self, _limit: usize) -> anyhow::Result<Vec<FearGreedPoint>> {
            anyhow::bail!("upstream down")
        }
        async fn recent_posts(&self, _topic: &str, _limit: usize) -> anyhow::Result<Vec<Post>> {
            anyhow::bail!("upstream down")
        }
    }

    #[tokio::test]
    async fn neutral_index_without_posts_scores_half() {
        let feed = FixedFeed {
            values: vec![50],
            posts: vec![],
        };
        let analyzer = SentimentAnalyzer::new(Arc::new(feed), "bitcoin");
        assert_eq!(analyzer.score().await.value, 0.5);
    }

    #[tokio::test]
    async fn greed_and_bullish_posts_score_high() {
        let feed = FixedFeed {
            values: vec![90],
            posts: vec![Post {
                title: String::from("massive rally incoming"),
                body: String::from("institutional adoption and breakout"),
            }],
        };
        let analyzer = SentimentAnalyzer::new(Arc::new(feed), "bitcoin");
        let score = analyzer.score().await;
        assert!(score.value > 0.8);
    }

    #[tokio::test]
    async fn failure_degrades_to_neutral() {
        let analyzer = SentimentAnalyzer::new(Arc::new(FailingFeed), "bitcoin");
        assert_eq!(analyzer.score().await.value, NEUTRAL_SCORE);
    }

    #[test]
    fn trend_buckets() {
        let point = |value| FearGreedPoint {
            value,
            classification: String::new(),
            timestamp: Utc::now(),
        };
        let history: Vec<_> = [72u32, 70, 68, 66, 64, 62, 60, 55].into_iter().map(point).collect();
        assert_eq!(index_trend(&history), "rapidly_increasing");
        let flat: Vec<_> = [50u32; 8].into_iter().map(point).collect();
        assert_eq!(index_trend(&flat), "stable");
    }

    #[test]
    fn contrarian_extremes() {
        assert_eq!(contrarian_signal(10).0, "bullish");
        assert_eq!(contrarian_signal(90).0, "bearish");
        assert_eq!(contrarian_signal(50).0, "neutral");
    }
}
