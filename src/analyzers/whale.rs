//! Whale-activity factor
//!
//! Net movement across tracked exchange wallets, corporate treasury
//! buying, and large-transaction headlines. Inflows onto exchanges
//! read as sell pressure. This factor is used as a veto gate by the
//! multi-factor preset rather than a weighted term.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tracing::warn;

use super::{clamp01, lexicon_polarity, lock, FactorScore, NEUTRAL_SCORE};
use crate::cache::TtlCache;
use crate::sources::{FlowDirection, WhaleAction, WhaleFeed};

const EXCHANGE_WEIGHT: f64 = -0.1 / 1000.0;
const EXCHANGE_CLAMP: f64 = 0.2;
const CORPORATE_WEIGHT: f64 = 0.05 / 1000.0;
const CORPORATE_CLAMP: f64 = 0.2;
const NEWS_WEIGHT: f64 = 0.05;
const NEWS_CLAMP: f64 = 0.1;

const BULLISH_THRESHOLD: f64 = 0.6;
const BEARISH_THRESHOLD: f64 = 0.4;

const WHALE_KEY: &str = "whale_score";

pub struct WhaleAnalyzer {
    feed: Arc<dyn WhaleFeed>,
    cache: Mutex<TtlCache<FactorScore>>,
    ttl: Duration,
}

impl WhaleAnalyzer {
    pub fn new(feed: Arc<dyn WhaleFeed>) -> Self {
        Self {
            feed,
            cache: Mutex::new(TtlCache::new()),
            ttl: Duration::from_secs(6 * 3600),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub async fn score(&self) -> FactorScore {
        if let Some(cached) = lock(&self.cache).get(WHALE_KEY) {
            return cached;
        }
        match self.try_score().await {
            Ok(score) => {
                lock(&self.cache).put(WHALE_KEY, score.clone(), self.ttl);
                score
            }
            Err(e) => {
                warn!("whale analyzer degraded to neutral: {e}");
                FactorScore::neutral()
            }
        }
    }

    async fn try_score(&self) -> anyhow::Result<FactorScore> {
        let movements = self.feed.exchange_movements().await?;
        let corporate_btc = self.feed.treasury_purchases_btc().await?;
        let articles = self.feed.whale_news().await?;

        let net_exchange_flow: f64 = movements
            .iter()
            .map(|m| match m.direction {
                FlowDirection::Inflow => m.amount_btc,
                FlowDirection::Outflow => -m.amount_btc,
            })
            .sum();

        let news_sentiment: f64 = articles
            .iter()
            .map(|article| {
                let polarity = lexicon_polarity(&article.text);
                match article.action {
                    WhaleAction::Buy => polarity,
                    WhaleAction::Sell => -polarity,
                    WhaleAction::Unknown => 0.0,
                }
            })
            .sum();

        let mut score = NEUTRAL_SCORE;
        score += (net_exchange_flow * EXCHANGE_WEIGHT).clamp(-EXCHANGE_CLAMP, EXCHANGE_CLAMP);
        score += (corporate_btc * CORPORATE_WEIGHT).clamp(0.0, CORPORATE_CLAMP);
        score += (news_sentiment * NEWS_WEIGHT).clamp(-NEWS_CLAMP, NEWS_CLAMP);
        let value = clamp01(score);

        Ok(FactorScore {
            value,
            components: json!({
                "exchange_flow": net_exchange_flow,
                "corporate_buying": corporate_btc,
                "news_sentiment": news_sentiment,
                "interpretation": interpretation(value),
            }),
        })
    }
}

fn interpretation(value: f64) -> &'static str {
    if value > BULLISH_THRESHOLD {
        "bullish"
    } else if value < BEARISH_THRESHOLD {
        "bearish"
    } else {
        "neutral"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{WalletMovement, WhaleArticle};
    use async_trait::async_trait;
    use chrono::Utc;

    struct FixedFeed {
        movements: Vec<WalletMovement>,
        corporate_btc: f64,
        articles: Vec<WhaleArticle>,
    }

    #[async_trait]
    impl WhaleFeed for FixedFeed {
        async fn exchange_movements(&self) -> anyhow::Result<Vec<WalletMovement>> {
            Ok(self.movements.clone())
        }
        async fn treasury_purchases_btc(&self) -> anyhow::Result<f64> {
            Ok(self.corporate_btc)
        }
        async fn whale_news(&self) -> anyhow::Result<Vec<WhaleArticle>> {
            Ok(self.articles.clone())
        }
    }

    struct FailingFeed;

    #[async_trait]
    impl WhaleFeed for FailingFeed {
        async fn exchange_movements(&self) -> anyhow::Result<Vec<WalletMovement>> {
            anyhow::bail!("upstream down")
        }
        async fn treasury_purchases_btc(&self) -> anyhow::Result<f64> {
            anyhow::bail!("upstream down")
        }
        async fn whale_news(&self) -> anyhow::Result<Vec<WhaleArticle>> {
            anyhow::bail!("upstream down")
        }
    }

    fn movement(direction: FlowDirection, amount_btc: f64) -> WalletMovement {
        WalletMovement {
            direction,
            amount_btc,
            time: Utc::now(),
        }
    }

    #[tokio::test]
    async fn quiet_chain_is_neutral() {
        let feed = FixedFeed {
            movements: vec![],
            corporate_btc: 0.0,
            articles: vec![],
        };
        let analyzer = WhaleAnalyzer::new(Arc::new(feed));
        let score = analyzer.score().await;
        assert_eq!(score.value, 0.5);
        assert_eq!(score.components["interpretation"], "neutral");
    }

    #[tokio::test]
    async fn exchange_inflows_read_bearish() {
        let feed = FixedFeed {
            movements: vec![movement(FlowDirection::Inflow, 5000.0)],
            corporate_btc: 0.0,
            articles: vec![],
        };
        let analyzer = WhaleAnalyzer::new(Arc::new(feed));
        let score = analyzer.score().await;
        // impact clamps at -0.2
        assert!((score.value - 0.3).abs() < 1e-9);
        assert_eq!(score.components["interpretation"], "bearish");
    }

    #[tokio::test]
    async fn corporate_buying_reads_bullish() {
        let feed = FixedFeed {
            movements: vec![movement(FlowDirection::Outflow, 1000.0)],
            corporate_btc: 2000.0,
            articles: vec![WhaleArticle {
                text: String::from("whale bought the dip, rally expected"),
                action: WhaleAction::Buy,
            }],
        };
        let analyzer = WhaleAnalyzer::new(Arc::new(feed));
        let score = analyzer.score().await;
        assert!(score.value > BULLISH_THRESHOLD);
        assert_eq!(score.components["interpretation"], "bullish");
    }

    #[tokio::test]
    async fn failure_degrades_to_neutral() {
        let analyzer = WhaleAnalyzer::new(Arc::new(FailingFeed));
        assert_eq!(analyzer.score().await.value, NEUTRAL_SCORE);
    }
}
