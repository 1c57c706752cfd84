//! Macroeconomic factor
//!
//! Direction of inflation and interest rates, BTC/SPX correlation,
//! and macro headline sentiment. Falling rates and inflation read as
//! bullish for BTC.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tracing::warn;

use super::{clamp01, lock, FactorScore, NEUTRAL_SCORE};
use crate::cache::TtlCache;
use crate::sources::{EconomicIndicators, MacroDataFeed, MarketCorrelations};

const INFLATION_IMPACT: f64 = 0.1;
const RATE_IMPACT: f64 = 0.15;
const SPX_WEIGHT: f64 = 0.1;
const NEWS_WEIGHT: f64 = 0.2;

const INDICATORS_KEY: &str = "economic_indicators";
const CORRELATIONS_KEY: &str = "market_correlations";
const NEWS_KEY: &str = "news_sentiment";

const MACRO_NEWS_TOPIC: &str = "economy inflation interest rates";

pub struct MacroAnalyzer {
    feed: Arc<dyn MacroDataFeed>,
    indicators_cache: Mutex<TtlCache<EconomicIndicators>>,
    correlations_cache: Mutex<TtlCache<MarketCorrelations>>,
    news_cache: Mutex<TtlCache<f64>>,
    indicators_ttl: Duration,
    correlations_ttl: Duration,
    news_ttl: Duration,
}

impl MacroAnalyzer {
    pub fn new(feed: Arc<dyn MacroDataFeed>) -> Self {
        Self {
            feed,
            indicators_cache: Mutex::new(TtlCache::new()),
            correlations_cache: Mutex::new(TtlCache::new()),
            news_cache: Mutex::new(TtlCache::new()),
            indicators_ttl: Duration::from_secs(24 * 3600),
            correlations_ttl: Duration::from_secs(4 * 3600),
            news_ttl: Duration::from_secs(2 * 3600),
        }
    }

    pub fn with_ttls(mut self, indicators: Duration, correlations: Duration, news: Duration) -> Self {
        self.indicators_ttl = indicators;
        self.correlations_ttl = correlations;
        self.news_ttl = news;
        self
    }

    pub async fn score(&self) -> FactorScore {
        match self.try_score().await {
            Ok(score) => score,
            Err(e) => {
                warn!("macro analyzer degraded to neutral: {e}");
                FactorScore::neutral()
            }
        }
    }

    async fn try_score(&self) -> anyhow::Result<FactorScore> {
        let indicators = self.indicators().await?;
        let correlations = self.correlations().await?;
        let news_sentiment = self.news_sentiment().await?;

        let mut score = NEUTRAL_SCORE;
        // Rising inflation and rising rates both read bearish
        score += if indicators.inflation.change > 0.0 {
            -INFLATION_IMPACT
        } else {
            INFLATION_IMPACT
        };
        score += if indicators.interest_rate.change > 0.0 {
            -RATE_IMPACT
        } else {
            RATE_IMPACT
        };
        score += correlations.spx * SPX_WEIGHT;
        score += news_sentiment * NEWS_WEIGHT;

        Ok(FactorScore {
            value: clamp01(score),
            components: json!({
                "indicators": indicators,
                "correlations": correlations,
                "news_sentiment": news_sentiment,
            }),
        })
    }

    /// Macro headline sentiment normalized into [0, 1]; used directly
    /// as the news factor of the multi-factor preset
    pub async fn headline_score(&self) -> f64 {
        match self.news_sentiment().await {
            Ok(sentiment) => clamp01((sentiment + 1.0) / 2.0),
            Err(e) => {
                warn!("headline sentiment degraded to neutral: {e}");
                NEUTRAL_SCORE
            }
        }
    }

    async fn indicators(&self) -> anyhow::Result<EconomicIndicators> {
        if let Some(cached) = lock(&self.indicators_cache).get(INDICATORS_KEY) {
            return Ok(cached);
        }
        let fresh = self.feed.economic_indicators().await?;
        lock(&self.indicators_cache).put(INDICATORS_KEY, fresh.clone(), self.indicators_ttl);
        Ok(fresh)
    }

    async fn correlations(&self) -> anyhow::Result<MarketCorrelations> {
        if let Some(cached) = lock(&self.correlations_cache).get(CORRELATIONS_KEY) {
            return Ok(cached);
        }
        let fresh = self.feed.market_correlations().await?;
        lock(&self.correlations_cache).put(CORRELATIONS_KEY, fresh, self.correlations_ttl);
        Ok(fresh)
    }

    async fn news_sentiment(&self) -> anyhow::Result<f64> {
        if let Some(cached) = lock(&self.news_cache).get(NEWS_KEY) {
            return Ok(cached);
        }
        let fresh = self.feed.headline_sentiment(MACRO_NEWS_TOPIC).await?;
        lock(&self.news_cache).put(NEWS_KEY, fresh, self.news_ttl);
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SnapshotMacroFeed;
    use async_trait::async_trait;

    struct FailingFeed;

    #[async_trait]
    impl MacroDataFeed for FailingFeed {
        async fn economic_indicators(&self) -> anyhow::Result<EconomicIndicators> {
            anyhow::bail!("upstream down")
        }
        async fn market_correlations(&self) -> anyhow::Result<MarketCorrelations> {
            anyhow::bail!("upstream down")
        }
        async fn headline_sentiment(&self, _topic: &str) -> anyhow::Result<f64> {
            anyhow::bail!("upstream down")
        }
    }

    #[tokio::test]
    async fn snapshot_defaults_produce_mild_bullish_score() {
        let analyzer = MacroAnalyzer::new(Arc::new(SnapshotMacroFeed::new(None)));
        let score = analyzer.score().await;
        // 0.5 - 0.1 (inflation rising) + 0.15 (rates flat) + 0.06 + 0.04
        assert!((score.value - 0.65).abs() < 1e-9);
    }

    #[tokio::test]
    async fn failure_degrades_to_neutral() {
        let analyzer = MacroAnalyzer::new(Arc::new(FailingFeed));
        let score = analyzer.score().await;
        assert_eq!(score.value, NEUTRAL_SCORE);
        assert_eq!(analyzer.headline_score().await, NEUTRAL_SCORE);
    }

    #[tokio::test]
    async fn score_stays_in_unit_interval() {
        let analyzer = MacroAnalyzer::new(Arc::new(SnapshotMacroFeed::new(None)));
        let score = analyzer.score().await;
        assert!((0.0..=1.0).contains(&score.value));
    }
}
