//! Snapshot feeds for macro and on-chain data
//!
//! Macro indicators and on-chain aggregates have no free real-time
//! API, so the default deployment runs on periodically updated
//! snapshot values. The same types double as deterministic test feeds.

use async_trait::async_trait;

use super::{
    ChainDataFeed, EconomicIndicators, ExchangeFlows, IndicatorReading, MacroDataFeed,
    MarketCorrelations, NetworkMetrics, WhaleStats,
};
use crate::sources::NewsdataClient;
use crate::analyzers::lexicon_polarity;

/// Macro snapshot with optional live headline sentiment
pub struct SnapshotMacroFeed {
    indicators: EconomicIndicators,
    correlations: MarketCorrelations,
    fallback_sentiment: f64,
    news: Option<NewsdataClient>,
}

impl SnapshotMacroFeed {
    pub fn new(news: Option<NewsdataClient>) -> Self {
        Self {
            indicators: EconomicIndicators {
                inflation: IndicatorReading { value: 2.5, change: 0.1 },
                interest_rate: IndicatorReading { value: 5.0, change: 0.0 },
                unemployment: IndicatorReading { value: 4.0, change: -0.2 },
            },
            correlations: MarketCorrelations {
                spx: 0.6,
                gold: -0.2,
                usd: 0.1,
            },
            fallback_sentiment: 0.2,
            news,
        }
    }

    pub fn with_indicators(mut self, indicators: EconomicIndicators) -> Self {
        self.indicators = indicators;
        self
    }

    pub fn with_correlations(mut self, correlations: MarketCorrelations) -> Self {
        self.correlations = correlations;
        self
    }
}

#[async_trait]
impl MacroDataFeed for SnapshotMacroFeed {
    async fn economic_indicators(&self) -> anyhow::Result<EconomicIndicators> {
        Ok(self.indicators.clone())
    }

    async fn market_correlations(&self) -> anyhow::Result<MarketCorrelations> {
        Ok(self.correlations)
    }

    async fn headline_sentiment(&self, topic: &str) -> anyhow::Result<f64> {
        let Some(news) = &self.news else {
            return Ok(self.fallback_sentiment);
        };
        let headlines = news.headlines(topic).await?;
        if headlines.is_empty() {
            return Ok(0.0);
        }
        let sum: f64 = headlines.iter().map(|h| lexicon_polarity(h)).sum();
        Ok((sum / headlines.len() as f64).clamp(-1.0, 1.0))
    }
}

/// On-chain snapshot feed
pub struct SnapshotChainFeed {
    metrics: NetworkMetrics,
    flows: ExchangeFlows,
    whales: WhaleStats,
}

impl SnapshotChainFeed {
    pub fn new() -> Self {
        Self {
            metrics: NetworkMetrics {
                hash_rate_change: Some(0.05),
                active_addresses_change: Some(0.02),
                sopr: Some(1.01),
            },
            flows: ExchangeFlows {
                inflow_7d: 10_000.0,
                outflow_7d: 12_000.0,
                net_flow_btc: 2_000.0,
            },
            whales: WhaleStats {
                count_change: Some(0.01),
            },
        }
    }

    pub fn with_metrics(mut self, metrics: NetworkMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_flows(mut self, flows: ExchangeFlows) -> Self {
        self.flows = flows;
        self
    }

    pub fn with_whales(mut self, whales: WhaleStats) -> Self {
        self.whales = whales;
        self
    }
}

impl Default for SnapshotChainFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainDataFeed for SnapshotChainFeed {
    async fn network_metrics(&self) -> anyhow::Result<NetworkMetrics> {
        Ok(self.metrics.clone())
    }

    async fn exchange_flows(&self) -> anyhow::Result<ExchangeFlows> {
        Ok(self.flows)
    }

    async fn whale_stats(&self) -> anyhow::Result<WhaleStats> {
        Ok(self.whales)
    }
}
