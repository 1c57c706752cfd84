//! On-chain factor
//!
//! Network health (hash rate, active addresses, SOPR), 7-day exchange
//! flows, and whale-address population. Positive net flow means coins
//! leaving exchanges and pushes the score up.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tracing::warn;

use super::{clamp01, lock, FactorScore, NEUTRAL_SCORE};
use crate::cache::TtlCache;
use crate::sources::{ChainDataFeed, ExchangeFlows, NetworkMetrics, WhaleStats};

const CHANGE_WEIGHT: f64 = 0.5;
const CHANGE_CLAMP: f64 = 0.1;
const SOPR_IMPACT: f64 = 0.1;
const SOPR_UPPER: f64 = 1.05;
const SOPR_LOWER: f64 = 0.95;
const FLOW_WEIGHT: f64 = 0.000_000_1;
const FLOW_CLAMP: f64 = 0.2;

const METRICS_KEY: &str = "blockchain_metrics";
const FLOWS_KEY: &str = "exchange_flows";
const WHALES_KEY: &str = "whale_activity";

pub struct OnChainAnalyzer {
    feed: Arc<dyn ChainDataFeed>,
    metrics_cache: Mutex<TtlCache<NetworkMetrics>>,
    flows_cache: Mutex<TtlCache<ExchangeFlows>>,
    whales_cache: Mutex<TtlCache<WhaleStats>>,
    metrics_ttl: Duration,
    flows_ttl: Duration,
    whales_ttl: Duration,
}

impl OnChainAnalyzer {
    pub fn new(feed: Arc<dyn ChainDataFeed>) -> Self {
        Self {
            feed,
            metrics_cache: Mutex::new(TtlCache::new()),
            flows_cache: Mutex::new(TtlCache::new()),
            whales_cache: Mutex::new(TtlCache::new()),
            metrics_ttl: Duration::from_secs(4 * 3600),
            flows_ttl: Duration::from_secs(4 * 3600),
            whales_ttl: Duration::from_secs(6 * 3600),
        }
    }

    pub fn with_ttls(mut self, metrics: Duration, flows: Duration, whales: Duration) -> Self {
        self.metrics_ttl = metrics;
        self.flows_ttl = flows;
        self.whales_ttl = whales;
        self
    }

    pub async fn score(&self) -> FactorScore {
        match self.try_score().await {
            Ok(score) => score,
            Err(e) => {
                warn!("on-chain analyzer degraded to neutral: {e}");
                FactorScore::neutral()
            }
        }
    }

    async fn try_score(&self) -> anyhow::Result<FactorScore> {
        let metrics = self.metrics().await?;
        let flows = self.flows().await?;
        let whales = self.whales().await?;

        let mut score = NEUTRAL_SCORE;
        if let Some(change) = metrics.hash_rate_change {
            score += (change * CHANGE_WEIGHT).clamp(-CHANGE_CLAMP, CHANGE_CLAMP);
        }
        if let Some(change) = metrics.active_addresses_change {
            score += (change * CHANGE_WEIGHT).clamp(-CHANGE_CLAMP, CHANGE_CLAMP);
        }
        if let Some(sopr) = metrics.sopr {
            if sopr > SOPR_UPPER {
                score += SOPR_IMPACT;
            } else if sopr < SOPR_LOWER {
                score -= SOPR_IMPACT;
            }
        }
        if flows.net_flow_btc != 0.0 {
            score += (flows.net_flow_btc * FLOW_WEIGHT).clamp(-FLOW_CLAMP, FLOW_CLAMP);
        }
        if let Some(change) = whales.count_change {
            score += (change * CHANGE_WEIGHT).clamp(-CHANGE_CLAMP, CHANGE_CLAMP);
        }

        Ok(FactorScore {
            value: clamp01(score),
            components: json!({
                "metrics": metrics,
                "exchange_flows": flows,
                "whale_activity": whales,
            }),
        })
    }

    async fn metrics(&self) -> anyhow::Result<NetworkMetrics> {
        if let Some(cached) = lock(&self.metrics_cache).get(METRICS_KEY) {
            return Ok(cached);
        }
        let fresh = self.feed.network_metrics().await?;
        lock(&self.metrics_cache).put(METRICS_KEY, fresh.clone(), self.metrics_ttl);
        Ok(fresh)
    }

    async fn flows(&self) -> anyhow::Result<ExchangeFlows> {
        if let Some(cached) = lock(&self.flows_cache).get(FLOWS_KEY) {
            return Ok(cached);
        }
        let fresh = self.feed.exchange_flows().await?;
        lock(&self.flows_cache).put(FLOWS_KEY, fresh, self.flows_ttl);
        Ok(fresh)
    }

    async fn whales(&self) -> anyhow::Result<WhaleStats> {
        if let Some(cached) = lock(&self.whales_cache).get(WHALES_KEY) {
            return Ok(cached);
        }
        let fresh = self.feed.whale_stats().await?;
        lock(&self.whales_cache).put(WHALES_KEY, fresh, self.whales_ttl);
        Ok(fresh)
    }
}
