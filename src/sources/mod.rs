//! External data feeds
//!
//! Every upstream dependency sits behind an async trait so the
//! analyzers and tests can inject snapshots instead of the network.
//! Live clients degrade gracefully; the traits themselves return
//! `Result` and leave the neutral-default policy to the callers.

pub mod alternative_me;
pub mod blockchain_info;
pub mod kraken;
pub mod newsdata;
pub mod reddit;
pub mod static_feeds;

pub use alternative_me::FearGreedClient;
pub use blockchain_info::BlockchainInfoClient;
pub use kraken::KrakenClient;
pub use newsdata::NewsdataClient;
pub use reddit::RedditClient;
pub use static_feeds::{SnapshotChainFeed, SnapshotMacroFeed};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One reading of an economic indicator: current value plus the change
/// since the previous release
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndicatorReading {
    pub value: f64,
    pub change: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomicIndicators {
    pub inflation: IndicatorReading,
    pub interest_rate: IndicatorReading,
    pub unemployment: IndicatorReading,
}

/// BTC correlation coefficients against reference markets
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarketCorrelations {
    pub spx: f64,
    pub gold: f64,
    pub usd: f64,
}

#[async_trait]
pub trait MacroDataFeed: Send + Sync {
    async fn economic_indicators(&self) -> anyhow::Result<EconomicIndicators>;
    async fn market_correlations(&self) -> anyhow::Result<MarketCorrelations>;
    /// Aggregate headline sentiment for a topic, in [-1, 1]
    async fn headline_sentiment(&self, topic: &str) -> anyhow::Result<f64>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkMetrics {
    pub hash_rate_change: Option<f64>,
    pub active_addresses_change: Option<f64>,
    pub sopr: Option<f64>,
}

/// 7-day exchange flow aggregate; positive `net_flow_btc` means coins
/// leaving exchanges
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExchangeFlows {
    pub inflow_7d: f64,
    pub outflow_7d: f64,
    pub net_flow_btc: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WhaleStats {
    pub count_change: Option<f64>,
}

#[async_trait]
pub trait ChainDataFeed: Send + Sync {
    async fn network_metrics(&self) -> anyhow::Result<NetworkMetrics>;
    async fn exchange_flows(&self) -> anyhow::Result<ExchangeFlows>;
    async fn whale_stats(&self) -> anyhow::Result<WhaleStats>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FearGreedPoint {
    pub value: u32,
    pub classification: String,
    pub timestamp: DateTime<Utc>,
}

#[async_trait]
pub trait SocialFeed: Send + Sync {
    /// Fear & Greed history, most recent first
    async fn fear_greed(&self, limit: usize) -> anyhow::Result<Vec<FearGreedPoint>>;
    async fn recent_posts(&self, topic: &str, limit: usize) -> anyhow::Result<Vec<Post>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowDirection {
    Inflow,
    Outflow,
}

/// One large transfer touching a tracked exchange wallet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletMovement {
    pub direction: FlowDirection,
    pub amount_btc: f64,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WhaleAction {
    Buy,
    Sell,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhaleArticle {
    pub text: String,
    pub action: WhaleAction,
}

#[async_trait]
pub trait WhaleFeed: Send + Sync {
    async fn exchange_movements(&self) -> anyhow::Result<Vec<WalletMovement>>;
    /// BTC bought by corporate treasuries over the last week
    async fn treasury_purchases_btc(&self) -> anyhow::Result<f64>;
    async fn whale_news(&self) -> anyhow::Result<Vec<WhaleArticle>>;
}

/// Live social feed: Fear & Greed index plus public Reddit posts
pub struct LiveSocialFeed {
    fng: FearGreedClient,
    reddit: RedditClient,
}

impl LiveSocialFeed {
    pub fn new(fng: FearGreedClient, reddit: RedditClient) -> Self {
        Self { fng, reddit }
    }
}

#[async_trait]
impl SocialFeed for LiveSocialFeed {
    async fn fear_greed(&self, limit: usize) -> anyhow::Result<Vec<FearGreedPoint>> {
        self.fng.fetch(limit).await
    }

    async fn recent_posts(&self, topic: &str, limit: usize) -> anyhow::Result<Vec<Post>> {
        self.reddit.hot_posts(topic, limit).await
    }
}

/// Live whale feed: exchange wallets via blockchain.info, whale
/// headlines via newsdata.io when a key is configured
pub struct LiveWhaleFeed {
    chain: BlockchainInfoClient,
    news: Option<NewsdataClient>,
}

impl LiveWhaleFeed {
    pub fn new(chain: BlockchainInfoClient, news: Option<NewsdataClient>) -> Self {
        Self { chain, news }
    }
}

#[async_trait]
impl WhaleFeed for LiveWhaleFeed {
    async fn exchange_movements(&self) -> anyhow::Result<Vec<WalletMovement>> {
        self.chain.recent_movements().await
    }

    async fn treasury_purchases_btc(&self) -> anyhow::Result<f64> {
        // No filings source wired up; treated as no recent buying
        Ok(0.0)
    }

    async fn whale_news(&self) -> anyhow::Result<Vec<WhaleArticle>> {
        let Some(news) = &self.news else {
            return Ok(Vec::new());
        };
        let headlines = news
            .headlines("bitcoin whale OR large OR million buy OR bought OR sold")
            .await?;
        Ok(headlines
            .into_iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let action = if ["buy", "bought", "purchase", "acquire"]
                    .iter()
                    .any(|w| lower.contains(w))
                {
                    WhaleAction::Buy
                } else if ["sell", "sold", "dump"].iter().any(|w| lower.contains(w)) {
                    WhaleAction::Sell
                } else {
                    WhaleAction::Unknown
                };
                WhaleArticle { text, action }
            })
            .collect())
    }
}
