//! btcbot
//!
//! BTC/USD signal-scoring and paper-trading bot:
//! 1. Pulls OHLCV history and the spot price from Kraken
//! 2. Derives technical indicators and a next-bar direction probability
//! 3. Blends macro, on-chain, sentiment, and whale factors into a score
//! 4. Simulates the resulting BUY/SELL/HOLD against a virtual portfolio

pub mod analyzers;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod features;
pub mod indicators;
pub mod market;
pub mod notify;
pub mod paper;
pub mod runner;
pub mod scoring;
pub mod sources;

// Re-export main types for convenience
pub use analyzers::{FactorScore, MacroAnalyzer, OnChainAnalyzer, SentimentAnalyzer, WhaleAnalyzer};
pub use cache::TtlCache;
pub use classifier::{DirectionClassifier, ForestConfig, RandomForest, TrainError};
pub use config::{BotConfig, ConfigError, WeightPreset};
pub use features::IndicatorFrame;
pub use market::{Candle, MarketDataSource, OhlcvSeries, SeriesError};
pub use notify::{Notifier, PushoverNotifier};
pub use paper::{PaperTrader, TradeError, TradeRecord, TradeRules};
pub use runner::BotRunner;
pub use scoring::{Action, CombinedSignal, FactorInputs, ScoreWeights, ScoringEngine};

mod tests;
