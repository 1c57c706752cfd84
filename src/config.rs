//! Bot configuration
//!
//! Loaded once at startup from a YAML file; a missing or malformed
//! file is fatal. Every tunable is an explicit named field with a
//! default matching the simulation's standard parameters, so an empty
//! file is a valid config.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::paper::TradeRules;
use crate::scoring::ScoreWeights;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("buy threshold must satisfy 0 < sell < buy < 1 (got sell={sell}, buy={buy})")]
    BadThresholds { buy: f64, sell: f64 },
    #[error("fee percentage must be in [0, 1)")]
    BadFee,
    #[error("max trade fraction must be in (0, 1]")]
    BadTradeFraction,
    #[error("initial balances must be non-negative")]
    NegativeBalance,
    #[error("initial average price must be positive")]
    BadInitialAvgPrice,
    #[error("poll interval must be positive")]
    BadPollInterval,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    #[serde(default)]
    pub trading: TradingParams,
    #[serde(default)]
    pub scoring: ScoringParams,
    #[serde(default)]
    pub cache: CacheParams,
    #[serde(default)]
    pub sources: SourceParams,
    /// Seconds between decision cycles
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            trading: TradingParams::default(),
            scoring: ScoringParams::default(),
            cache: CacheParams::default(),
            sources: SourceParams::default(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TradingParams {
    #[serde(default = "default_initial_usd")]
    pub initial_usd: Decimal,
    #[serde(default)]
    pub initial_btc: Decimal,
    /// Entry price assumed for a seeded BTC position
    #[serde(default)]
    pub initial_avg_price: Option<Decimal>,
    #[serde(default = "default_fee_pct")]
    pub fee_pct: Decimal,
    #[serde(default = "default_min_trade_interval")]
    pub min_trade_interval_secs: i64,
    #[serde(default = "default_min_price_change")]
    pub min_price_change_pct: Decimal,
    #[serde(default = "default_profit_target")]
    pub profit_target_pct: Decimal,
    #[serde(default = "default_max_trade_fraction")]
    pub max_trade_fraction: Decimal,
}

impl Default for TradingParams {
    fn default() -> Self {
        Self {
            initial_usd: default_initial_usd(),
            initial_btc: Decimal::ZERO,
            initial_avg_price: None,
            fee_pct: default_fee_pct(),
            min_trade_interval_secs: default_min_trade_interval(),
            min_price_change_pct: default_min_price_change(),
            profit_target_pct: default_profit_target(),
            max_trade_fraction: default_max_trade_fraction(),
        }
    }
}

impl TradingParams {
    pub fn rules(&self) -> TradeRules {
        TradeRules {
            fee_pct: self.fee_pct,
            min_trade_interval_secs: self.min_trade_interval_secs,
            min_price_change_pct: self.min_price_change_pct,
            profit_target_pct: self.profit_target_pct,
            max_trade_fraction: self.max_trade_fraction,
        }
    }
}

/// Which weighting table the engine runs with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightPreset {
    Classifier,
    MultiFactor,
}

impl WeightPreset {
    pub fn weights(self) -> ScoreWeights {
        match self {
            WeightPreset::Classifier => ScoreWeights::classifier(),
            WeightPreset::MultiFactor => ScoreWeights::multi_factor(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringParams {
    #[serde(default = "default_preset")]
    pub preset: WeightPreset,
    #[serde(default = "default_buy_threshold")]
    pub buy_threshold: f64,
    #[serde(default = "default_sell_threshold")]
    pub sell_threshold: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            preset: default_preset(),
            buy_threshold: default_buy_threshold(),
            sell_threshold: default_sell_threshold(),
        }
    }
}

/// Cache TTLs in seconds, one per upstream subject
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheParams {
    #[serde(default = "default_indicators_ttl")]
    pub economic_indicators_ttl_secs: u64,
    #[serde(default = "default_correlations_ttl")]
    pub correlations_ttl_secs: u64,
    #[serde(default = "default_macro_news_ttl")]
    pub macro_news_ttl_secs: u64,
    #[serde(default = "default_network_metrics_ttl")]
    pub network_metrics_ttl_secs: u64,
    #[serde(default = "default_exchange_flows_ttl")]
    pub exchange_flows_ttl_secs: u64,
    #[serde(default = "default_whale_ttl")]
    pub whale_ttl_secs: u64,
    #[serde(default = "default_sentiment_ttl")]
    pub sentiment_ttl_secs: u64,
}

impl Default for CacheParams {
    fn default() -> Self {
        Self {
            economic_indicators_ttl_secs: default_indicators_ttl(),
            correlations_ttl_secs: default_correlations_ttl(),
            macro_news_ttl_secs: default_macro_news_ttl(),
            network_metrics_ttl_secs: default_network_metrics_ttl(),
            exchange_flows_ttl_secs: default_exchange_flows_ttl(),
            whale_ttl_secs: default_whale_ttl(),
            sentiment_ttl_secs: default_sentiment_ttl(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceParams {
    #[serde(default = "default_pair")]
    pub kraken_pair: String,
    #[serde(default = "default_subreddit")]
    pub subreddit: String,
    #[serde(default = "default_user_agent")]
    pub reddit_user_agent: String,
    #[serde(default)]
    pub newsdata_api_key: Option<String>,
    #[serde(default)]
    pub exchange_wallets: Option<Vec<String>>,
    #[serde(default)]
    pub pushover: Option<PushoverParams>,
}

impl Default for SourceParams {
    fn default() -> Self {
        Self {
            kraken_pair: default_pair(),
            subreddit: default_subreddit(),
            reddit_user_agent: default_user_agent(),
            newsdata_api_key: None,
            exchange_wallets: None,
            pushover: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PushoverParams {
    pub token: String,
    pub user: String,
}

impl BotConfig {
    /// Read and validate a YAML config file. Any failure here is
    /// fatal to startup.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let (buy, sell) = (self.scoring.buy_threshold, self.scoring.sell_threshold);
        if !(0.0 < sell && sell < buy && buy < 1.0) {
            return Err(ConfigError::BadThresholds { buy, sell });
        }
        let t = &self.trading;
        if t.fee_pct < Decimal::ZERO || t.fee_pct >= Decimal::ONE {
            return Err(ConfigError::BadFee);
        }
        if t.max_trade_fraction <= Decimal::ZERO || t.max_trade_fraction > Decimal::ONE {
            return Err(ConfigError::BadTradeFraction);
        }
        if t.initial_usd < Decimal::ZERO || t.initial_btc < Decimal::ZERO {
            return Err(ConfigError::NegativeBalance);
        }
        if matches!(t.initial_avg_price, Some(avg) if avg <= Decimal::ZERO) {
            return Err(ConfigError::BadInitialAvgPrice);
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::BadPollInterval);
        }
        Ok(())
    }
}

fn default_poll_interval() -> u64 {
    60
}
fn default_initial_usd() -> Decimal {
    Decimal::from(10_000)
}
fn default_fee_pct() -> Decimal {
    Decimal::new(5, 3)
}
fn default_min_trade_interval() -> i64 {
    300
}
fn default_min_price_change() -> Decimal {
    Decimal::new(1, 3)
}
fn default_profit_target() -> Decimal {
    Decimal::new(3, 2)
}
fn default_max_trade_fraction() -> Decimal {
    Decimal::new(5, 2)
}
fn default_preset() -> WeightPreset {
    WeightPreset::MultiFactor
}
fn default_buy_threshold() -> f64 {
    0.7
}
fn default_sell_threshold() -> f64 {
    0.3
}
fn default_indicators_ttl() -> u64 {
    24 * 3600
}
fn default_correlations_ttl() -> u64 {
    4 * 3600
}
fn default_macro_news_ttl() -> u64 {
    2 * 3600
}
fn default_network_metrics_ttl() -> u64 {
    4 * 3600
}
fn default_exchange_flows_ttl() -> u64 {
    4 * 3600
}
fn default_whale_ttl() -> u64 {
    6 * 3600
}
fn default_sentiment_ttl() -> u64 {
    3600
}
fn default_pair() -> String {
    String::from("XXBTZUSD")
}
fn default_subreddit() -> String {
    String::from("bitcoin")
}
fn default_user_agent() -> String {
    String::from("btcbot/0.1 (paper trading)")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_file_yields_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{}}").unwrap();
        let config = BotConfig::load(file.path()).unwrap();
        assert_eq!(config.poll_interval_secs, 60);
        assert_eq!(config.scoring.preset, WeightPreset::MultiFactor);
        assert_eq!(config.trading.initial_usd, Decimal::from(10_000));
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "trading:\n  initial_usd: 25000\n  initial_btc: 0.5\n  initial_avg_price: 48000\nscoring:\n  preset: classifier\npoll_interval_secs: 120"
        )
        .unwrap();
        let config = BotConfig::load(file.path()).unwrap();
        assert_eq!(config.trading.initial_usd, Decimal::from(25_000));
        assert_eq!(config.trading.initial_btc, Decimal::new(5, 1));
        assert_eq!(config.trading.initial_avg_price, Some(Decimal::from(48_000)));
        assert_eq!(config.trading.fee_pct, Decimal::new(5, 3));
        assert_eq!(config.scoring.preset, WeightPreset::Classifier);
        assert_eq!(config.poll_interval_secs, 120);
    }

    #[test]
    fn bad_thresholds_fail_validation() {
        let mut config = BotConfig::default();
        config.scoring.buy_threshold = 0.2;
        config.scoring.sell_threshold = 0.3;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BadThresholds { .. })
        ));
    }

    #[test]
    fn non_positive_avg_price_fails_validation() {
        let mut config = BotConfig::default();
        config.trading.initial_avg_price = Some(Decimal::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BadInitialAvgPrice)
        ));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "tradin:\n  initial_usd: 25000").unwrap();
        assert!(BotConfig::load(file.path()).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(BotConfig::load("/nonexistent/config.yaml").is_err());
    }
}
