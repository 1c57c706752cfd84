//! Integration tests for the decision cycle

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use crate::analyzers::{MacroAnalyzer, OnChainAnalyzer, SentimentAnalyzer, WhaleAnalyzer};
    use crate::classifier::{DirectionClassifier, ForestConfig};
    use crate::market::{Candle, MarketDataSource, OhlcvSeries};
    use crate::paper::{PaperTrader, TradeRules};
    use crate::runner::BotRunner;
    use crate::scoring::{Action, ScoreWeights, ScoringEngine};
    use crate::sources::{
        ChainDataFeed, EconomicIndicators, ExchangeFlows, FearGreedPoint, MacroDataFeed,
        MarketCorrelations, NetworkMetrics, Post, SnapshotChainFeed, SnapshotMacroFeed,
        SocialFeed, WhaleArticle, WhaleFeed, WhaleStats,
    };

    struct StaticMarket {
        price: f64,
        series: OhlcvSeries,
    }

    #[async_trait]
    impl MarketDataSource for StaticMarket {
        async fn current_price(&self) -> f64 {
            self.price
        }
        async fn historical_data(&self) -> OhlcvSeries {
            self.series.clone()
        }
    }

    struct FixedSocialFeed {
        fng: u32,
    }

    #[async_trait]
    impl SocialFeed for FixedSocialFeed {
        async fn fear_greed(&self, _limit: usize) -> anyhow::Result<Vec<FearGreedPoint>> {
            Ok(vec![FearGreedPoint {
                value: self.fng,
                classification: String::from("n/a"),
                timestamp: Utc::now(),
            }])
        }
        async fn recent_posts(&self, _topic: &str, _limit: usize) -> anyhow::Result<Vec<Post>> {
            Ok(vec![])
        }
    }

    struct QuietWhaleFeed;

    #[async_trait]
    impl WhaleFeed for QuietWhaleFeed {
        async fn exchange_movements(&self) -> anyhow::Result<Vec<crate::sources::WalletMovement>> {
            Ok(vec![])
        }
        async fn treasury_purchases_btc(&self) -> anyhow::Result<f64> {
            Ok(0.0)
        }
        async fn whale_news(&self) -> anyhow::Result<Vec<WhaleArticle>> {
            Ok(vec![])
        }
    }

    struct DownMacroFeed;

    #[async_trait]
    impl MacroDataFeed for DownMacroFeed {
        async fn economic_indicators(&self) -> anyhow::Result<EconomicIndicators> {
            anyhow::bail!("timeout")
        }
        async fn market_correlations(&self) -> anyhow::Result<MarketCorrelations> {
            anyhow::bail!("timeout")
        }
        async fn headline_sentiment(&self, _topic: &str) -> anyhow::Result<f64> {
            anyhow::bail!("timeout")
        }
    }

    struct DownChainFeed;

    #[async_trait]
    impl ChainDataFeed for DownChainFeed {
        async fn network_metrics(&self) -> anyhow::Result<NetworkMetrics> {
            anyhow::bail!("timeout")
        }
        async fn exchange_flows(&self) -> anyhow::Result<ExchangeFlows> {
            anyhow::bail!("timeout")
        }
        async fn whale_stats(&self) -> anyhow::Result<WhaleStats> {
            anyhow::bail!("timeout")
        }
    }

    fn synthetic_series(n: usize) -> OhlcvSeries {
        let candles: Vec<Candle> = (0..n)
            .map(|i| {
                let base = 50_000.0 + (i as f64 * 0.35).sin() * 800.0 + i as f64 * 3.0;
                Candle {
                    timestamp: Utc.timestamp_opt(60 * i as i64, 0).unwrap(),
                    open: base - 10.0,
                    high: base + 50.0 + (i as f64 * 0.9).cos().abs() * 30.0,
                    low: base - 50.0 - (i as f64 * 1.1).sin().abs() * 30.0,
                    close: base,
                    volume: 100.0 + (i as f64 * 0.7).cos() * 40.0,
                }
            })
            .collect();
        OhlcvSeries::from_candles(candles).unwrap()
    }

    fn small_classifier() -> DirectionClassifier {
        DirectionClassifier::new(ForestConfig {
            n_trees: 8,
            max_depth: 5,
            ..Default::default()
        })
    }

    fn trader() -> PaperTrader {
        PaperTrader::new(Decimal::from(10_000), Decimal::ZERO, TradeRules::default())
    }

    fn runner_with(
        market: StaticMarket,
        macro_feed: Arc<dyn MacroDataFeed>,
        chain_feed: Arc<dyn ChainDataFeed>,
        fng: u32,
        engine: ScoringEngine,
    ) -> BotRunner {
        BotRunner::new(
            Arc::new(market),
            MacroAnalyzer::new(macro_feed),
            OnChainAnalyzer::new(chain_feed),
            SentimentAnalyzer::new(Arc::new(FixedSocialFeed { fng }), "bitcoin"),
            WhaleAnalyzer::new(Arc::new(QuietWhaleFeed)),
            small_classifier(),
            engine,
            trader(),
            None,
            Duration::from_secs(60),
        )
    }

    #[tokio::test]
    async fn unavailable_market_resolves_to_hold() {
        let market = StaticMarket {
            price: 0.0,
            series: OhlcvSeries::empty(),
        };
        let mut runner = runner_with(
            market,
            Arc::new(SnapshotMacroFeed::new(None)),
            Arc::new(SnapshotChainFeed::new()),
            50,
            ScoringEngine::new(ScoreWeights::multi_factor(), 0.7, 0.3),
        );
        let signal = runner.run_cycle().await;
        assert_eq!(signal.action, Action::Hold);
        assert_eq!(signal.confidence, 0.5);
        assert!(runner.trader().trades().is_empty());
    }

    #[tokio::test]
    async fn cycle_produces_well_formed_signal() {
        let market = StaticMarket {
            price: 50_500.0,
            series: synthetic_series(300),
        };
        let mut runner = runner_with(
            market,
            Arc::new(SnapshotMacroFeed::new(None)),
            Arc::new(SnapshotChainFeed::new()),
            55,
            ScoringEngine::new(ScoreWeights::multi_factor(), 0.7, 0.3),
        );
        let signal = runner.run_cycle().await;
        assert!((0.0..=1.0).contains(&signal.confidence));
        assert_eq!(signal.price, 50_500.0);
        assert!(signal.components["score"].as_f64().unwrap().is_finite());
    }

    #[tokio::test]
    async fn failing_analyzers_degrade_to_neutral_hold() {
        let market = StaticMarket {
            price: 50_500.0,
            series: synthetic_series(300),
        };
        let mut runner = runner_with(
            market,
            Arc::new(DownMacroFeed),
            Arc::new(DownChainFeed),
            50,
            ScoringEngine::new(ScoreWeights::multi_factor(), 0.7, 0.3),
        );
        let signal = runner.run_cycle().await;
        assert_eq!(signal.action, Action::Hold);
        assert_eq!(signal.components["macro"], 0.5);
        assert_eq!(signal.components["onchain"], 0.5);
        assert!(runner.trader().trades().is_empty());
    }

    #[tokio::test]
    async fn lowered_threshold_executes_a_buy() {
        let market = StaticMarket {
            price: 50_500.0,
            series: synthetic_series(300),
        };
        // bullish book: greed at 80, snapshot macro/chain, easy threshold
        let mut runner = runner_with(
            market,
            Arc::new(SnapshotMacroFeed::new(None)),
            Arc::new(SnapshotChainFeed::new()),
            80,
            ScoringEngine::new(ScoreWeights::multi_factor(), 0.4, 0.1),
        );
        let signal = runner.run_cycle().await;
        assert_eq!(signal.action, Action::Buy);

        let trades = runner.trader().trades();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].amount_usd, Decimal::from(500));
        assert_eq!(runner.trader().usd_balance(), Decimal::new(94975, 1));
    }

    #[tokio::test]
    async fn consecutive_cycles_respect_the_cooldown() {
        let market = StaticMarket {
            price: 50_500.0,
            series: synthetic_series(300),
        };
        let mut runner = runner_with(
            market,
            Arc::new(SnapshotMacroFeed::new(None)),
            Arc::new(SnapshotChainFeed::new()),
            80,
            ScoringEngine::new(ScoreWeights::multi_factor(), 0.4, 0.1),
        );
        runner.run_cycle().await;
        runner.run_cycle().await;
        // second BUY lands inside the 300s window and is rejected
        assert_eq!(runner.trader().trades().len(), 1);
    }
}
