//! Decision-cycle orchestration
//!
//! One `BotRunner` owns every component and drives the polling loop.
//! A cycle can only ever resolve to a signal; upstream failures
//! degrade to HOLD and the loop keeps ticking. The paper trader is
//! touched from this single task only.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::analyzers::{MacroAnalyzer, OnChainAnalyzer, SentimentAnalyzer, WhaleAnalyzer};
use crate::classifier::{DirectionClassifier, ForestConfig};
use crate::config::BotConfig;
use crate::features::IndicatorFrame;
use crate::indicators::{adx, bollinger_bands, ichimoku, pivot_points};
use crate::market::MarketDataSource;
use crate::notify::{Notifier, PushoverNotifier};
use crate::paper::PaperTrader;
use crate::scoring::{Action, CombinedSignal, FactorInputs, ScoringEngine};
use crate::sources::{
    blockchain_info::DEFAULT_EXCHANGE_WALLETS, BlockchainInfoClient, FearGreedClient,
    KrakenClient, LiveSocialFeed, LiveWhaleFeed, NewsdataClient, RedditClient, SnapshotChainFeed,
    SnapshotMacroFeed,
};

const ADX_PERIOD: usize = 14;

pub struct BotRunner {
    market: Arc<dyn MarketDataSource>,
    macro_analyzer: MacroAnalyzer,
    onchain_analyzer: OnChainAnalyzer,
    sentiment_analyzer: SentimentAnalyzer,
    whale_analyzer: WhaleAnalyzer,
    classifier: DirectionClassifier,
    engine: ScoringEngine,
    trader: PaperTrader,
    notifier: Option<Arc<dyn Notifier>>,
    poll_interval: Duration,
}

impl BotRunner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        market: Arc<dyn MarketDataSource>,
        macro_analyzer: MacroAnalyzer,
        onchain_analyzer: OnChainAnalyzer,
        sentiment_analyzer: SentimentAnalyzer,
        whale_analyzer: WhaleAnalyzer,
        classifier: DirectionClassifier,
        engine: ScoringEngine,
        trader: PaperTrader,
        notifier: Option<Arc<dyn Notifier>>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            market,
            macro_analyzer,
            onchain_analyzer,
            sentiment_analyzer,
            whale_analyzer,
            classifier,
            engine,
            trader,
            notifier,
            poll_interval,
        }
    }

    /// Wire up the live data sources described by the config
    pub fn from_config(config: &BotConfig) -> anyhow::Result<Self> {
        let market = Arc::new(KrakenClient::new(config.sources.kraken_pair.clone())?);

        let macro_feed = Arc::new(SnapshotMacroFeed::new(newsdata_client(config)?));
        let chain_feed = Arc::new(SnapshotChainFeed::new());
        let social_feed = Arc::new(LiveSocialFeed::new(
            FearGreedClient::new()?,
            RedditClient::new(&config.sources.reddit_user_agent)?,
        ));
        let wallets = config.sources.exchange_wallets.clone().unwrap_or_else(|| {
            DEFAULT_EXCHANGE_WALLETS.iter().map(|w| w.to_string()).collect()
        });
        let whale_feed = Arc::new(LiveWhaleFeed::new(
            BlockchainInfoClient::new(wallets)?,
            newsdata_client(config)?,
        ));

        let cache = &config.cache;
        let secs = Duration::from_secs;
        let macro_analyzer = MacroAnalyzer::new(macro_feed).with_ttls(
            secs(cache.economic_indicators_ttl_secs),
            secs(cache.correlations_ttl_secs),
            secs(cache.macro_news_ttl_secs),
        );
        let onchain_analyzer = OnChainAnalyzer::new(chain_feed).with_ttls(
            secs(cache.network_metrics_ttl_secs),
            secs(cache.exchange_flows_ttl_secs),
            secs(cache.whale_ttl_secs),
        );
        let sentiment_analyzer =
            SentimentAnalyzer::new(social_feed, config.sources.subreddit.as_str())
                .with_ttl(secs(cache.sentiment_ttl_secs));
        let whale_analyzer = WhaleAnalyzer::new(whale_feed).with_ttl(secs(cache.whale_ttl_secs));

        let engine = ScoringEngine::new(
            config.scoring.preset.weights(),
            config.scoring.buy_threshold,
            config.scoring.sell_threshold,
        );
        let mut trader = PaperTrader::new(
            config.trading.initial_usd,
            config.trading.initial_btc,
            config.trading.rules(),
        );
        if let Some(avg) = config.trading.initial_avg_price {
            trader = trader.with_entry_price(avg);
        }
        let notifier: Option<Arc<dyn Notifier>> = match &config.sources.pushover {
            Some(push) => Some(Arc::new(PushoverNotifier::new(
                push.token.clone(),
                push.user.clone(),
            )?)),
            None => None,
        };

        Ok(Self::new(
            market,
            macro_analyzer,
            onchain_analyzer,
            sentiment_analyzer,
            whale_analyzer,
            DirectionClassifier::new(ForestConfig::default()),
            engine,
            trader,
            notifier,
            Duration::from_secs(config.poll_interval_secs),
        ))
    }

    pub fn trader(&self) -> &PaperTrader {
        &self.trader
    }

    /// Poll until ctrl-c
    pub async fn run(mut self) -> anyhow::Result<()> {
        info!("starting decision loop, interval {:?}", self.poll_interval);
        let mut ticker = interval(self.poll_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("ctrl-c received, shutting down");
                    break;
                }
            }
        }
        Ok(())
    }

    /// One full decision cycle: fetch, score, fuse, execute
    pub async fn run_cycle(&mut self) -> CombinedSignal {
        let price = self.market.current_price().await;
        let history = self.market.historical_data().await;
        if price <= 0.0 || history.is_empty() {
            warn!("market data unavailable (price={price}, bars={})", history.len());
            return CombinedSignal::hold(price);
        }

        let frame = IndicatorFrame::from_series(&history);

        if !self.classifier.is_trained() {
            match self.classifier.train(&frame) {
                Ok(report) => info!(
                    "classifier trained on {} samples, test accuracy {:.2}",
                    report.samples, report.test_accuracy
                ),
                Err(e) => warn!("classifier training skipped: {e}"),
            }
        }

        let technical = frame
            .latest_features()
            .and_then(|features| self.classifier.predict_proba(&features));
        let trend = Some(if frame.trend_confirmed() { 1.0 } else { 0.0 });
        let adx_value = adx(&history.highs(), &history.lows(), &history.closes(), ADX_PERIOD);

        let (macro_score, onchain_score, sentiment_score, whale_score, news) = tokio::join!(
            self.macro_analyzer.score(),
            self.onchain_analyzer.score(),
            self.sentiment_analyzer.score(),
            self.whale_analyzer.score(),
            self.macro_analyzer.headline_score(),
        );

        let inputs = FactorInputs {
            technical,
            sentiment: Some(sentiment_score.value),
            trend,
            macro_economic: Some(macro_score.value),
            onchain: Some(onchain_score.value),
            adx: Some(adx_value / 100.0),
            news: Some(news),
            whale: Some(whale_score.value),
        };

        let signal = self.engine.fuse(&inputs, price);
        info!(
            "cycle: {} at {:.2} (confidence {:.2})",
            signal.action, signal.price, signal.confidence
        );
        debug!("factors: {}", signal.components);
        self.log_levels(&history);

        if signal.action != Action::Hold {
            match self.trader.execute(&signal) {
                Ok(record) => {
                    let message = format!(
                        "{} {} BTC at {} (confidence {:.2}), balances {} USD / {} BTC",
                        record.action,
                        record.amount_btc,
                        record.price,
                        signal.confidence,
                        record.balance_usd,
                        record.balance_btc,
                    );
                    self.send_notification(&message).await;
                }
                Err(e) => debug!("trade rejected: {e}"),
            }
        }

        signal
    }

    /// Support/resistance context for the cycle log
    fn log_levels(&self, history: &crate::market::OhlcvSeries) {
        let Some(last) = history.last() else {
            return;
        };
        let closes = history.closes();
        let levels = pivot_points(last);
        let (upper, _, lower) = bollinger_bands(&closes, 20, 2.0);
        let lines = ichimoku(&history.highs(), &history.lows(), &closes);
        debug!(
            "levels: pivot {:.2} (s1 {:.2} / r1 {:.2}), bollinger [{:.2}, {:.2}], tenkan {:.2} kijun {:.2}",
            levels.pivot,
            levels.support1,
            levels.resistance1,
            lower.last().copied().unwrap_or(f64::NAN),
            upper.last().copied().unwrap_or(f64::NAN),
            lines.tenkan_sen.last().copied().unwrap_or(f64::NAN),
            lines.kijun_sen.last().copied().unwrap_or(f64::NAN),
        );
    }

    async fn send_notification(&self, message: &str) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        if let Err(e) = notifier.notify(message).await {
            warn!("notification failed: {e}");
        }
    }
}

fn newsdata_client(config: &BotConfig) -> anyhow::Result<Option<NewsdataClient>> {
    config
        .sources
        .newsdata_api_key
        .as_deref()
        .map(NewsdataClient::new)
        .transpose()
}
