//! Bot entry point: logging, config, decision loop

use tracing::info;

use btcbot::{BotConfig, BotRunner};

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = BotConfig::load(&path)
        .map_err(|e| anyhow::anyhow!("failed to load config from {path}: {e}"))?;

    info!(
        "starting paper trading: {} USD, preset {:?}, interval {}s",
        config.trading.initial_usd, config.scoring.preset, config.poll_interval_secs
    );

    let runner = BotRunner::from_config(&config)?;
    runner.run().await
}
