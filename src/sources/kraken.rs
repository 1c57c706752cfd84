//! Kraken public market-data API
//!
//! Only the unauthenticated Ticker and OHLC endpoints are used. Both
//! accessors swallow failures: the trading loop must keep running on a
//! flaky upstream, so a bad fetch yields 0.0 / an empty series and the
//! cycle resolves to HOLD downstream.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use crate::market::{Candle, MarketDataSource, OhlcvSeries};

const DEFAULT_BASE_URL: &str = "https://api.kraken.com";
const REQUEST_TIMEOUT_SECS: u64 = 10;

pub struct KrakenClient {
    client: Client,
    base_url: String,
    pair: String,
}

impl KrakenClient {
    pub fn new(pair: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            pair: pair.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get_json(&self, path: &str) -> anyhow::Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let body: Value = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if let Some(errors) = body.get("error").and_then(Value::as_array) {
            if !errors.is_empty() {
                anyhow::bail!("kraken error: {errors:?}");
            }
        }
        Ok(body)
    }

    async fn fetch_price(&self) -> anyhow::Result<f64> {
        let body = self
            .get_json(&format!("/0/public/Ticker?pair={}", self.pair))
            .await?;
        // Result is keyed by Kraken's canonical pair name; take the
        // first entry rather than guessing the alias
        let result = body
            .get("result")
            .and_then(Value::as_object)
            .ok_or_else(|| anyhow::anyhow!("missing result object"))?;
        let ticker = result
            .values()
            .next()
            .ok_or_else(|| anyhow::anyhow!("empty ticker result"))?;
        let last = ticker
            .get("c")
            .and_then(|c| c.get(0))
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow::anyhow!("missing last-trade field"))?;
        Ok(last.parse::<f64>()?)
    }

    async fn fetch_ohlc(&self) -> anyhow::Result<OhlcvSeries> {
        let body = self
            .get_json(&format!("/0/public/OHLC?pair={}&interval=1", self.pair))
            .await?;
        let result = body
            .get("result")
            .and_then(Value::as_object)
            .ok_or_else(|| anyhow::anyhow!("missing result object"))?;
        // `result` holds the candle array plus a `last` cursor
        let rows = result
            .iter()
            .find(|(k, _)| *k != "last")
            .and_then(|(_, v)| v.as_array())
            .ok_or_else(|| anyhow::anyhow!("missing OHLC rows"))?;

        let mut candles = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(candle) = parse_ohlc_row(row) {
                candles.push(candle);
            }
        }
        Ok(OhlcvSeries::from_candles(candles)?)
    }
}

/// Kraken OHLC row: [time, open, high, low, close, vwap, volume, count]
fn parse_ohlc_row(row: &Value) -> Option<Candle> {
    let fields = row.as_array()?;
    let secs = fields.first()?.as_i64()?;
    let timestamp = Utc.timestamp_opt(secs, 0).single()?;
    let num = |i: usize| -> Option<f64> {
        let v = fields.get(i)?;
        v.as_str()
            .and_then(|s| s.parse().ok())
            .or_else(|| v.as_f64())
    };
    Some(Candle {
        timestamp,
        open: num(1)?,
        high: num(2)?,
        low: num(3)?,
        close: num(4)?,
        volume: num(6)?,
    })
}

#[async_trait]
impl MarketDataSource for KrakenClient {
    async fn current_price(&self) -> f64 {
        match self.fetch_price().await {
            Ok(price) => price,
            Err(e) => {
                warn!("kraken ticker fetch failed: {e}");
                0.0
            }
        }
    }

    async fn historical_data(&self) -> OhlcvSeries {
        match self.fetch_ohlc().await {
            Ok(series) => series,
            Err(e) => {
                warn!("kraken OHLC fetch failed: {e}");
                OhlcvSeries::empty()
            }
        }
    }
}
