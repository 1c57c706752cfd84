//! Market data types and the source interface the engine consumes

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single OHLCV bar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Errors building a series from raw bars
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("candle timestamps must be strictly increasing (index {0})")]
    NonMonotonicTimestamps(usize),
}

/// Time-ordered OHLCV series. Timestamps are strictly increasing;
/// duplicates are rejected at construction. The engine only reads it.
#[derive(Debug, Clone, Default)]
pub struct OhlcvSeries {
    candles: Vec<Candle>,
}

impl OhlcvSeries {
    /// Empty series (the degraded result of a failed fetch)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a series, validating timestamp ordering
    pub fn from_candles(candles: Vec<Candle>) -> Result<Self, SeriesError> {
        for (i, pair) in candles.windows(2).enumerate() {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(SeriesError::NonMonotonicTimestamps(i + 1));
            }
        }
        Ok(Self { candles })
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn opens(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.open).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.low).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.volume).collect()
    }
}

/// Market data source. Implementations degrade instead of failing:
/// 0.0 for an unavailable price, an empty series for missing history.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Latest trade price, 0.0 when the upstream is unavailable
    async fn current_price(&self) -> f64;

    /// Recent OHLCV history, empty when the upstream is unavailable
    async fn historical_data(&self) -> OhlcvSeries;
}
