//! Indicator frame: OHLCV series extended with derived columns
//!
//! Every derived column at index i depends only on bars <= i, so the
//! feature matrix is free of look-ahead. (The Ichimoku spans are the
//! documented exception and are not part of the feature set.)

use crate::indicators::{ema, macd, momentum, rolling_mean, rolling_std, rsi, stochastic};
use crate::market::OhlcvSeries;

pub const RSI_PERIOD: usize = 14;
pub const MOMENTUM_PERIOD: usize = 10;
pub const STOCHASTIC_PERIOD: usize = 14;
pub const VOLATILITY_WINDOW: usize = 20;
pub const TREND_FAST: usize = 20;
pub const TREND_SLOW: usize = 50;
const STOCH_EMA_SPAN: usize = 20;

/// Classifier feature columns, in matrix order
pub const FEATURE_NAMES: [&str; 10] = [
    "rsi",
    "macd",
    "macd_signal",
    "price_change",
    "price_volatility",
    "volume_ratio",
    "trend",
    "momentum",
    "ema_stochastic",
    "stochastic",
];

/// Derived columns over one OHLCV series
#[derive(Debug, Clone)]
pub struct IndicatorFrame {
    closes: Vec<f64>,
    volumes: Vec<f64>,
    pub rsi: Vec<f64>,
    pub macd: Vec<f64>,
    pub macd_signal: Vec<f64>,
    pub price_change: Vec<f64>,
    pub price_volatility: Vec<f64>,
    pub volume_ratio: Vec<f64>,
    pub trend: Vec<f64>,
    pub momentum: Vec<f64>,
    pub ema_stochastic: Vec<f64>,
    pub stochastic: Vec<f64>,
}

impl IndicatorFrame {
    pub fn from_series(series: &OhlcvSeries) -> Self {
        let closes = series.closes();
        let highs = series.highs();
        let lows = series.lows();
        let volumes = series.volumes();
        let n = closes.len();

        let (macd_line, macd_sig) = macd(&closes);

        let mut price_change = vec![f64::NAN; n];
        for i in 1..n {
            if closes[i - 1] != 0.0 {
                price_change[i] = (closes[i] - closes[i - 1]) / closes[i - 1];
            }
        }

        let volume_ma = rolling_mean(&volumes, VOLATILITY_WINDOW);
        let volume_ratio: Vec<f64> = volumes
            .iter()
            .zip(volume_ma.iter())
            .map(|(v, ma)| if *ma > 0.0 { v / ma } else { f64::NAN })
            .collect();

        let sma_fast = rolling_mean(&closes, TREND_FAST);
        let sma_slow = rolling_mean(&closes, TREND_SLOW);
        let trend: Vec<f64> = sma_fast
            .iter()
            .zip(sma_slow.iter())
            .map(|(f, s)| {
                if f.is_nan() || s.is_nan() {
                    f64::NAN
                } else if f > s {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();

        let stoch = stochastic(&highs, &lows, &closes, STOCHASTIC_PERIOD);
        let ema_stoch = ema(&stoch, STOCH_EMA_SPAN);

        Self {
            rsi: rsi(&closes, RSI_PERIOD),
            macd: macd_line,
            macd_signal: macd_sig,
            price_change,
            price_volatility: rolling_std(&closes, VOLATILITY_WINDOW),
            volume_ratio,
            trend,
            momentum: momentum(&closes, MOMENTUM_PERIOD),
            ema_stochastic: ema_stoch,
            stochastic: stoch,
            closes,
            volumes,
        }
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    /// Feature vector for bar i, None while any column is still warming up
    pub fn feature_row(&self, i: usize) -> Option<Vec<f64>> {
        if i >= self.len() {
            return None;
        }
        let row = vec![
            self.rsi[i],
            self.macd[i],
            self.macd_signal[i],
            self.price_change[i],
            self.price_volatility[i],
            self.volume_ratio[i],
            self.trend[i],
            self.momentum[i],
            self.ema_stochastic[i],
            self.stochastic[i],
        ];
        if row.iter().any(|v| v.is_nan()) {
            None
        } else {
            Some(row)
        }
    }

    /// Latest complete feature vector, if the series is long enough
    pub fn latest_features(&self) -> Option<Vec<f64>> {
        self.len().checked_sub(1).and_then(|i| self.feature_row(i))
    }

    /// Training matrix with direction labels: 1.0 when the NEXT bar
    /// closes higher on higher volume, else 0.0. NaN rows dropped.
    pub fn training_rows(&self) -> (Vec<Vec<f64>>, Vec<f64>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        if self.len() < 2 {
            return (features, labels);
        }
        for i in 0..self.len() - 1 {
            if let Some(row) = self.feature_row(i) {
                let up = self.closes[i + 1] > self.closes[i]
                    && self.volumes[i + 1] > self.volumes[i];
                features.push(row);
                labels.push(if up { 1.0 } else { 0.0 });
            }
        }
        (features, labels)
    }

    /// Whether the last bar sits in a confirmed uptrend (SMA20 > SMA50)
    pub fn trend_confirmed(&self) -> bool {
        self.trend.last().map(|t| *t == 1.0).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::Candle;
    use chrono::{TimeZone, Utc};

    pub(crate) fn synthetic_series(n: usize) -> OhlcvSeries {
        let candles: Vec<Candle> = (0..n)
            .map(|i| {
                let base = 50000.0 + (i as f64 * 0.35).sin() * 800.0 + i as f64 * 3.0;
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

    #[test]
    fn short_series_yields_no_rows() {
        let frame = IndicatorFrame::from_series(&synthetic_series(10));
        assert!(frame.latest_features().is_none());
        let (features, labels) = frame.training_rows();
        assert!(features.is_empty());
        assert!(labels.is_empty());
    }

    #[test]
    fn long_series_yields_complete_rows() {
        let frame = IndicatorFrame::from_series(&synthetic_series(200));
        let row = frame.latest_features().expect("warmed-up frame");
        assert_eq!(row.len(), FEATURE_NAMES.len());
        assert!(row.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn labels_align_with_next_bar_direction() {
        let frame = IndicatorFrame::from_series(&synthetic_series(120));
        let (features, labels) = frame.training_rows();
        assert_eq!(features.len(), labels.len());
        assert!(!labels.is_empty());
        assert!(labels.iter().all(|l| *l == 0.0 || *l == 1.0));
    }

    #[test]
    fn trend_flag_is_binary_after_warmup() {
        let frame = IndicatorFrame::from_series(&synthetic_series(120));
        for v in frame.trend.iter().skip(TREND_SLOW) {
            assert!(*v == 0.0 || *v == 1.0);
        }
    }
}
