//! Technical indicators over OHLCV columns
//!
//! All functions are pure: slices of `f64` in, vectors of `f64` out,
//! no I/O. Undefined windows (insufficient history) are `f64::NAN`
//! sentinels, never errors; consumers filter them before use. The
//! one exception is `adx`, which collapses to a scalar and returns
//! 0.0 when no window has produced a defined value yet.

pub mod adx;
pub mod bollinger;
pub mod ema;
pub mod ichimoku;
pub mod macd;
pub mod momentum;
pub mod pivot;
pub mod rsi;
pub mod stochastic;

pub use adx::adx;
pub use bollinger::bollinger_bands;
pub use ema::ema;
pub use ichimoku::{ichimoku, IchimokuLines};
pub use macd::macd;
pub use momentum::momentum;
pub use pivot::{pivot_points, PivotPoints};
pub use rsi::rsi;
pub use stochastic::stochastic;

/// Rolling mean with a full-window requirement: the first `window - 1`
/// outputs are NaN, and any NaN inside the window poisons the output.
pub(crate) fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, |w| {
        w.iter().sum::<f64>() / w.len() as f64
    })
}

/// Rolling sum, same window semantics as `rolling_mean`
pub(crate) fn rolling_sum(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, |w| w.iter().sum::<f64>())
}

/// Rolling sample standard deviation (ddof = 1)
pub(crate) fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, |w| {
        let n = w.len() as f64;
        let mean = w.iter().sum::<f64>() / n;
        let var = w.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        var.sqrt()
    })
}

/// Rolling maximum
pub(crate) fn rolling_max(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, |w| {
        w.iter().copied().fold(f64::MIN, f64::max)
    })
}

/// Rolling minimum
pub(crate) fn rolling_min(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, |w| {
        w.iter().copied().fold(f64::MAX, f64::min)
    })
}

fn rolling_apply<F>(values: &[f64], window: usize, f: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if window == 0 || n < window {
        return out;
    }
    for i in (window - 1)..n {
        let slice = &values[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[i] = f(slice);
    }
    out
}
