//! Stochastic oscillator %K
//!
//! 100 * (close - lowest_low) / (highest_high - lowest_low) over the
//! rolling window. A zero-range window yields NaN rather than a
//! division blow-up.

use super::{rolling_max, rolling_min};

pub fn stochastic(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Vec<f64> {
    let highest = rolling_max(highs, period);
    let lowest = rolling_min(lows, period);
    closes
        .iter()
        .zip(highest.iter().zip(lowest.iter()))
        .map(|(&c, (&hh, &ll))| {
            if hh.is_nan() || ll.is_nan() {
                return f64::NAN;
            }
            let range = hh - ll;
            if range == 0.0 {
                f64::NAN
            } else {
                100.0 * (c - ll) / range
            }
        })
        .collect()
}
