//! Bollinger Bands: 20-period SMA +/- 2 sample standard deviations

use super::{rolling_mean, rolling_std};

/// Returns `(upper, middle, lower)` series
pub fn bollinger_bands(closes: &[f64], period: usize, k: f64) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let middle = rolling_mean(closes, period);
    let std = rolling_std(closes, period);
    let upper: Vec<f64> = middle
        .iter()
        .zip(std.iter())
        .map(|(m, s)| m + k * s)
        .collect();
    let lower: Vec<f64> = middle
        .iter()
        .zip(std.iter())
        .map(|(m, s)| m - k * s)
        .collect();
    (upper, middle, lower)
}
