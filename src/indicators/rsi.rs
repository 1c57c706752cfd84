//! Relative Strength Index
//!
//! Rolling-mean gain/loss ratio: RSI = 100 - 100 / (1 + rs) with
//! rs = avg_gain / (avg_loss + eps). The epsilon keeps an all-gain
//! window from dividing by zero (and pins it near 100).

use super::rolling_mean;

const EPS: f64 = 1e-9;

/// RSI over closes. The first `period` outputs are NaN (the bar-0
/// delta is undefined, then the window has to fill).
pub fn rsi(closes: &[f64], period: usize) -> Vec<f64> {
    let n = closes.len();
    let mut gains = vec![f64::NAN; n];
    let mut losses = vec![f64::NAN; n];
    for i in 1..n {
        let delta = closes[i] - closes[i - 1];
        gains[i] = if delta > 0.0 { delta } else { 0.0 };
        losses[i] = if delta < 0.0 { -delta } else { 0.0 };
    }

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    avg_gain
        .iter()
        .zip(avg_loss.iter())
        .map(|(&g, &l)| {
            if g.is_nan() || l.is_nan() {
                f64::NAN
            } else {
                let rs = g / (l + EPS);
                100.0 - 100.0 / (1.0 + rs)
            }
        })
        .collect()
}
