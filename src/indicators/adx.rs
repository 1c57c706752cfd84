//! Average Directional Index
//!
//! True range -> ATR (rolling mean), per-bar directional movement,
//! +DI/-DI as 100 * rolling-sum(DM) / ATR, DX, and ADX as a rolling
//! mean of DX. Collapses to the latest defined ADX value; 0.0 (not
//! NaN) when the series is too short to produce one.

use super::{rolling_mean, rolling_sum};

pub fn adx(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> f64 {
    let n = closes.len();
    if n < 2 || period == 0 {
        return 0.0;
    }

    let mut tr = vec![f64::NAN; n];
    let mut plus_dm = vec![0.0; n];
    let mut minus_dm = vec![0.0; n];
    for i in 1..n {
        let prev_close = closes[i - 1];
        tr[i] = (highs[i] - lows[i])
            .max((highs[i] - prev_close).abs())
            .max((lows[i] - prev_close).abs());

        let up_move = highs[i] - highs[i - 1];
        let down_move = lows[i - 1] - lows[i];
        if up_move > down_move && up_move > 0.0 {
            plus_dm[i] = up_move;
        }
        if down_move > up_move && down_move > 0.0 {
            minus_dm[i] = down_move;
        }
    }

    let atr = rolling_mean(&tr, period);
    let plus_sum = rolling_sum(&plus_dm, period);
    let minus_sum = rolling_sum(&minus_dm, period);

    let mut dx = vec![f64::NAN; n];
    for i in 0..n {
        if atr[i].is_nan() || atr[i] == 0.0 {
            continue;
        }
        let plus_di = 100.0 * plus_sum[i] / atr[i];
        let minus_di = 100.0 * minus_sum[i] / atr[i];
        let di_sum = plus_di + minus_di;
        if di_sum > 0.0 {
            dx[i] = 100.0 * (plus_di - minus_di).abs() / di_sum;
        }
    }

    rolling_mean(&dx, period)
        .iter()
        .rev()
        .find(|v| !v.is_nan())
        .copied()
        .unwrap_or(0.0)
}
