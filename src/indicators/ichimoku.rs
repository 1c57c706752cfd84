//! Ichimoku Cloud
//!
//! Five lines from 9/26/52-period high-low midpoints. Two of them are
//! deliberately offset on the shared time index: senkou span A/B are
//! projected 26 bars FORWARD (the value at index i was computed from
//! bars up to i - 26), and the chikou span is the close shifted 26
//! bars BACKWARD (the value at index i is the close of bar i + 26,
//! i.e. it references the future by construction). Consumers must not
//! treat those two columns as look-ahead-free.

use super::{rolling_max, rolling_min};

const TENKAN_PERIOD: usize = 9;
const KIJUN_PERIOD: usize = 26;
const SENKOU_B_PERIOD: usize = 52;
const SHIFT: usize = 26;

#[derive(Debug, Clone)]
pub struct IchimokuLines {
    pub tenkan_sen: Vec<f64>,
    pub kijun_sen: Vec<f64>,
    /// Forward-shifted by 26 bars
    pub senkou_span_a: Vec<f64>,
    /// Forward-shifted by 26 bars
    pub senkou_span_b: Vec<f64>,
    /// Backward-shifted by 26 bars (references future closes)
    pub chikou_span: Vec<f64>,
}

fn midpoint(highs: &[f64], lows: &[f64], period: usize) -> Vec<f64> {
    let hh = rolling_max(highs, period);
    let ll = rolling_min(lows, period);
    hh.iter().zip(ll.iter()).map(|(h, l)| (h + l) / 2.0).collect()
}

fn shift_forward(values: &[f64], by: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    for i in by..n {
        out[i] = values[i - by];
    }
    out
}

fn shift_backward(values: &[f64], by: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    for i in 0..n.saturating_sub(by) {
        out[i] = values[i + by];
    }
    out
}

pub fn ichimoku(highs: &[f64], lows: &[f64], closes: &[f64]) -> IchimokuLines {
    let tenkan_sen = midpoint(highs, lows, TENKAN_PERIOD);
    let kijun_sen = midpoint(highs, lows, KIJUN_PERIOD);

    let span_a_raw: Vec<f64> = tenkan_sen
        .iter()
        .zip(kijun_sen.iter())
        .map(|(t, k)| (t + k) / 2.0)
        .collect();
    let span_b_raw = midpoint(highs, lows, SENKOU_B_PERIOD);

    IchimokuLines {
        senkou_span_a: shift_forward(&span_a_raw, SHIFT),
        senkou_span_b: shift_forward(&span_b_raw, SHIFT),
        chikou_span: shift_backward(closes, SHIFT),
        tenkan_sen,
        kijun_sen,
    }
}
