//! Floor-trader pivot points from the most recent bar

use crate::market::Candle;

#[derive(Debug, Clone, Copy)]
pub struct PivotPoints {
    pub pivot: f64,
    pub support1: f64,
    pub resistance1: f64,
    pub support2: f64,
    pub resistance2: f64,
}

pub fn pivot_points(last: &Candle) -> PivotPoints {
    let pivot = (last.high + last.low + last.close) / 3.0;
    let range = last.high - last.low;
    PivotPoints {
        pivot,
        support1: 2.0 * pivot - last.high,
        resistance1: 2.0 * pivot - last.low,
        support2: pivot - range,
        resistance2: pivot + range,
    }
}
