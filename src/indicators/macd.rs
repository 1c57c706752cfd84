//! MACD: EMA(12) - EMA(26), with an EMA(9) signal line

use super::ema;

const FAST_SPAN: usize = 12;
const SLOW_SPAN: usize = 26;
const SIGNAL_SPAN: usize = 9;

/// Returns `(macd, signal)` series, both the same length as the input
pub fn macd(closes: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let fast = ema(closes, FAST_SPAN);
    let slow = ema(closes, SLOW_SPAN);
    let line: Vec<f64> = fast.iter().zip(slow.iter()).map(|(f, s)| f - s).collect();
    let signal = ema(&line, SIGNAL_SPAN);
    (line, signal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn flat_series_has_zero_macd() {
        let (line, signal) = macd(&[42.0; 50]);
        assert_relative_eq!(line[49], 0.0);
        assert_relative_eq!(signal[49], 0.0);
    }

    #[test]
    fn uptrend_pushes_macd_positive() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 3.0).collect();
        let (line, signal) = macd(&closes);
        assert!(line[59] > 0.0);
        assert!(signal[59] > 0.0);
        // the fast EMA leads, so the line sits above its smoothed signal
        assert!(line[59] > signal[59]);
    }

    #[test]
    fn output_length_matches_input() {
        let (line, signal) = macd(&[1.0, 2.0]);
        assert_eq!(line.len(), 2);
        assert_eq!(signal.len(), 2);
    }
}
