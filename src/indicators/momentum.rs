//! Momentum: close minus the close `period` bars back

pub fn momentum(closes: &[f64], period: usize) -> Vec<f64> {
    let n = closes.len();
    let mut out = vec![f64::NAN; n];
    for i in period..n {
        out[i] = closes[i] - closes[i - period];
    }
    out
}
