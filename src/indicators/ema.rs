//! Exponential moving average
//!
//! Adjust-free recursive form: ema[i] = alpha * x[i] + (1 - alpha) *
//! ema[i-1], alpha = 2 / (span + 1). The recursion starts at the
//! first finite input; leading NaNs stay NaN and an interior NaN
//! carries the previous EMA forward (relevant when smoothing a
//! column like the stochastic that has an undefined warmup).

pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if n == 0 || span == 0 {
        return out;
    }
    let alpha = 2.0 / (span as f64 + 1.0);

    let mut prev: Option<f64> = None;
    for (i, &x) in values.iter().enumerate() {
        match prev {
            None => {
                if !x.is_nan() {
                    prev = Some(x);
                    out[i] = x;
                }
            }
            Some(p) => {
                let next = if x.is_nan() { p } else { alpha * x + (1.0 - alpha) * p };
                prev = Some(next);
                out[i] = next;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn constant_input_is_identity() {
        let out = ema(&[5.0; 10], 12);
        for v in out {
            assert_relative_eq!(v, 5.0);
        }
    }

    #[test]
    fn matches_recursive_definition() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let out = ema(&xs, 3);
        let alpha = 0.5;
        assert_relative_eq!(out[0], 1.0);
        assert_relative_eq!(out[1], alpha * 2.0 + (1.0 - alpha) * 1.0);
        assert_relative_eq!(out[2], alpha * 3.0 + (1.0 - alpha) * out[1]);
        assert_relative_eq!(out[3], alpha * 4.0 + (1.0 - alpha) * out[2]);
    }

    #[test]
    fn leading_nans_are_preserved() {
        let xs = [f64::NAN, f64::NAN, 10.0, 12.0];
        let out = ema(&xs, 9);
        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
        assert_relative_eq!(out[2], 10.0);
        assert!(!out[3].is_nan());
    }
}
