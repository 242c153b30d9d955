//! Simple and exponential moving averages.

use super::rolling_mean_opt;

/// Simple moving average over a fixed window.
///
/// The first `period - 1` slots are `None` because the window is not yet
/// filled, matching the warm-up behaviour of spreadsheet rolling means.
pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let wrapped: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
    rolling_mean_opt(&wrapped, period)
}

/// Exponential moving average with span-based smoothing.
///
/// Uses the adjusted weighting `y_t = sum(w_i * x_i) / sum(w_i)` with
/// `w_i = (1 - alpha)^(t - i)` and `alpha = 2 / (span + 1)`, computed
/// incrementally. Every slot has a value, the early ones are simply
/// averages over fewer observations.
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    if values.is_empty() || span == 0 {
        return Vec::new();
    }
    let alpha = 2.0 / (span as f64 + 1.0);
    let decay = 1.0 - alpha;

    let mut out = Vec::with_capacity(values.len());
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for &value in values {
        numerator = value + decay * numerator;
        denominator = 1.0 + decay * denominator;
        out.push(numerator / denominator);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close_to(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_sma_warm_up_and_values() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let out = sma(&values, 3);

        assert_eq!(out.len(), 5);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert!(close_to(out[2].unwrap(), 2.0));
        assert!(close_to(out[3].unwrap(), 3.0));
        assert!(close_to(out[4].unwrap(), 4.0));
    }

    #[test]
    fn test_sma_window_longer_than_series() {
        let out = sma(&[1.0, 2.0], 5);
        assert_eq!(out, vec![None, None]);
    }

    #[test]
    fn test_ema_known_values() {
        // span = 3 gives alpha = 0.5, so weights halve with each step back.
        let out = ema(&[1.0, 2.0, 3.0], 3);

        assert!(close_to(out[0], 1.0));
        assert!(close_to(out[1], 5.0 / 3.0));
        assert!(close_to(out[2], 4.25 / 1.75));
    }

    #[test]
    fn test_ema_constant_series_stays_constant() {
        let out = ema(&[7.5; 10], 12);
        assert!(out.iter().all(|&v| close_to(v, 7.5)));
    }

    #[test]
    fn test_ema_empty_input() {
        assert!(ema(&[], 12).is_empty());
    }
}
