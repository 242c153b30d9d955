//! Bollinger bands.

use super::ma::sma;

/// Upper, middle and lower Bollinger bands.
#[derive(Debug, Clone, Default)]
pub struct BollBands {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// Bollinger bands: a rolling mean with bands `num_std` sample standard
/// deviations either side. The standard deviation uses the `n - 1`
/// denominator, so a window of one observation has no bands.
pub fn bollinger(closes: &[f64], period: usize, num_std: f64) -> BollBands {
    let middle = sma(closes, period);
    let std = rolling_sample_std(closes, period);

    let upper = middle
        .iter()
        .zip(&std)
        .map(|(m, s)| match (m, s) {
            (Some(m), Some(s)) => Some(m + num_std * s),
            _ => None,
        })
        .collect();
    let lower = middle
        .iter()
        .zip(&std)
        .map(|(m, s)| match (m, s) {
            (Some(m), Some(s)) => Some(m - num_std * s),
            _ => None,
        })
        .collect();

    BollBands {
        upper,
        middle,
        lower,
    }
}

fn rolling_sample_std(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period < 2 {
        return out;
    }
    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let var = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (period as f64 - 1.0);
        out[i] = Some(var.sqrt());
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
    fn test_bollinger_known_values() {
        let bands = bollinger(&[1.0, 2.0, 3.0], 3, 2.0);

        assert_eq!(bands.middle[..2], [None, None]);
        // window [1, 2, 3]: mean 2, sample variance 1, std 1
        assert!(close_to(bands.middle[2].unwrap(), 2.0));
        assert!(close_to(bands.upper[2].unwrap(), 4.0));
        assert!(close_to(bands.lower[2].unwrap(), 0.0));
    }

    #[test]
    fn test_bollinger_flat_series_collapses_on_middle() {
        let bands = bollinger(&[10.0; 25], 20, 2.0);

        assert!(close_to(bands.upper[24].unwrap(), 10.0));
        assert!(close_to(bands.middle[24].unwrap(), 10.0));
        assert!(close_to(bands.lower[24].unwrap(), 10.0));
    }

    #[test]
    fn test_bollinger_degenerate_window_has_no_bands() {
        let bands = bollinger(&[1.0, 2.0, 3.0], 1, 2.0);
        assert!(bands.upper.iter().all(|v| v.is_none()));
        assert!(bands.middle.iter().all(|v| v.is_some()));
    }
}
