//! KDJ stochastic oscillator.

use super::{rolling_max, rolling_min};

/// The K, D and J series of the stochastic oscillator.
#[derive(Debug, Clone, Default)]
pub struct KdjSeries {
    pub k: Vec<Option<f64>>,
    pub d: Vec<Option<f64>>,
    pub j: Vec<Option<f64>>,
}

/// KDJ over OHLC data.
///
/// RSV positions the close inside the highest-high / lowest-low range of
/// the last `k_period` bars. K smooths RSV and D smooths K, both with an
/// exponential mean of smoothing factor `1 / period`. J is `3K - 2D`.
/// Bars whose range collapses to a point carry no RSV and are skipped by
/// the smoothing.
pub fn kdj(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    k_period: usize,
    d_period: usize,
    j_period: usize,
) -> KdjSeries {
    let highest = rolling_max(highs, k_period);
    let lowest = rolling_min(lows, k_period);

    let rsv: Vec<Option<f64>> = (0..closes.len())
        .map(|i| match (highest[i], lowest[i]) {
            (Some(hh), Some(ll)) if hh > ll => Some(100.0 * (closes[i] - ll) / (hh - ll)),
            _ => None,
        })
        .collect();

    let k = ewm_mean_opt(&rsv, 1.0 / d_period as f64);
    let d = ewm_mean_opt(&k, 1.0 / j_period as f64);
    let j = k
        .iter()
        .zip(&d)
        .map(|(k, d)| match (k, d) {
            (Some(k), Some(d)) => Some(3.0 * k - 2.0 * d),
            _ => None,
        })
        .collect();

    KdjSeries { k, d, j }
}

/// KDJ with the standard 9/3/3 parameters.
pub fn kdj_default(highs: &[f64], lows: &[f64], closes: &[f64]) -> KdjSeries {
    kdj(highs, lows, closes, 9, 3, 3)
}

/// Adjusted exponential mean over a gappy series. Undefined slots stay
/// undefined and do not age the accumulated weights.
fn ewm_mean_opt(values: &[Option<f64>], alpha: f64) -> Vec<Option<f64>> {
    let decay = 1.0 - alpha;
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    values
        .iter()
        .map(|slot| {
            slot.map(|value| {
                numerator = value + decay * numerator;
                denominator = 1.0 + decay * denominator;
                numerator / denominator
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close_to(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_kdj_known_values() {
        let highs = [2.0, 3.0, 4.0];
        let lows = [0.0, 1.0, 2.0];
        let closes = [1.0, 2.0, 3.0];
        let out = kdj(&highs, &lows, &closes, 2, 3, 3);

        // Both windows place the close two thirds up the range, so RSV is
        // constant and the smoothed lines sit on it.
        let expected = 200.0 / 3.0;
        assert_eq!(out.k[0], None);
        assert!(close_to(out.k[1].unwrap(), expected));
        assert!(close_to(out.k[2].unwrap(), expected));
        assert!(close_to(out.d[2].unwrap(), expected));
        assert!(close_to(out.j[2].unwrap(), expected));
    }

    #[test]
    fn test_kdj_warm_up_prefix() {
        let series: Vec<f64> = (0..12).map(|i| 10.0 + i as f64).collect();
        let out = kdj_default(&series, &series, &series);

        for i in 0..8 {
            assert_eq!(out.k[i], None, "slot {i} should still be warming up");
        }
        assert!(out.k[8].is_some());
    }

    #[test]
    fn test_kdj_flat_range_is_undefined() {
        let flat = [5.0; 15];
        let out = kdj_default(&flat, &flat, &flat);
        assert!(out.k.iter().all(|v| v.is_none()));
        assert!(out.j.iter().all(|v| v.is_none()));
    }

    #[test]
    fn test_ewm_mean_skips_gaps() {
        let out = ewm_mean_opt(&[None, Some(10.0), None, Some(10.0)], 0.5);
        assert_eq!(out[0], None);
        assert_eq!(out[2], None);
        assert!(close_to(out[3].unwrap(), 10.0));
    }
}
