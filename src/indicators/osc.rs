//! Range oscillators: Williams %R and the Commodity Channel Index.

use super::{rolling_max, rolling_mean_opt, rolling_min};

/// Williams %R: where the close sits in the high/low range of the last
/// `period` bars, scaled to [-100, 0]. A range that collapses to a point
/// leaves the slot undefined.
pub fn williams_r(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let highest = rolling_max(highs, period);
    let lowest = rolling_min(lows, period);

    (0..closes.len())
        .map(|i| match (highest[i], lowest[i]) {
            (Some(hh), Some(ll)) if hh > ll => Some(-100.0 * (hh - closes[i]) / (hh - ll)),
            _ => None,
        })
        .collect()
}

/// CCI: deviation of the typical price from its rolling mean, scaled by
/// 0.015 times the mean absolute deviation inside the window.
pub fn cci(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let typical: Vec<f64> = (0..closes.len())
        .map(|i| (highs[i] + lows[i] + closes[i]) / 3.0)
        .collect();
    let wrapped: Vec<Option<f64>> = typical.iter().copied().map(Some).collect();
    let sma_tp = rolling_mean_opt(&wrapped, period);

    (0..typical.len())
        .map(|i| {
            let mean = sma_tp[i]?;
            let window = &typical[i + 1 - period..=i];
            let mad = window.iter().map(|v| (v - mean).abs()).sum::<f64>() / period as f64;
            if mad == 0.0 {
                None
            } else {
                Some((typical[i] - mean) / (0.015 * mad))
            }
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
    fn test_williams_r_range_position() {
        let highs = [10.0, 10.0, 10.0];
        let lows = [6.0, 6.0, 6.0];

        // Close on the high, the low and the midpoint.
        let at_high = williams_r(&highs, &lows, &[7.0, 8.0, 10.0], 3);
        let at_low = williams_r(&highs, &lows, &[7.0, 8.0, 6.0], 3);
        let at_mid = williams_r(&highs, &lows, &[7.0, 8.0, 8.0], 3);

        assert_eq!(at_high[1], None);
        assert!(close_to(at_high[2].unwrap(), 0.0));
        assert!(close_to(at_low[2].unwrap(), -100.0));
        assert!(close_to(at_mid[2].unwrap(), -50.0));
    }

    #[test]
    fn test_williams_r_flat_range_is_undefined() {
        let flat = [5.0; 6];
        let out = williams_r(&flat, &flat, &flat, 3);
        assert!(out.iter().all(|v| v.is_none()));
    }

    #[test]
    fn test_cci_linear_ramp_reads_100() {
        // A steady ramp ends each window exactly one mean absolute
        // deviation above the mean, which the 0.015 scale maps to 100.
        let highs = [2.0, 3.0, 4.0];
        let lows = [0.0, 1.0, 2.0];
        let closes = [1.0, 2.0, 3.0];
        let out = cci(&highs, &lows, &closes, 3);

        assert_eq!(out[1], None);
        assert!(close_to(out[2].unwrap(), 100.0));
    }

    #[test]
    fn test_cci_flat_window_is_undefined() {
        let flat = [4.0; 5];
        let out = cci(&flat, &flat, &flat, 3);
        assert!(out.iter().all(|v| v.is_none()));
    }
}
