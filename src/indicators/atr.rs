//! Average True Range.

use super::rolling_mean_opt;

/// True range per bar: the largest of high-low, |high - previous close|
/// and |low - previous close|. The first bar has no previous close and
/// therefore no true range.
pub fn true_range(highs: &[f64], lows: &[f64], closes: &[f64]) -> Vec<Option<f64>> {
    (0..closes.len())
        .map(|i| {
            if i == 0 {
                return None;
            }
            let prev_close = closes[i - 1];
            let hl = highs[i] - lows[i];
            let hc = (highs[i] - prev_close).abs();
            let lc = (lows[i] - prev_close).abs();
            Some(hl.max(hc).max(lc))
        })
        .collect()
}

/// ATR: rolling mean of the true range. Because the first bar carries no
/// true range, the first defined slot is at index `period`, one later
/// than for plain rolling means.
pub fn atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling_mean_opt(&true_range(highs, lows, closes), period)
}
