//! MACD convergence/divergence indicator.

use super::ma::ema;

pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// The three MACD series: the difference line, its signal line and the
/// histogram between them.
#[derive(Debug, Clone, Default)]
pub struct MacdOutput {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// MACD of a close series: `macd = ema(fast) - ema(slow)`, the signal is
/// an EMA of the macd line and the histogram is their difference.
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal_span: usize) -> MacdOutput {
    let fast_line = ema(closes, fast);
    let slow_line = ema(closes, slow);

    let macd_line: Vec<f64> = fast_line
        .iter()
        .zip(&slow_line)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema(&macd_line, signal_span);
    let histogram: Vec<f64> = macd_line
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| m - s)
        .collect();

    MacdOutput {
        macd: macd_line,
        signal: signal_line,
        histogram,
    }
}

/// MACD with the standard 12/26/9 parameters.
pub fn macd_default(closes: &[f64]) -> MacdOutput {
    macd(closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close_to(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_macd_small_spans() {
        // fast span 1 tracks the input exactly, slow span 3 lags it, and
        // signal span 1 copies the macd line so the histogram is zero.
        let out = macd(&[1.0, 2.0, 3.0], 1, 3, 1);

        assert!(close_to(out.macd[0], 0.0));
        assert!(close_to(out.macd[1], 2.0 - 5.0 / 3.0));
        assert!(close_to(out.macd[2], 3.0 - 4.25 / 1.75));
        for i in 0..3 {
            assert!(close_to(out.signal[i], out.macd[i]));
            assert!(close_to(out.histogram[i], 0.0));
        }
    }

    #[test]
    fn test_macd_constant_series_is_flat() {
        let out = macd_default(&[50.0; 40]);
        assert!(out.macd.iter().all(|&v| close_to(v, 0.0)));
        assert!(out.signal.iter().all(|&v| close_to(v, 0.0)));
        assert!(out.histogram.iter().all(|&v| close_to(v, 0.0)));
    }

    #[test]
    fn test_macd_output_lengths_match_input() {
        let closes: Vec<f64> = (0..30).map(|i| 10.0 + i as f64 * 0.1).collect();
        let out = macd_default(&closes);
        assert_eq!(out.macd.len(), 30);
        assert_eq!(out.signal.len(), 30);
        assert_eq!(out.histogram.len(), 30);
    }
}
