//! Relative Strength Index over simple rolling averages.

use super::rolling_mean_opt;

/// RSI of a close series.
///
/// Day-over-day gains and losses are averaged with a plain rolling mean
/// (the first delta counts as zero gain and zero loss), then mapped
/// through `100 - 100 / (1 + rs)`. A window with only gains reads 100, a
/// window with no movement at all has no defined value.
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if closes.is_empty() {
        return Vec::new();
    }

    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());
    gains.push(Some(0.0));
    losses.push(Some(0.0));
    for pair in closes.windows(2) {
        let delta = pair[1] - pair[0];
        gains.push(Some(delta.max(0.0)));
        losses.push(Some((-delta).max(0.0)));
    }

    let avg_gain = rolling_mean_opt(&gains, period);
    let avg_loss = rolling_mean_opt(&losses, period);

    avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(gain, loss)| match (gain, loss) {
            (Some(g), Some(l)) => {
                if *l == 0.0 {
                    if *g > 0.0 {
                        Some(100.0)
                    } else {
                        None
                    }
                } else {
                    let rs = g / l;
                    Some(100.0 - 100.0 / (1.0 + rs))
                }
            }
            _ => None,
        })
        .collect()
}
