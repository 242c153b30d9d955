//! Technical indicators computed over daily bars.
//!
//! Every series is index-aligned with the input bars. Slots where an
//! indicator is still warming up (or mathematically undefined, such as a
//! zero-range stochastic window) are `None`; exponential averages are
//! defined from the first bar and use plain `f64`.

pub mod atr;
pub mod boll;
pub mod kdj;
pub mod ma;
pub mod macd;
pub mod osc;
pub mod rsi;
pub mod signals;

pub use atr::*;
pub use boll::*;
pub use kdj::*;
pub use ma::*;
pub use macd::*;
pub use osc::*;
pub use rsi::*;
pub use signals::*;

use crate::models::DailyBar;

/// Rolling mean over a gappy series. A window containing any undefined
/// slot yields an undefined mean.
pub fn rolling_mean_opt(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }
    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        let mut sum = 0.0;
        let mut complete = true;
        for slot in window {
            match slot {
                Some(v) => sum += v,
                None => {
                    complete = false;
                    break;
                }
            }
        }
        if complete {
            out[i] = Some(sum / period as f64);
        }
    }
    out
}

/// Highest value inside each rolling window.
pub fn rolling_max(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling_fold(values, period, f64::NEG_INFINITY, f64::max)
}

/// Lowest value inside each rolling window.
pub fn rolling_min(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling_fold(values, period, f64::INFINITY, f64::min)
}

fn rolling_fold(
    values: &[f64],
    period: usize,
    init: f64,
    fold: fn(f64, f64) -> f64,
) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }
    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        out[i] = Some(window.iter().copied().fold(init, fold));
    }
    out
}

pub fn closes(bars: &[DailyBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

pub fn highs(bars: &[DailyBar]) -> Vec<f64> {
    bars.iter().map(|b| b.high).collect()
}

pub fn lows(bars: &[DailyBar]) -> Vec<f64> {
    bars.iter().map(|b| b.low).collect()
}

pub fn volumes(bars: &[DailyBar]) -> Vec<f64> {
    bars.iter().map(|b| b.vol).collect()
}

/// All standard indicators for one bar series, computed in one pass.
#[derive(Debug, Clone, Default)]
pub struct IndicatorFrame {
    pub ma5: Vec<Option<f64>>,
    pub ma10: Vec<Option<f64>>,
    pub ma20: Vec<Option<f64>>,
    pub ma60: Vec<Option<f64>>,
    pub ema12: Vec<f64>,
    pub ema26: Vec<f64>,
    pub macd: MacdOutput,
    pub rsi14: Vec<Option<f64>>,
    pub boll: BollBands,
    pub kdj: KdjSeries,
    pub atr14: Vec<Option<f64>>,
    pub wr14: Vec<Option<f64>>,
    pub cci20: Vec<Option<f64>>,
}

impl IndicatorFrame {
    pub fn compute(bars: &[DailyBar]) -> Self {
        let closes = closes(bars);
        let highs = highs(bars);
        let lows = lows(bars);

        IndicatorFrame {
            ma5: sma(&closes, 5),
            ma10: sma(&closes, 10),
            ma20: sma(&closes, 20),
            ma60: sma(&closes, 60),
            ema12: ema(&closes, 12),
            ema26: ema(&closes, 26),
            macd: macd_default(&closes),
            rsi14: rsi(&closes, 14),
            boll: bollinger(&closes, 20, 2.0),
            kdj: kdj_default(&highs, &lows, &closes),
            atr14: atr(&highs, &lows, &closes, 14),
            wr14: williams_r(&highs, &lows, &closes, 14),
            cci20: cci(&highs, &lows, &closes, 20),
        }
    }

    pub fn len(&self) -> usize {
        self.ema12.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ema12.is_empty()
    }
}

/// Last defined value of an optional series.
pub fn last_value(series: &[Option<f64>]) -> Option<f64> {
    series.iter().rev().find_map(|v| *v)
}
