//! Trend summary for a single bar series.

use serde::Serialize;

use crate::indicators::{last_value, IndicatorFrame, RSI_OVERBOUGHT, RSI_OVERSOLD};
use crate::models::DailyBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiStatus {
    Overbought,
    Oversold,
    Normal,
}

impl RsiStatus {
    pub fn from_value(rsi: f64) -> Self {
        if rsi > RSI_OVERBOUGHT {
            RsiStatus::Overbought
        } else if rsi < RSI_OVERSOLD {
            RsiStatus::Oversold
        } else {
            RsiStatus::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RsiStatus::Overbought => "overbought",
            RsiStatus::Oversold => "oversold",
            RsiStatus::Normal => "normal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MacdStance {
    Bullish,
    Bearish,
}

impl MacdStance {
    pub fn as_str(&self) -> &'static str {
        match self {
            MacdStance::Bullish => "bullish",
            MacdStance::Bearish => "bearish",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MaPosition {
    Above,
    Below,
}

impl MaPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaPosition::Above => "above",
            MaPosition::Below => "below",
        }
    }
}

/// Where the latest close sits relative to each moving average. `None`
/// when the average has not warmed up yet.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MaPositions {
    pub ma5: Option<MaPosition>,
    pub ma10: Option<MaPosition>,
    pub ma20: Option<MaPosition>,
    pub ma60: Option<MaPosition>,
}

/// Period summary of one bar series: price move, range, volume and the
/// state of the main indicators on the latest bar.
#[derive(Debug, Clone, Serialize)]
pub struct TrendReport {
    pub ts_code: String,
    pub latest_price: f64,
    pub price_change: f64,
    pub price_change_pct: f64,
    pub highest_price: f64,
    pub lowest_price: f64,
    pub average_price: f64,
    /// Sample standard deviation of the closes; 0 for a single bar.
    pub price_volatility: f64,
    pub average_volume: f64,
    pub rsi_status: Option<RsiStatus>,
    pub macd_stance: Option<MacdStance>,
    pub ma_positions: MaPositions,
}

impl TrendReport {
    pub fn analyze(bars: &[DailyBar], frame: &IndicatorFrame) -> Option<TrendReport> {
        let first = bars.first()?;
        let latest = bars.last()?;

        let price_change = latest.close - first.close;
        let price_change_pct = if first.close != 0.0 {
            price_change / first.close * 100.0
        } else {
            0.0
        };

        let highest_price = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let lowest_price = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let average_volume = bars.iter().map(|b| b.vol).sum::<f64>() / bars.len() as f64;

        let average_price = bars.iter().map(|b| b.close).sum::<f64>() / bars.len() as f64;
        let price_volatility = if bars.len() > 1 {
            let var = bars
                .iter()
                .map(|b| (b.close - average_price).powi(2))
                .sum::<f64>()
                / (bars.len() - 1) as f64;
            var.sqrt()
        } else {
            0.0
        };

        let macd_stance = match (frame.macd.macd.last(), frame.macd.signal.last()) {
            (Some(m), Some(s)) if m > s => Some(MacdStance::Bullish),
            (Some(_), Some(_)) => Some(MacdStance::Bearish),
            _ => None,
        };

        let position = |series: &[Option<f64>]| {
            series.last().copied().flatten().map(|ma| {
                if latest.close > ma {
                    MaPosition::Above
                } else {
                    MaPosition::Below
                }
            })
        };

        Some(TrendReport {
            ts_code: latest.ts_code.clone(),
            latest_price: latest.close,
            price_change,
            price_change_pct,
            highest_price,
            lowest_price,
            average_price,
            price_volatility,
            average_volume,
            rsi_status: last_value(&frame.rsi14).map(RsiStatus::from_value),
            macd_stance,
            ma_positions: MaPositions {
                ma5: position(&frame.ma5),
                ma10: position(&frame.ma10),
                ma20: position(&frame.ma20),
                ma60: position(&frame.ma60),
            },
        })
    }

    pub fn direction(&self) -> &'static str {
        if self.price_change_pct > 0.0 {
            "up"
        } else if self.price_change_pct < 0.0 {
            "down"
        } else {
            "flat"
        }
    }
}
