//! Multi-stock comparison: per-code performance metrics, normalized
//! price series and a close-price correlation matrix.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::DailyBar;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const RISK_FREE_RATE: f64 = 0.03;

/// Period performance of a single code.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceMetrics {
    pub ts_code: String,
    pub start_price: f64,
    pub end_price: f64,
    pub max_price: f64,
    pub min_price: f64,
    pub total_return_pct: f64,
    pub volatility_pct: f64,
    pub max_drawdown_pct: f64,
    pub sharpe_ratio: f64,
    pub avg_volume: f64,
}

impl PerformanceMetrics {
    pub fn from_bars(ts_code: &str, bars: &[DailyBar]) -> Option<PerformanceMetrics> {
        let first = bars.first()?;
        let last = bars.last()?;

        let start_price = first.close;
        let end_price = last.close;
        let max_price = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let min_price = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let avg_volume = bars.iter().map(|b| b.vol).sum::<f64>() / bars.len() as f64;

        let total_return_pct = if start_price != 0.0 {
            (end_price - start_price) / start_price * 100.0
        } else {
            0.0
        };

        let returns = daily_returns(bars);
        let std = sample_std(&returns);
        let volatility_pct = std * TRADING_DAYS_PER_YEAR.sqrt() * 100.0;

        let sharpe_ratio = if std > 0.0 {
            let annualized = mean(&returns) * TRADING_DAYS_PER_YEAR;
            (annualized - RISK_FREE_RATE) / (std * TRADING_DAYS_PER_YEAR.sqrt())
        } else {
            0.0
        };

        Some(PerformanceMetrics {
            ts_code: ts_code.to_string(),
            start_price,
            end_price,
            max_price,
            min_price,
            total_return_pct,
            volatility_pct,
            max_drawdown_pct: max_drawdown_pct(&returns),
            sharpe_ratio,
            avg_volume,
        })
    }
}

/// Close prices rebased to the first bar, in percent. The first slot is
/// always zero.
pub fn normalized_performance(bars: &[DailyBar]) -> Vec<f64> {
    let Some(first) = bars.first() else {
        return Vec::new();
    };
    if first.close == 0.0 {
        return vec![0.0; bars.len()];
    }
    bars.iter()
        .map(|b| (b.close / first.close - 1.0) * 100.0)
        .collect()
}

fn daily_returns(bars: &[DailyBar]) -> Vec<f64> {
    bars.windows(2)
        .filter_map(|pair| {
            if pair[0].close != 0.0 {
                Some((pair[1].close - pair[0].close) / pair[0].close)
            } else {
                None
            }
        })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() as f64 - 1.0);
    var.sqrt()
}

/// Deepest peak-to-trough drop of the cumulative return curve, in
/// percent (zero or negative).
fn max_drawdown_pct(returns: &[f64]) -> f64 {
    let mut cumulative = 1.0;
    let mut peak = f64::NEG_INFINITY;
    let mut worst: f64 = 0.0;
    for r in returns {
        cumulative *= 1.0 + r;
        peak = peak.max(cumulative);
        worst = worst.min((cumulative - peak) / peak);
    }
    worst * 100.0
}

/// Pearson correlations of close prices between every pair of codes.
/// Each pair is computed over the trade dates both codes share; pairs
/// with fewer than two shared dates (or a flat series) stay undefined.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub codes: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn compute(series: &[(String, Vec<DailyBar>)]) -> CorrelationMatrix {
        let by_date: Vec<BTreeMap<&str, f64>> = series
            .iter()
            .map(|(_, bars)| {
                bars.iter()
                    .map(|b| (b.trade_date.as_str(), b.close))
                    .collect()
            })
            .collect();

        let n = series.len();
        let mut values = vec![vec![None; n]; n];
        for i in 0..n {
            values[i][i] = Some(1.0);
            for j in (i + 1)..n {
                let mut xs = Vec::new();
                let mut ys = Vec::new();
                for (date, x) in &by_date[i] {
                    if let Some(y) = by_date[j].get(date) {
                        xs.push(*x);
                        ys.push(*y);
                    }
                }
                let r = pearson(&xs, &ys);
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        CorrelationMatrix {
            codes: series.iter().map(|(code, _)| code.clone()).collect(),
            values,
        }
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.codes.iter().position(|c| c == a)?;
        let j = self.codes.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() < 2 {
        return None;
    }
    let mx = mean(xs);
    let my = mean(ys);
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        cov += (x - mx) * (y - my);
        var_x += (x - mx).powi(2);
        var_y += (y - my).powi(2);
    }
    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        None
    } else {
        Some(cov / denom)
    }
}
