//! Rule-based trading signals derived from the computed indicators.

use super::IndicatorFrame;

pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const RSI_OVERSOLD: f64 = 30.0;

/// Per-bar signal flags. Cross signals fire only on the bar where the
/// relation flips, threshold signals stay up for as long as the
/// condition holds.
#[derive(Debug, Clone, Default)]
pub struct TradeSignals {
    pub macd_golden_cross: Vec<bool>,
    pub macd_death_cross: Vec<bool>,
    pub rsi_overbought: Vec<bool>,
    pub rsi_oversold: Vec<bool>,
    pub boll_upper_break: Vec<bool>,
    pub boll_lower_break: Vec<bool>,
    pub kdj_golden_cross: Vec<bool>,
    pub kdj_death_cross: Vec<bool>,
    pub ma20_golden_cross: Vec<bool>,
    pub ma20_death_cross: Vec<bool>,
}

impl TradeSignals {
    pub fn detect(closes: &[f64], frame: &IndicatorFrame) -> Self {
        let close_opt = to_opt(closes);
        let macd = to_opt(&frame.macd.macd);
        let macd_signal = to_opt(&frame.macd.signal);

        TradeSignals {
            macd_golden_cross: crosses_above(&macd, &macd_signal),
            macd_death_cross: crosses_below(&macd, &macd_signal),
            rsi_overbought: above_level(&frame.rsi14, RSI_OVERBOUGHT),
            rsi_oversold: below_level(&frame.rsi14, RSI_OVERSOLD),
            boll_upper_break: pairwise(&close_opt, &frame.boll.upper, |c, u| c > u),
            boll_lower_break: pairwise(&close_opt, &frame.boll.lower, |c, l| c < l),
            kdj_golden_cross: crosses_above(&frame.kdj.k, &frame.kdj.d),
            kdj_death_cross: crosses_below(&frame.kdj.k, &frame.kdj.d),
            ma20_golden_cross: crosses_above(&close_opt, &frame.ma20),
            ma20_death_cross: crosses_below(&close_opt, &frame.ma20),
        }
    }

    /// Human-readable names of the signals active on bar `index`.
    pub fn active_at(&self, index: usize) -> Vec<&'static str> {
        let flags: [(&Vec<bool>, &'static str); 10] = [
            (&self.macd_golden_cross, "MACD golden cross"),
            (&self.macd_death_cross, "MACD death cross"),
            (&self.rsi_overbought, "RSI overbought"),
            (&self.rsi_oversold, "RSI oversold"),
            (&self.boll_upper_break, "price above upper Bollinger band"),
            (&self.boll_lower_break, "price below lower Bollinger band"),
            (&self.kdj_golden_cross, "KDJ golden cross"),
            (&self.kdj_death_cross, "KDJ death cross"),
            (&self.ma20_golden_cross, "close crossed above MA20"),
            (&self.ma20_death_cross, "close crossed below MA20"),
        ];

        flags
            .iter()
            .filter(|(series, _)| series.get(index).copied().unwrap_or(false))
            .map(|(_, name)| *name)
            .collect()
    }

    /// Signals active on the last bar.
    pub fn latest(&self) -> Vec<&'static str> {
        match self.len() {
            0 => Vec::new(),
            n => self.active_at(n - 1),
        }
    }

    pub fn len(&self) -> usize {
        [
            self.macd_golden_cross.len(),
            self.rsi_overbought.len(),
            self.boll_upper_break.len(),
            self.kdj_golden_cross.len(),
            self.ma20_golden_cross.len(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn to_opt(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().copied().map(Some).collect()
}

fn above_level(series: &[Option<f64>], level: f64) -> Vec<bool> {
    series.iter().map(|v| matches!(v, Some(x) if *x > level)).collect()
}

fn below_level(series: &[Option<f64>], level: f64) -> Vec<bool> {
    series.iter().map(|v| matches!(v, Some(x) if *x < level)).collect()
}

fn pairwise<F>(a: &[Option<f64>], b: &[Option<f64>], cmp: F) -> Vec<bool>
where
    F: Fn(f64, f64) -> bool,
{
    a.iter()
        .zip(b)
        .map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) => cmp(*a, *b),
            _ => false,
        })
        .collect()
}

/// True where `a` moves strictly above `b` after having been at or below
/// it on the previous bar. Bars without both values never fire.
fn crosses_above(a: &[Option<f64>], b: &[Option<f64>]) -> Vec<bool> {
    crosses(a, b, |cur_a, cur_b, prev_a, prev_b| {
        cur_a > cur_b && prev_a <= prev_b
    })
}

fn crosses_below(a: &[Option<f64>], b: &[Option<f64>]) -> Vec<bool> {
    crosses(a, b, |cur_a, cur_b, prev_a, prev_b| {
        cur_a < cur_b && prev_a >= prev_b
    })
}

fn crosses<F>(a: &[Option<f64>], b: &[Option<f64>], rule: F) -> Vec<bool>
where
    F: Fn(f64, f64, f64, f64) -> bool,
{
    let len = a.len().min(b.len());
    (0..len)
        .map(|i| {
            if i == 0 {
                return false;
            }
            match (a[i], b[i], a[i - 1], b[i - 1]) {
                (Some(ca), Some(cb), Some(pa), Some(pb)) => rule(ca, cb, pa, pb),
                _ => false,
            }
        })
        .collect()
}
