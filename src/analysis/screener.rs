//! Two-stage stock screener: fundamental filters first, then a
//! technical pass over recent bars, finished with a composite score.

use chrono::NaiveDate;
use serde::Serialize;

use crate::indicators::{last_value, IndicatorFrame};
use crate::models::{DailyBar, DailyBasic, StockBasic};
use crate::utils::years_since_compact;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaTrend {
    Bullish,
    Bearish,
    Any,
}

impl std::str::FromStr for MaTrend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bullish" => Ok(MaTrend::Bullish),
            "bearish" => Ok(MaTrend::Bearish),
            "any" => Ok(MaTrend::Any),
            other => Err(format!("unknown trend filter: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScreenCriteria {
    /// Minimum total market value in 100M CNY.
    pub min_market_cap: f64,
    pub max_pe: f64,
    pub min_years_listed: f64,
    pub industries: Option<Vec<String>>,
    pub rsi_range: (f64, f64),
    pub ma_trend: MaTrend,
    pub require_volume_increase: bool,
    /// Upper bound on candidates entering the per-stock technical pass,
    /// which costs one API call each.
    pub max_technical_candidates: usize,
    pub top_n: usize,
}

impl Default for ScreenCriteria {
    fn default() -> Self {
        ScreenCriteria {
            min_market_cap: 50.0,
            max_pe: 30.0,
            min_years_listed: 3.0,
            industries: None,
            rsi_range: (30.0, 70.0),
            ma_trend: MaTrend::Bullish,
            require_volume_increase: true,
            max_technical_candidates: 100,
            top_n: 20,
        }
    }
}

/// One stock that survived both passes, with the fields the ranking and
/// the result listing need.
#[derive(Debug, Clone, Serialize)]
pub struct ScreenCandidate {
    pub ts_code: String,
    pub name: String,
    pub industry: Option<String>,
    pub years_listed: f64,
    pub pe: Option<f64>,
    pub market_cap: Option<f64>,
    pub close: f64,
    pub rsi: Option<f64>,
    pub ma5: Option<f64>,
    pub ma20: Option<f64>,
    pub score: f64,
    pub score_details: String,
}

/// Fundamental filter: no ST names, long enough listing history, an
/// optional industry whitelist, and valuation bounds from the daily
/// basics. Stocks without a positive PE (loss-makers or missing data)
/// do not pass a PE cap.
pub fn passes_fundamental(
    stock: &StockBasic,
    basic: Option<&DailyBasic>,
    criteria: &ScreenCriteria,
    today: NaiveDate,
) -> bool {
    if stock.is_st() {
        return false;
    }

    let years = stock
        .list_date
        .as_deref()
        .and_then(|d| years_since_compact(d, today));
    match years {
        Some(y) if y >= criteria.min_years_listed => {}
        _ => return false,
    }

    if let Some(industries) = &criteria.industries {
        match &stock.industry {
            Some(industry) if industries.iter().any(|i| i == industry) => {}
            _ => return false,
        }
    }

    let Some(basic) = basic else { return false };
    match basic.pe {
        Some(pe) if pe > 0.0 && pe <= criteria.max_pe => {}
        _ => return false,
    }
    match basic.total_mv_yi() {
        Some(mv) if mv >= criteria.min_market_cap => {}
        _ => return false,
    }

    true
}

/// Latest-bar view used by the technical filter and the scoring.
#[derive(Debug, Clone, Copy)]
pub struct TechSnapshot {
    pub close: f64,
    pub rsi: Option<f64>,
    pub ma5: Option<f64>,
    pub ma20: Option<f64>,
    pub recent_volume: f64,
    pub previous_volume: f64,
}

/// Snapshot of the latest bar. Needs at least 20 bars so the averages
/// and the volume windows are meaningful.
pub fn technical_snapshot(bars: &[DailyBar], frame: &IndicatorFrame) -> Option<TechSnapshot> {
    if bars.len() < 20 {
        return None;
    }
    let latest = bars.last()?;
    let n = bars.len();

    let window_mean =
        |slice: &[DailyBar]| slice.iter().map(|b| b.vol).sum::<f64>() / slice.len() as f64;

    Some(TechSnapshot {
        close: latest.close,
        rsi: last_value(&frame.rsi14),
        ma5: frame.ma5.last().copied().flatten(),
        ma20: frame.ma20.last().copied().flatten(),
        recent_volume: window_mean(&bars[n - 5..]),
        previous_volume: window_mean(&bars[n - 10..n - 5]),
    })
}

pub fn passes_technical(snapshot: &TechSnapshot, criteria: &ScreenCriteria) -> bool {
    if let Some(rsi) = snapshot.rsi {
        if rsi < criteria.rsi_range.0 || rsi > criteria.rsi_range.1 {
            return false;
        }
    }

    match criteria.ma_trend {
        MaTrend::Any => {}
        MaTrend::Bullish => match (snapshot.ma5, snapshot.ma20) {
            (Some(ma5), Some(ma20)) if snapshot.close > ma5 && ma5 > ma20 => {}
            _ => return false,
        },
        MaTrend::Bearish => match (snapshot.ma5, snapshot.ma20) {
            (Some(ma5), Some(ma20)) if snapshot.close < ma5 && ma5 < ma20 => {}
            _ => return false,
        },
    }

    if criteria.require_volume_increase
        && snapshot.recent_volume <= snapshot.previous_volume * 1.2
    {
        return false;
    }

    true
}

/// Composite score: one base point, up to two for an RSI near the
/// middle of its band, up to two for a rising average stack and up to
/// one for listing age.
pub fn composite_score(snapshot: &TechSnapshot, years_listed: f64) -> (f64, String) {
    let mut score = 1.0;
    let mut details = vec!["base:1".to_string()];

    if let Some(rsi) = snapshot.rsi {
        let rsi_score = if (40.0..=60.0).contains(&rsi) {
            2.0
        } else if (30.0..=70.0).contains(&rsi) {
            1.0
        } else {
            0.0
        };
        score += rsi_score;
        details.push(format!("RSI:{rsi_score}"));
    }

    if let (Some(ma5), Some(ma20)) = (snapshot.ma5, snapshot.ma20) {
        let ma_score = if snapshot.close > ma5 && ma5 > ma20 {
            2.0
        } else if snapshot.close > ma20 {
            1.0
        } else {
            0.0
        };
        score += ma_score;
        details.push(format!("MA:{ma_score}"));
    }

    let time_score = if years_listed >= 10.0 {
        1.0
    } else if years_listed >= 5.0 {
        0.5
    } else {
        0.0
    };
    score += time_score;
    details.push(format!("listed:{time_score}"));

    (score, details.join(", "))
}

/// Sort candidates by score, best first, and keep the top N.
pub fn rank_candidates(mut candidates: Vec<ScreenCandidate>, top_n: usize) -> Vec<ScreenCandidate> {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.ts_code.cmp(&b.ts_code))
    });
    candidates.truncate(top_n);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock(name: &str, list_date: &str, industry: &str) -> StockBasic {
        StockBasic {
            ts_code: "000001.SZ".to_string(),
            symbol: Some("000001".to_string()),
            name: name.to_string(),
            area: None,
            industry: Some(industry.to_string()),
            market: None,
            exchange: None,
            list_status: Some("L".to_string()),
            list_date: Some(list_date.to_string()),
        }
    }

    fn daily_basic(pe: Option<f64>, total_mv_wan: Option<f64>) -> DailyBasic {
        DailyBasic {
            ts_code: "000001.SZ".to_string(),
            trade_date: "20230601".to_string(),
            close: Some(12.0),
            turnover_rate: None,
            volume_ratio: None,
            pe,
            pe_ttm: None,
            pb: None,
            total_share: None,
            float_share: None,
            total_mv: total_mv_wan,
            circ_mv: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()
    }

    #[test]
    fn test_fundamental_filters() {
        let criteria = ScreenCriteria::default();
        // 600k 万元 = 60亿 market cap, PE 15.
        let good_basic = daily_basic(Some(15.0), Some(600_000.0));

        let good = stock("平安银行", "19910403", "银行");
        assert!(passes_fundamental(&good, Some(&good_basic), &criteria, today()));

        let st = stock("*ST平安", "19910403", "银行");
        assert!(!passes_fundamental(&st, Some(&good_basic), &criteria, today()));

        let young = stock("新股", "20220101", "银行");
        assert!(!passes_fundamental(&young, Some(&good_basic), &criteria, today()));

        let pricey = daily_basic(Some(80.0), Some(600_000.0));
        assert!(!passes_fundamental(&good, Some(&pricey), &criteria, today()));

        let small = daily_basic(Some(15.0), Some(100_000.0));
        assert!(!passes_fundamental(&good, Some(&small), &criteria, today()));

        let loss_maker = daily_basic(None, Some(600_000.0));
        assert!(!passes_fundamental(&good, Some(&loss_maker), &criteria, today()));

        assert!(!passes_fundamental(&good, None, &criteria, today()));
    }

    #[test]
    fn test_fundamental_industry_whitelist() {
        let criteria = ScreenCriteria {
            industries: Some(vec!["银行".to_string()]),
            ..Default::default()
        };
        let basic = daily_basic(Some(10.0), Some(600_000.0));

        assert!(passes_fundamental(&stock("平安银行", "20100101", "银行"), Some(&basic), &criteria, today()));
        assert!(!passes_fundamental(&stock("贵州茅台", "20100101", "白酒"), Some(&basic), &criteria, today()));
    }

    #[test]
    fn test_technical_pass_rules() {
        let criteria = ScreenCriteria::default();
        let mut snapshot = TechSnapshot {
            close: 12.0,
            rsi: Some(50.0),
            ma5: Some(11.5),
            ma20: Some(11.0),
            recent_volume: 1500.0,
            previous_volume: 1000.0,
        };
        assert!(passes_technical(&snapshot, &criteria));

        snapshot.rsi = Some(80.0);
        assert!(!passes_technical(&snapshot, &criteria));
        snapshot.rsi = Some(50.0);

        // Break the bullish stack: ma5 below ma20.
        snapshot.ma5 = Some(10.5);
        assert!(!passes_technical(&snapshot, &criteria));
        snapshot.ma5 = Some(11.5);

        // Volume up only 10%, below the 20% bar.
        snapshot.recent_volume = 1100.0;
        assert!(!passes_technical(&snapshot, &criteria));
    }

    #[test]
    fn test_composite_score_breakdown() {
        let snapshot = TechSnapshot {
            close: 12.0,
            rsi: Some(50.0),
            ma5: Some(11.5),
            ma20: Some(11.0),
            recent_volume: 0.0,
            previous_volume: 0.0,
        };
        let (score, details) = composite_score(&snapshot, 12.0);

        // base 1 + RSI 2 + MA 2 + listing 1
        assert!((score - 6.0).abs() < 1e-9);
        assert!(details.contains("RSI:2"));
        assert!(details.contains("MA:2"));
        assert!(details.contains("listed:1"));
    }

    #[test]
    fn test_rank_candidates_orders_and_truncates() {
        let candidate = |code: &str, score: f64| ScreenCandidate {
            ts_code: code.to_string(),
            name: String::new(),
            industry: None,
            years_listed: 5.0,
            pe: None,
            market_cap: None,
            close: 10.0,
            rsi: None,
            ma5: None,
            ma20: None,
            score,
            score_details: String::new(),
        };
        let ranked = rank_candidates(
            vec![
                candidate("000001.SZ", 3.0),
                candidate("000002.SZ", 5.5),
                candidate("000003.SZ", 4.0),
            ],
            2,
        );

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].ts_code, "000002.SZ");
        assert_eq!(ranked[1].ts_code, "000003.SZ");
    }

    #[test]
    fn test_snapshot_requires_enough_bars() {
        let bars: Vec<DailyBar> = (0..10)
            .map(|i| DailyBar {
                ts_code: "000001.SZ".to_string(),
                trade_date: format!("202306{:02}", i + 1),
                open: 10.0,
                high: 10.5,
                low: 9.5,
                close: 10.0,
                pre_close: None,
                change: None,
                pct_chg: None,
                vol: 1000.0,
                amount: None,
            })
            .collect();
        let frame = IndicatorFrame::compute(&bars);
        assert!(technical_snapshot(&bars, &frame).is_none());
    }
}
