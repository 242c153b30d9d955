use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Bar interval for k-line history, mapping onto the vendor api name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KlinePeriod {
    Daily,
    Weekly,
    Monthly,
}

impl KlinePeriod {
    /// Vendor endpoint serving this interval
    pub fn api_name(&self) -> &'static str {
        match self {
            KlinePeriod::Daily => "daily",
            KlinePeriod::Weekly => "weekly",
            KlinePeriod::Monthly => "monthly",
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.api_name()
    }
}

impl FromStr for KlinePeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" | "d" => Ok(KlinePeriod::Daily),
            "weekly" | "w" => Ok(KlinePeriod::Weekly),
            "monthly" | "m" => Ok(KlinePeriod::Monthly),
            other => Err(format!(
                "unknown period '{}', expected daily, weekly or monthly",
                other
            )),
        }
    }
}

impl fmt::Display for KlinePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One listing from the stock universe (`stock_basic`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockBasic {
    pub ts_code: String,
    #[serde(default)]
    pub symbol: Option<String>,
    pub name: String,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub list_status: Option<String>,
    #[serde(default)]
    pub list_date: Option<String>,
}

impl StockBasic {
    /// Special-treatment listings carry ST markers in the name
    pub fn is_st(&self) -> bool {
        self.name.contains("ST")
    }

    /// Case-insensitive match against code, name or industry
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let needle = keyword.to_lowercase();
        self.ts_code.to_lowercase().contains(&needle)
            || self.name.to_lowercase().contains(&needle)
            || self
                .symbol
                .as_deref()
                .is_some_and(|s| s.to_lowercase().contains(&needle))
            || self
                .industry
                .as_deref()
                .is_some_and(|i| i.to_lowercase().contains(&needle))
    }
}

/// One OHLCV bar as served by the daily/weekly/monthly endpoints.
/// Volume is in lots (100 shares), amount in thousand CNY.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub ts_code: String,
    pub trade_date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub pre_close: Option<f64>,
    #[serde(default)]
    pub change: Option<f64>,
    #[serde(default)]
    pub pct_chg: Option<f64>,
    pub vol: f64,
    #[serde(default)]
    pub amount: Option<f64>,
}

impl DailyBar {
    pub fn is_up(&self) -> bool {
        match self.pre_close {
            Some(pre_close) => self.close >= pre_close,
            None => self.close >= self.open,
        }
    }
}

/// Sort bars oldest-first; the vendor returns newest-first
pub fn sort_bars_ascending(bars: &mut [DailyBar]) {
    bars.sort_by(|a, b| a.trade_date.cmp(&b.trade_date));
}

/// Per-day valuation snapshot (`daily_basic`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyBasic {
    pub ts_code: String,
    pub trade_date: String,
    #[serde(default)]
    pub close: Option<f64>,
    #[serde(default)]
    pub turnover_rate: Option<f64>,
    #[serde(default)]
    pub volume_ratio: Option<f64>,
    #[serde(default)]
    pub pe: Option<f64>,
    #[serde(default)]
    pub pe_ttm: Option<f64>,
    #[serde(default)]
    pub pb: Option<f64>,
    #[serde(default)]
    pub total_share: Option<f64>,
    #[serde(default)]
    pub float_share: Option<f64>,
    /// Total market value in ten-thousand CNY
    #[serde(default)]
    pub total_mv: Option<f64>,
    #[serde(default)]
    pub circ_mv: Option<f64>,
}

impl DailyBasic {
    /// Total market value in hundred-million CNY (the unit screeners quote)
    pub fn total_mv_yi(&self) -> Option<f64> {
        self.total_mv.map(|mv| mv / 10_000.0)
    }
}

/// Snapshot combining listing info with the most recent bar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeInfo {
    pub ts_code: String,
    pub name: String,
    pub industry: Option<String>,
    pub area: Option<String>,
    pub market: Option<String>,
    pub list_date: Option<String>,
    pub latest: Option<DailyBar>,
    pub price_change: Option<f64>,
    pub pct_change: Option<f64>,
}

impl RealtimeInfo {
    pub fn new(basic: &StockBasic, latest: Option<DailyBar>) -> Self {
        let (price_change, pct_change) = match &latest {
            Some(bar) => match bar.pre_close {
                Some(pre_close) if pre_close != 0.0 => {
                    let change = bar.close - pre_close;
                    (Some(change), Some(change / pre_close * 100.0))
                }
                _ => (None, None),
            },
            None => (None, None),
        };

        Self {
            ts_code: basic.ts_code.clone(),
            name: basic.name.clone(),
            industry: basic.industry.clone(),
            area: basic.area.clone(),
            market: basic.market.clone(),
            list_date: basic.list_date.clone(),
            latest,
            price_change,
            pct_change,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::table::DataTable;

    fn basic(name: &str, industry: Option<&str>) -> StockBasic {
        StockBasic {
            ts_code: "000001.SZ".into(),
            symbol: Some("000001".into()),
            name: name.into(),
            area: Some("深圳".into()),
            industry: industry.map(Into::into),
            market: Some("主板".into()),
            exchange: None,
            list_status: Some("L".into()),
            list_date: Some("19910403".into()),
        }
    }

    fn bar(trade_date: &str, close: f64, pre_close: Option<f64>) -> DailyBar {
        DailyBar {
            ts_code: "000001.SZ".into(),
            trade_date: trade_date.into(),
            open: close - 0.1,
            high: close + 0.2,
            low: close - 0.3,
            close,
            pre_close,
            change: None,
            pct_chg: None,
            vol: 120_000.0,
            amount: Some(150_000.0),
        }
    }

    #[test]
    fn test_period_parse_and_api_name() {
        assert_eq!("daily".parse::<KlinePeriod>().unwrap(), KlinePeriod::Daily);
        assert_eq!("W".parse::<KlinePeriod>().unwrap(), KlinePeriod::Weekly);
        assert_eq!(
            "monthly".parse::<KlinePeriod>().unwrap().api_name(),
            "monthly"
        );
        assert!("hourly".parse::<KlinePeriod>().is_err());
    }

    #[test]
    fn test_decode_daily_bars_from_table() {
        let table = DataTable::new(
            vec![
                "ts_code".into(),
                "trade_date".into(),
                "open".into(),
                "high".into(),
                "low".into(),
                "close".into(),
                "pre_close".into(),
                "change".into(),
                "pct_chg".into(),
                "vol".into(),
                "amount".into(),
            ],
            vec![vec![
                "000001.SZ".into(),
                "20230104".into(),
                13.71.into(),
                14.42.into(),
                13.63.into(),
                14.32.into(),
                13.66.into(),
                0.66.into(),
                4.8316.into(),
                2_189_682.53.into(),
                3_106_086.447.into(),
            ]],
        );

        let bars: Vec<DailyBar> = table.decode().unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].trade_date, "20230104");
        assert!((bars[0].close - 14.32).abs() < 1e-9);
        assert_eq!(bars[0].pre_close, Some(13.66));
    }

    #[test]
    fn test_sort_bars_ascending() {
        let mut bars = vec![
            bar("20230106", 10.2, None),
            bar("20230104", 10.0, None),
            bar("20230105", 10.1, None),
        ];
        sort_bars_ascending(&mut bars);
        let dates: Vec<&str> = bars.iter().map(|b| b.trade_date.as_str()).collect();
        assert_eq!(dates, vec!["20230104", "20230105", "20230106"]);
    }

    #[test]
    fn test_st_detection_and_keyword_match() {
        assert!(basic("*ST康美", None).is_st());
        assert!(!basic("平安银行", None).is_st());

        let row = basic("平安银行", Some("银行"));
        assert!(row.matches_keyword("平安"));
        assert!(row.matches_keyword("000001"));
        assert!(row.matches_keyword("银行"));
        assert!(!row.matches_keyword("白酒"));
    }

    #[test]
    fn test_realtime_change_from_pre_close() {
        let info = RealtimeInfo::new(&basic("平安银行", None), Some(bar("20230104", 14.32, Some(13.66))));
        let change = info.price_change.unwrap();
        let pct = info.pct_change.unwrap();
        assert!((change - 0.66).abs() < 1e-9);
        assert!((pct - 4.8316).abs() < 1e-3);

        let no_latest = RealtimeInfo::new(&basic("平安银行", None), None);
        assert!(no_latest.price_change.is_none());
    }

    #[test]
    fn test_market_value_unit_conversion() {
        let row = DailyBasic {
            ts_code: "000001.SZ".into(),
            trade_date: "20230104".into(),
            close: Some(14.32),
            turnover_rate: Some(1.1),
            volume_ratio: None,
            pe: Some(5.5),
            pe_ttm: None,
            pb: Some(0.7),
            total_share: None,
            float_share: None,
            total_mv: Some(27_790_000.0),
            circ_mv: None,
        };
        assert!((row.total_mv_yi().unwrap() - 2779.0).abs() < 1e-9);
    }
}
