use serde::{Deserialize, Serialize};

/// Income statement line items used by the analyses (`income`).
/// Monetary values are in CNY as reported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub ts_code: String,
    #[serde(default)]
    pub ann_date: Option<String>,
    pub end_date: String,
    #[serde(default)]
    pub revenue: Option<f64>,
    #[serde(default)]
    pub oper_cost: Option<f64>,
    #[serde(default)]
    pub total_profit: Option<f64>,
    #[serde(default)]
    pub n_income: Option<f64>,
    #[serde(default)]
    pub basic_eps: Option<f64>,
}

/// Balance sheet line items used by the analyses (`balancesheet`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub ts_code: String,
    #[serde(default)]
    pub ann_date: Option<String>,
    pub end_date: String,
    #[serde(default)]
    pub total_assets: Option<f64>,
    #[serde(default)]
    pub total_liab: Option<f64>,
    #[serde(default)]
    pub total_cur_assets: Option<f64>,
    #[serde(default)]
    pub total_cur_liab: Option<f64>,
    #[serde(default)]
    pub inventories: Option<f64>,
}

/// Cash flow statement line items (`cashflow`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashflowStatement {
    pub ts_code: String,
    #[serde(default)]
    pub ann_date: Option<String>,
    pub end_date: String,
    #[serde(default)]
    pub n_cashflow_act: Option<f64>,
    #[serde(default)]
    pub n_cashflow_inv_act: Option<f64>,
    #[serde(default)]
    pub n_cash_flows_fnc_act: Option<f64>,
}

/// Pre-computed ratios from the vendor (`fina_indicator`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinaIndicator {
    pub ts_code: String,
    #[serde(default)]
    pub ann_date: Option<String>,
    pub end_date: String,
    #[serde(default)]
    pub eps: Option<f64>,
    #[serde(default)]
    pub roe: Option<f64>,
    #[serde(default)]
    pub grossprofit_margin: Option<f64>,
    #[serde(default)]
    pub netprofit_margin: Option<f64>,
    #[serde(default)]
    pub debt_to_assets: Option<f64>,
    #[serde(default)]
    pub current_ratio: Option<f64>,
    #[serde(default)]
    pub quick_ratio: Option<f64>,
}

/// Statement rows keyed by a report period end date
pub trait ReportRow {
    fn end_date(&self) -> &str;
}

macro_rules! impl_report_row {
    ($($ty:ty),+) => {
        $(impl ReportRow for $ty {
            fn end_date(&self) -> &str {
                &self.end_date
            }
        })+
    };
}

impl_report_row!(IncomeStatement, BalanceSheet, CashflowStatement, FinaIndicator);

/// Drop duplicate report periods (the vendor repeats rows across report
/// types) and order newest first.
pub fn dedupe_report_rows<T: ReportRow>(mut rows: Vec<T>) -> Vec<T> {
    rows.sort_by(|a, b| b.end_date().cmp(a.end_date()));
    rows.dedup_by(|a, b| a.end_date() == b.end_date());
    rows
}

/// Keep only annual reports (period ends on Dec 31), ordered oldest first
pub fn annual_rows<T: ReportRow>(rows: &[T]) -> Vec<&T> {
    let mut annual: Vec<&T> = rows
        .iter()
        .filter(|r| r.end_date().ends_with("1231"))
        .collect();
    annual.sort_by(|a, b| a.end_date().cmp(b.end_date()));
    annual
}

#[cfg(test)]
mod tests {
    use super::*;

    fn income(end_date: &str, revenue: f64) -> IncomeStatement {
        IncomeStatement {
            ts_code: "600519.SH".into(),
            ann_date: None,
            end_date: end_date.into(),
            revenue: Some(revenue),
            oper_cost: Some(revenue * 0.4),
            total_profit: None,
            n_income: Some(revenue * 0.3),
            basic_eps: None,
        }
    }

    #[test]
    fn test_dedupe_orders_newest_first() {
        let rows = dedupe_report_rows(vec![
            income("20211231", 100.0),
            income("20221231", 120.0),
            income("20221231", 120.0),
            income("20220630", 60.0),
        ]);
        let dates: Vec<&str> = rows.iter().map(|r| r.end_date()).collect();
        assert_eq!(dates, vec!["20221231", "20220630", "20211231"]);
    }

    #[test]
    fn test_annual_filter_sorted_oldest_first() {
        let rows = vec![
            income("20221231", 120.0),
            income("20220630", 60.0),
            income("20211231", 100.0),
            income("20210930", 70.0),
        ];
        let annual = annual_rows(&rows);
        let dates: Vec<&str> = annual.iter().map(|r| r.end_date()).collect();
        assert_eq!(dates, vec!["20211231", "20221231"]);
    }
}
