//! Profitability and solvency analysis over financial statements.
//!
//! Only annual reports (periods ending 1231) enter the ratios; interim
//! statements are cumulative within the year and would distort
//! year-over-year comparisons.

use serde::Serialize;

use crate::models::{annual_rows, BalanceSheet, IncomeStatement};

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfitabilityAnalysis {
    pub revenue_growth_rates: Vec<f64>,
    pub avg_revenue_growth: f64,
    pub profit_growth_rates: Vec<f64>,
    pub avg_profit_growth: f64,
    pub gross_margins: Vec<f64>,
    pub avg_gross_margin: f64,
    pub net_margins: Vec<f64>,
    pub avg_net_margin: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SolvencyAnalysis {
    pub debt_ratios: Vec<f64>,
    pub avg_debt_ratio: f64,
    pub current_ratios: Vec<f64>,
    pub avg_current_ratio: f64,
    pub quick_ratios: Vec<f64>,
    pub avg_quick_ratio: f64,
}

/// Year-over-year growth rates between consecutive annual values.
/// Pairs whose base year is missing or zero are skipped.
fn growth_rates(values: &[Option<f64>]) -> Vec<f64> {
    values
        .windows(2)
        .filter_map(|pair| match (pair[0], pair[1]) {
            (Some(prev), Some(cur)) if prev != 0.0 => Some((cur - prev) / prev * 100.0),
            _ => None,
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

pub fn analyze_profitability(income: &[IncomeStatement]) -> ProfitabilityAnalysis {
    let annual = annual_rows(income);

    let revenues: Vec<Option<f64>> = annual.iter().map(|r| r.revenue).collect();
    let profits: Vec<Option<f64>> = annual.iter().map(|r| r.n_income).collect();
    let revenue_growth_rates = growth_rates(&revenues);
    let profit_growth_rates = growth_rates(&profits);

    let mut gross_margins = Vec::new();
    let mut net_margins = Vec::new();
    for row in &annual {
        if let Some(revenue) = row.revenue.filter(|r| *r != 0.0) {
            if let Some(cost) = row.oper_cost {
                gross_margins.push((revenue - cost) / revenue * 100.0);
            }
            if let Some(net) = row.n_income {
                net_margins.push(net / revenue * 100.0);
            }
        }
    }

    ProfitabilityAnalysis {
        avg_revenue_growth: mean(&revenue_growth_rates),
        revenue_growth_rates,
        avg_profit_growth: mean(&profit_growth_rates),
        profit_growth_rates,
        avg_gross_margin: mean(&gross_margins),
        gross_margins,
        avg_net_margin: mean(&net_margins),
        net_margins,
    }
}

pub fn analyze_solvency(balance: &[BalanceSheet]) -> SolvencyAnalysis {
    let annual = annual_rows(balance);

    let mut debt_ratios = Vec::new();
    let mut current_ratios = Vec::new();
    let mut quick_ratios = Vec::new();
    for row in &annual {
        if let (Some(assets), Some(liab)) = (row.total_assets.filter(|a| *a != 0.0), row.total_liab)
        {
            debt_ratios.push(liab / assets * 100.0);
        }
        if let (Some(cur_liab), Some(cur_assets)) =
            (row.total_cur_liab.filter(|l| *l != 0.0), row.total_cur_assets)
        {
            current_ratios.push(cur_assets / cur_liab);
            let quick_assets = cur_assets - row.inventories.unwrap_or(0.0);
            quick_ratios.push(quick_assets / cur_liab);
        }
    }

    SolvencyAnalysis {
        avg_debt_ratio: mean(&debt_ratios),
        debt_ratios,
        avg_current_ratio: mean(&current_ratios),
        current_ratios,
        avg_quick_ratio: mean(&quick_ratios),
        quick_ratios,
    }
}

/// Rule-based reading of the averaged ratios.
pub fn recommendations(
    profitability: &ProfitabilityAnalysis,
    solvency: &SolvencyAnalysis,
) -> Vec<String> {
    let mut notes = Vec::new();

    if profitability.avg_revenue_growth > 20.0 {
        notes.push("Strong revenue growth points to good expansion momentum".to_string());
    } else if profitability.avg_revenue_growth < 0.0 {
        notes.push("Revenue is shrinking; watch the business development closely".to_string());
    }

    if profitability.avg_net_margin > 15.0 {
        notes.push("High net margin indicates strong profitability".to_string());
    } else if profitability.avg_net_margin < 5.0 {
        notes.push("Net margin is thin; profitability has room to improve".to_string());
    }

    if solvency.avg_debt_ratio > 70.0 {
        notes.push("High debt-to-asset ratio; keep an eye on financial risk".to_string());
    } else if solvency.avg_debt_ratio < 30.0 {
        notes.push("Moderate leverage with a solid balance sheet structure".to_string());
    }

    if solvency.avg_current_ratio < 1.0 {
        notes.push("Low current ratio; short-term solvency needs attention".to_string());
    } else if solvency.avg_current_ratio > 2.0 {
        notes.push("Healthy current ratio and strong short-term solvency".to_string());
    }

    if notes.is_empty() {
        notes.push("Combine with additional indicators for a fuller picture".to_string());
    }

    notes
}

/// Full financial report for one instrument.
#[derive(Debug, Clone, Serialize)]
pub struct FinancialReport {
    pub ts_code: String,
    pub analysis_date: String,
    pub income_records: usize,
    pub balance_records: usize,
    pub indicator_records: usize,
    pub profitability: ProfitabilityAnalysis,
    pub solvency: SolvencyAnalysis,
    pub recommendations: Vec<String>,
}

impl FinancialReport {
    pub fn build(
        ts_code: &str,
        income: &[IncomeStatement],
        balance: &[BalanceSheet],
        indicator_records: usize,
    ) -> FinancialReport {
        let profitability = analyze_profitability(income);
        let solvency = analyze_solvency(balance);
        let recommendations = recommendations(&profitability, &solvency);

        FinancialReport {
            ts_code: ts_code.to_string(),
            analysis_date: chrono::Local::now().format("%Y-%m-%d").to_string(),
            income_records: income.len(),
            balance_records: balance.len(),
            indicator_records,
            profitability,
            solvency,
            recommendations,
        }
    }
}
