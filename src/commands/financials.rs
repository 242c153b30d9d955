//! Financial statement analysis: statements, ratios and a rule-based read.

use std::future::Future;

use anyhow::bail;
use clap::Args;

use super::{build_client, fmt_opt, heading};
use crate::analysis::FinancialReport;
use crate::client::TushareError;
use crate::config::AppConfig;
use crate::models::{dedupe_report_rows, CashflowStatement, FinaIndicator, IncomeStatement};
use crate::services::DataStore;
use crate::utils::{display_date, report_periods, Logger, Timer};

/// Statement rows shown in the printed tables.
const SHOWN_PERIODS: usize = 5;

const YI: f64 = 1e8;

#[derive(Debug, Args)]
pub struct FinancialsArgs {
    /// Instrument code (e.g. 600519.SH)
    #[arg(short, long)]
    pub code: String,

    /// How many years of quarter-end reports to fetch
    #[arg(short, long, default_value_t = 5)]
    pub years: u32,

    /// Restrict to one report period YYYYMMDD (e.g. 20231231)
    #[arg(long)]
    pub period: Option<String>,

    /// Write the report to the data directory as JSON
    #[arg(long)]
    pub save: bool,
}

pub async fn run(config: &AppConfig, args: FinancialsArgs) -> anyhow::Result<()> {
    let log = Logger::new("financials");
    let timer = Timer::start("financial analysis");
    let client = build_client(config)?;

    let periods = match &args.period {
        Some(period) => vec![period.clone()],
        None => report_periods(args.years),
    };
    log.info(&format!(
        "{}: fetching {} report periods",
        args.code,
        periods.len(),
    ));

    let code = args.code.clone();
    let income = dedupe_report_rows(
        collect_periods(&log, &periods, |p| {
            let client = &client;
            let code = code.clone();
            async move { client.income_statement(&code, Some(&p)).await }
        })
        .await?,
    );
    let balance = dedupe_report_rows(
        collect_periods(&log, &periods, |p| {
            let client = &client;
            let code = code.clone();
            async move { client.balance_sheet(&code, Some(&p)).await }
        })
        .await?,
    );
    let cashflow = dedupe_report_rows(
        collect_periods(&log, &periods, |p| {
            let client = &client;
            let code = code.clone();
            async move { client.cashflow_statement(&code, Some(&p)).await }
        })
        .await?,
    );
    let indicators = dedupe_report_rows(
        collect_periods(&log, &periods, |p| {
            let client = &client;
            let code = code.clone();
            async move { client.financial_indicator(&code, Some(&p)).await }
        })
        .await?,
    );

    if income.is_empty() && balance.is_empty() {
        bail!("no financial statements for {}", args.code);
    }
    log.info(&format!(
        "{}: {} income, {} balance, {} cashflow, {} indicator rows",
        args.code,
        income.len(),
        balance.len(),
        cashflow.len(),
        indicators.len(),
    ));

    heading(&format!("{} financials", args.code));
    print_income(&income);
    print_cashflow(&cashflow);
    print_indicators(&indicators);

    let report = FinancialReport::build(&args.code, &income, &balance, indicators.len());
    print_report(&report);

    if args.save {
        let store = DataStore::from_config(config);
        let filename = format!("{}_financial_report.json", args.code.replace('.', "_"));
        let path = store.save_json_value(&report, &filename)?;
        println!("\nsaved report to {}", path.display());
    }

    timer.log_elapsed();
    Ok(())
}

/// Fetch one statement endpoint for every report period and concatenate.
/// Individual empty or failed periods are skipped; auth failures abort.
async fn collect_periods<T, F, Fut>(
    log: &Logger,
    periods: &[String],
    mut fetch: F,
) -> anyhow::Result<Vec<T>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Vec<T>, TushareError>>,
{
    let mut all = Vec::new();
    for period in periods {
        match fetch(period.clone()).await {
            Ok(rows) => all.extend(rows),
            Err(err) if err.is_auth() => return Err(err.into()),
            Err(err) => log.warn_with_error(&format!("period {period} skipped"), &err),
        }
    }
    Ok(all)
}

fn print_income(income: &[IncomeStatement]) {
    if income.is_empty() {
        return;
    }
    println!("\nincome statements (values in 1e8 CNY):");
    println!(
        "{:<12} {:>12} {:>12} {:>12} {:>8}",
        "period", "revenue", "oper cost", "net income", "eps"
    );
    for row in income.iter().take(SHOWN_PERIODS) {
        println!(
            "{:<12} {:>12} {:>12} {:>12} {:>8}",
            display_date(&row.end_date),
            fmt_opt(row.revenue.map(|v| v / YI), 2),
            fmt_opt(row.oper_cost.map(|v| v / YI), 2),
            fmt_opt(row.n_income.map(|v| v / YI), 2),
            fmt_opt(row.basic_eps, 2),
        );
    }
}

fn print_cashflow(cashflow: &[CashflowStatement]) {
    if cashflow.is_empty() {
        return;
    }
    println!("\ncash flows (values in 1e8 CNY):");
    println!(
        "{:<12} {:>12} {:>12} {:>12}",
        "period", "operating", "investing", "financing"
    );
    for row in cashflow.iter().take(SHOWN_PERIODS) {
        println!(
            "{:<12} {:>12} {:>12} {:>12}",
            display_date(&row.end_date),
            fmt_opt(row.n_cashflow_act.map(|v| v / YI), 2),
            fmt_opt(row.n_cashflow_inv_act.map(|v| v / YI), 2),
            fmt_opt(row.n_cash_flows_fnc_act.map(|v| v / YI), 2),
        );
    }
}

fn print_indicators(indicators: &[FinaIndicator]) {
    if indicators.is_empty() {
        return;
    }
    println!("\nkey indicators (percent):");
    println!(
        "{:<12} {:>8} {:>12} {:>12} {:>12} {:>10}",
        "period", "roe", "gross margin", "net margin", "debt/assets", "current"
    );
    for row in indicators.iter().take(SHOWN_PERIODS) {
        println!(
            "{:<12} {:>8} {:>12} {:>12} {:>12} {:>10}",
            display_date(&row.end_date),
            fmt_opt(row.roe, 2),
            fmt_opt(row.grossprofit_margin, 2),
            fmt_opt(row.netprofit_margin, 2),
            fmt_opt(row.debt_to_assets, 2),
            fmt_opt(row.current_ratio, 2),
        );
    }
}

fn print_report(report: &FinancialReport) {
    let prof = &report.profitability;
    println!("\nprofitability over annual reports:");
    println!(
        "  revenue growth {:+.2}%  profit growth {:+.2}%",
        prof.avg_revenue_growth, prof.avg_profit_growth,
    );
    println!(
        "  gross margin {:.2}%  net margin {:.2}%",
        prof.avg_gross_margin, prof.avg_net_margin,
    );

    let solv = &report.solvency;
    println!("\nsolvency over annual reports:");
    println!(
        "  debt/assets {:.2}%  current ratio {:.2}  quick ratio {:.2}",
        solv.avg_debt_ratio, solv.avg_current_ratio, solv.avg_quick_ratio,
    );

    println!("\nassessment ({}):", report.analysis_date);
    for note in &report.recommendations {
        println!("  • {note}");
    }
}
