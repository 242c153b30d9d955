//! List, search and summarize the instrument universe.

use std::collections::HashMap;

use clap::Args;

use super::{build_client, heading, opt_str};
use crate::config::AppConfig;
use crate::models::StockBasic;
use crate::services::DataStore;
use crate::utils::{days_ago_compact, Logger, Timer};

#[derive(Debug, Args)]
pub struct StocksArgs {
    /// Keyword matched against code, symbol, name and industry
    #[arg(short, long)]
    pub keyword: Option<String>,

    /// Keep only this exact industry
    #[arg(short, long)]
    pub industry: Option<String>,

    /// Keep only this area/province
    #[arg(long)]
    pub area: Option<String>,

    /// Keep only this market segment (主板, 创业板, 科创板...)
    #[arg(long)]
    pub market: Option<String>,

    /// Listing status: L listed, D delisted, P paused
    #[arg(long, default_value = "L")]
    pub list_status: String,

    /// Exchange filter (SSE or SZSE)
    #[arg(long)]
    pub exchange: Option<String>,

    /// Keep only stocks listed within the last N days, newest first
    #[arg(long)]
    pub recent: Option<i64>,

    /// Rows to print before truncating
    #[arg(long, default_value_t = 50)]
    pub limit: usize,

    /// Write the matching rows to stock_basic.csv in the data directory
    #[arg(long)]
    pub save: bool,
}

pub async fn run(config: &AppConfig, args: StocksArgs) -> anyhow::Result<()> {
    let log = Logger::new("stocks");
    let timer = Timer::start("stock listing");
    let client = build_client(config)?;

    let mut stocks = client
        .stock_basic(Some(&args.list_status), args.exchange.as_deref(), None)
        .await?;
    log.info(&format!("fetched {} instruments", stocks.len()));

    if let Some(keyword) = &args.keyword {
        stocks.retain(|s| s.matches_keyword(keyword));
    }
    if let Some(industry) = &args.industry {
        stocks.retain(|s| s.industry.as_deref() == Some(industry.as_str()));
    }
    if let Some(area) = &args.area {
        stocks.retain(|s| s.area.as_deref() == Some(area.as_str()));
    }
    if let Some(market) = &args.market {
        stocks.retain(|s| s.market.as_deref() == Some(market.as_str()));
    }
    if let Some(days) = args.recent {
        retain_recent(&mut stocks, &days_ago_compact(days));
    }

    heading(&format!("{} matching instruments", stocks.len()));
    print_listing(&stocks, args.limit, args.recent.is_some());

    // Without narrowing filters the distribution summary is the more
    // useful view of the universe.
    let filtered = args.keyword.is_some()
        || args.industry.is_some()
        || args.area.is_some()
        || args.market.is_some()
        || args.recent.is_some();
    if !filtered {
        print_distributions(&stocks);
    }

    if args.save {
        let store = DataStore::from_config(config);
        if let Some(path) = store.save_csv(&stocks, "stock_basic.csv")? {
            println!("\nsaved {} rows to {}", stocks.len(), path.display());
        }
    }

    timer.log_elapsed();
    Ok(())
}

/// Keep stocks listed on or after the cutoff, newest listing first.
/// Compact dates compare correctly as strings.
fn retain_recent(stocks: &mut Vec<StockBasic>, cutoff: &str) {
    stocks.retain(|s| s.list_date.as_deref().is_some_and(|d| d >= cutoff));
    stocks.sort_by(|a, b| b.list_date.cmp(&a.list_date));
}

fn print_listing(stocks: &[StockBasic], limit: usize, with_list_date: bool) {
    print!(
        "{:<12} {:<10} {:<12} {:<8} {:<10}",
        "code", "symbol", "name", "area", "industry"
    );
    println!("{}", if with_list_date { " listed" } else { "" });
    for stock in stocks.iter().take(limit) {
        print!(
            "{:<12} {:<10} {:<12} {:<8} {:<10}",
            stock.ts_code,
            opt_str(&stock.symbol),
            stock.name,
            opt_str(&stock.area),
            opt_str(&stock.industry),
        );
        if with_list_date {
            println!(" {}", opt_str(&stock.list_date));
        } else {
            println!();
        }
    }
    if stocks.len() > limit {
        println!("... and {} more (raise --limit to see them)", stocks.len() - limit);
    }
}

fn print_distributions(stocks: &[StockBasic]) {
    println!("\nexchange distribution:");
    for (name, count) in top_counts(stocks, |s| s.exchange.clone(), usize::MAX) {
        println!("  {name:<8} {count}");
    }

    println!("\nmarket distribution:");
    for (name, count) in top_counts(stocks, |s| s.market.clone(), usize::MAX) {
        println!("  {name:<8} {count}");
    }

    println!("\ntop industries:");
    for (name, count) in top_counts(stocks, |s| s.industry.clone(), 10) {
        println!("  {name:<12} {count}");
    }

    println!("\ntop areas:");
    for (name, count) in top_counts(stocks, |s| s.area.clone(), 10) {
        println!("  {name:<8} {count}");
    }
}

/// Frequency of a field across the listing, busiest first.
fn top_counts<F>(stocks: &[StockBasic], field: F, top: usize) -> Vec<(String, usize)>
where
    F: Fn(&StockBasic) -> Option<String>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for stock in stocks {
        if let Some(value) = field(stock) {
            *counts.entry(value).or_default() += 1;
        }
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(top);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock(code: &str, industry: &str) -> StockBasic {
        StockBasic {
            ts_code: code.to_string(),
            symbol: None,
            name: code.to_string(),
            area: None,
            industry: Some(industry.to_string()),
            market: None,
            exchange: None,
            list_status: Some("L".to_string()),
            list_date: None,
        }
    }

    #[test]
    fn test_top_counts_ranks_by_frequency() {
        let stocks = vec![
            stock("000001.SZ", "银行"),
            stock("600000.SH", "银行"),
            stock("600519.SH", "白酒"),
        ];
        let ranked = top_counts(&stocks, |s| s.industry.clone(), 10);

        assert_eq!(ranked[0], ("银行".to_string(), 2));
        assert_eq!(ranked[1], ("白酒".to_string(), 1));
    }

    #[test]
    fn test_top_counts_truncates() {
        let stocks = vec![
            stock("1", "a"),
            stock("2", "b"),
            stock("3", "c"),
        ];
        assert_eq!(top_counts(&stocks, |s| s.industry.clone(), 2).len(), 2);
    }

    #[test]
    fn test_retain_recent_filters_and_sorts() {
        let listed = |code: &str, date: &str| {
            let mut s = stock(code, "银行");
            s.list_date = Some(date.to_string());
            s
        };
        let mut stocks = vec![
            listed("1", "20230101"),
            listed("2", "20230601"),
            listed("3", "20230301"),
            stock("4", "白酒"), // no list date
        ];
        retain_recent(&mut stocks, "20230201");

        let codes: Vec<&str> = stocks.iter().map(|s| s.ts_code.as_str()).collect();
        assert_eq!(codes, vec!["2", "3"]);
    }
}
