//! Two-stage screener over the listed universe.

use std::collections::HashMap;

use anyhow::bail;
use clap::Args;
use tokio::time::sleep;

use super::{build_client, fmt_opt, heading, REQUEST_PACING};
use crate::analysis::{
    composite_score, passes_fundamental, passes_technical, rank_candidates, technical_snapshot,
    MaTrend, ScreenCandidate, ScreenCriteria,
};
use crate::config::AppConfig;
use crate::indicators::IndicatorFrame;
use crate::models::{DailyBasic, KlinePeriod};
use crate::services::DataStore;
use crate::utils::{
    format_compact_date, is_weekend, latest_trading_day, trailing_window, years_since_compact,
    Logger, Timer,
};

/// Bars fetched per candidate for the technical pass.
const TECHNICAL_WINDOW_DAYS: i64 = 90;
/// How far back to look for the newest valuation snapshot.
const VALUATION_LOOKBACK_DAYS: i64 = 10;

#[derive(Debug, Args)]
pub struct ScreenArgs {
    /// Minimum total market value in 100M CNY
    #[arg(long, default_value_t = 50.0)]
    pub min_market_cap: f64,

    /// Maximum positive PE
    #[arg(long, default_value_t = 30.0)]
    pub max_pe: f64,

    /// Minimum years since listing
    #[arg(long, default_value_t = 3.0)]
    pub min_years: f64,

    /// Restrict to these industries (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub industries: Vec<String>,

    /// Lower RSI bound
    #[arg(long, default_value_t = 30.0)]
    pub rsi_min: f64,

    /// Upper RSI bound
    #[arg(long, default_value_t = 70.0)]
    pub rsi_max: f64,

    /// Moving-average trend filter: bullish, bearish or any
    #[arg(long, default_value = "bullish")]
    pub ma_trend: MaTrend,

    /// Drop the rising-volume requirement
    #[arg(long)]
    pub any_volume: bool,

    /// Number of results to keep
    #[arg(short, long, default_value_t = 20)]
    pub top: usize,

    /// Write the results to the data directory as CSV
    #[arg(long)]
    pub save: bool,
}

impl ScreenArgs {
    fn criteria(&self) -> ScreenCriteria {
        ScreenCriteria {
            min_market_cap: self.min_market_cap,
            max_pe: self.max_pe,
            min_years_listed: self.min_years,
            industries: if self.industries.is_empty() {
                None
            } else {
                Some(self.industries.clone())
            },
            rsi_range: (self.rsi_min, self.rsi_max),
            ma_trend: self.ma_trend,
            require_volume_increase: !self.any_volume,
            top_n: self.top,
            ..ScreenCriteria::default()
        }
    }
}

pub async fn run(config: &AppConfig, args: ScreenArgs) -> anyhow::Result<()> {
    let log = Logger::new("screen");
    let timer = Timer::start("stock screen");
    let client = build_client(config)?;
    let criteria = args.criteria();
    let today = chrono::Local::now().date_naive();

    let universe = client.stock_basic(Some("L"), None, None).await?;
    if universe.is_empty() {
        bail!("empty stock universe");
    }
    log.info(&format!("{} listed stocks in the universe", universe.len()));

    let valuations = latest_valuations(&client).await?;
    log.info(&format!("{} valuation rows", valuations.len()));

    let mut shortlist: Vec<_> = universe
        .iter()
        .filter(|s| passes_fundamental(s, valuations.get(&s.ts_code), &criteria, today))
        .collect();
    log.info(&format!(
        "{} stocks passed the fundamental filters",
        shortlist.len(),
    ));
    shortlist.truncate(criteria.max_technical_candidates);

    let (start, end) = trailing_window(TECHNICAL_WINDOW_DAYS);
    let mut candidates = Vec::new();
    for (i, stock) in shortlist.iter().enumerate() {
        if i > 0 {
            sleep(REQUEST_PACING).await;
        }
        let bars = match client
            .kline(&stock.ts_code, KlinePeriod::Daily, Some(&start), Some(&end))
            .await
        {
            Ok(bars) => bars,
            Err(err) => {
                log.warn_with_error(&format!("skipping {}", stock.ts_code), &err);
                continue;
            }
        };

        let frame = IndicatorFrame::compute(&bars);
        let Some(snapshot) = technical_snapshot(&bars, &frame) else {
            continue;
        };
        if !passes_technical(&snapshot, &criteria) {
            continue;
        }

        let years = stock
            .list_date
            .as_deref()
            .and_then(|d| years_since_compact(d, today))
            .unwrap_or(0.0);
        let (score, score_details) = composite_score(&snapshot, years);
        let valuation = valuations.get(&stock.ts_code);
        candidates.push(ScreenCandidate {
            ts_code: stock.ts_code.clone(),
            name: stock.name.clone(),
            industry: stock.industry.clone(),
            years_listed: years,
            pe: valuation.and_then(|v| v.pe),
            market_cap: valuation.and_then(|v| v.total_mv_yi()),
            close: snapshot.close,
            rsi: snapshot.rsi,
            ma5: snapshot.ma5,
            ma20: snapshot.ma20,
            score,
            score_details,
        });
    }
    log.info(&format!(
        "{} candidates passed the technical filters",
        candidates.len(),
    ));

    let results = rank_candidates(candidates, criteria.top_n);
    heading(&format!("top {} screen results", results.len()));
    print_results(&results);

    if args.save && !results.is_empty() {
        let store = DataStore::from_config(config);
        if let Some(path) = store.save_csv(&results, "screen_results.csv")? {
            println!("\nsaved results to {}", path.display());
        }
    }

    timer.log_elapsed();
    Ok(())
}

/// Valuation snapshot for the whole market, walking back from the
/// latest possible trading day until a date returns data. Weekends are
/// skipped without spending a request.
async fn latest_valuations(
    client: &crate::client::TushareClient,
) -> anyhow::Result<HashMap<String, DailyBasic>> {
    let newest = latest_trading_day();
    for offset in 0..=VALUATION_LOOKBACK_DAYS {
        let day = newest - chrono::Duration::days(offset);
        if is_weekend(day) {
            continue;
        }
        let date = format_compact_date(day);
        let rows = client.daily_basic(None, Some(&date)).await?;
        if !rows.is_empty() {
            return Ok(rows.into_iter().map(|r| (r.ts_code.clone(), r)).collect());
        }
    }
    bail!(
        "no valuation data in the last {} days",
        VALUATION_LOOKBACK_DAYS
    )
}

fn print_results(results: &[ScreenCandidate]) {
    if results.is_empty() {
        println!("nothing matched the criteria");
        return;
    }
    println!(
        "{:<4} {:<12} {:<10} {:>6} {:>8} {:>8} {:>8} {:>6}",
        "#", "code", "name", "score", "close", "pe", "mcap", "rsi"
    );
    for (i, c) in results.iter().enumerate() {
        println!(
            "{:<4} {:<12} {:<10} {:>6.1} {:>8.2} {:>8} {:>8} {:>6}",
            i + 1,
            c.ts_code,
            c.name,
            c.score,
            c.close,
            fmt_opt(c.pe, 1),
            fmt_opt(c.market_cap, 0),
            fmt_opt(c.rsi, 1),
        );
        println!("     {}", c.score_details);
    }
}
