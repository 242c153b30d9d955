//! Side-by-side performance comparison across instruments.

use anyhow::bail;
use clap::Args;
use tokio::time::sleep;

use super::{build_client, heading, REQUEST_PACING};
use crate::analysis::{CorrelationMatrix, PerformanceMetrics};
use crate::chart::ChartBuilder;
use crate::config::AppConfig;
use crate::models::KlinePeriod;
use crate::services::DataStore;
use crate::utils::{trailing_window, Logger, Timer};

const DEFAULT_WINDOW_DAYS: i64 = 365;

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Instrument codes, comma separated (e.g. 600519.SH,000858.SZ)
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub codes: Vec<String>,

    /// Start date YYYYMMDD (defaults to one year back)
    #[arg(long)]
    pub start: Option<String>,

    /// End date YYYYMMDD (defaults to today)
    #[arg(long)]
    pub end: Option<String>,

    /// Render comparison and correlation charts
    #[arg(long)]
    pub chart: bool,

    /// Write the metrics to the data directory as CSV
    #[arg(long)]
    pub save: bool,
}

pub async fn run(config: &AppConfig, args: CompareArgs) -> anyhow::Result<()> {
    if args.codes.len() < 2 {
        bail!("need at least two codes to compare");
    }
    let log = Logger::new("compare");
    let timer = Timer::start("stock comparison");
    let client = build_client(config)?;

    let (default_start, default_end) = trailing_window(DEFAULT_WINDOW_DAYS);
    let start = args.start.as_deref().unwrap_or(&default_start);
    let end = args.end.as_deref().unwrap_or(&default_end);

    let mut series = Vec::new();
    for (i, code) in args.codes.iter().enumerate() {
        if i > 0 {
            sleep(REQUEST_PACING).await;
        }
        let bars = client
            .kline(code, KlinePeriod::Daily, Some(start), Some(end))
            .await?;
        if bars.is_empty() {
            log.warn(&format!("{code} has no bars in the window, skipping"));
            continue;
        }
        log.info(&format!("{}: {} bars", code, bars.len()));
        series.push((code.clone(), bars));
    }
    if series.len() < 2 {
        bail!("fewer than two instruments returned data");
    }

    let metrics: Vec<PerformanceMetrics> = series
        .iter()
        .filter_map(|(code, bars)| PerformanceMetrics::from_bars(code, bars))
        .collect();

    heading(&format!("comparison {} – {}", start, end));
    print_metrics(&metrics);

    let matrix = CorrelationMatrix::compute(&series);
    print_correlations(&matrix);

    if args.chart {
        let charts = ChartBuilder::from_config(config);
        let comparison = charts.comparison_chart("Normalized performance", &series);
        let path = charts.save(&comparison, "comparison.html")?;
        println!("\nwrote {}", path.display());

        let heatmap = charts.correlation_heatmap("Daily close correlation", &matrix);
        let path = charts.save(&heatmap, "correlation.html")?;
        println!("wrote {}", path.display());
    }

    if args.save {
        let store = DataStore::from_config(config);
        if let Some(path) = store.save_csv(&metrics, "comparison_metrics.csv")? {
            println!("\nsaved metrics to {}", path.display());
        }
    }

    timer.log_elapsed();
    Ok(())
}

fn print_metrics(metrics: &[PerformanceMetrics]) {
    println!(
        "{:<12} {:>9} {:>9} {:>9} {:>9} {:>9} {:>8}",
        "code", "return%", "vol%", "drawdown%", "sharpe", "high", "low"
    );
    for m in metrics {
        println!(
            "{:<12} {:>9.2} {:>9.2} {:>9.2} {:>9.2} {:>9.2} {:>8.2}",
            m.ts_code,
            m.total_return_pct,
            m.volatility_pct,
            m.max_drawdown_pct,
            m.sharpe_ratio,
            m.max_price,
            m.min_price,
        );
    }

    if let Some(best) = metrics
        .iter()
        .max_by(|a, b| a.total_return_pct.total_cmp(&b.total_return_pct))
    {
        println!(
            "\nbest performer: {} ({:+.2}%)",
            best.ts_code, best.total_return_pct
        );
    }
    if let Some(calmest) = metrics
        .iter()
        .min_by(|a, b| a.volatility_pct.total_cmp(&b.volatility_pct))
    {
        println!(
            "lowest volatility: {} ({:.2}%)",
            calmest.ts_code, calmest.volatility_pct
        );
    }
}

fn print_correlations(matrix: &CorrelationMatrix) {
    println!("\ndaily close correlations:");
    for (i, a) in matrix.codes.iter().enumerate() {
        for b in matrix.codes.iter().skip(i + 1) {
            match matrix.get(a, b) {
                Some(rho) => println!("  {a} ↔ {b}  {rho:+.3}"),
                None => println!("  {a} ↔ {b}  n/a"),
            }
        }
    }
}
