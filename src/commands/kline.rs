//! Fetch OHLCV history, compute indicators and summarize the trend.

use anyhow::bail;
use clap::Args;

use super::{build_client, fmt_opt, heading};
use crate::analysis::TrendReport;
use crate::chart::ChartBuilder;
use crate::config::AppConfig;
use crate::indicators::{last_value, IndicatorFrame, TradeSignals};
use crate::models::KlinePeriod;
use crate::services::DataStore;
use crate::utils::{display_date, trailing_window, Logger, Timer};

/// Default lookback when no explicit date range is given.
const DEFAULT_WINDOW_DAYS: i64 = 365;

#[derive(Debug, Args)]
pub struct KlineArgs {
    /// Instrument code (e.g. 000001.SZ)
    #[arg(short, long)]
    pub code: String,

    /// Bar period: daily, weekly or monthly
    #[arg(short, long, default_value = "daily")]
    pub period: KlinePeriod,

    /// Trailing calendar days to fetch when no explicit range is given
    #[arg(short, long, default_value_t = DEFAULT_WINDOW_DAYS)]
    pub days: i64,

    /// Start date YYYYMMDD (overrides --days)
    #[arg(long)]
    pub start: Option<String>,

    /// End date YYYYMMDD (defaults to today)
    #[arg(long)]
    pub end: Option<String>,

    /// Write bars and the trend report to the data directory
    #[arg(long)]
    pub save: bool,

    /// Render candlestick and indicator charts to the charts directory
    #[arg(long)]
    pub chart: bool,
}

pub async fn run(config: &AppConfig, args: KlineArgs) -> anyhow::Result<()> {
    let log = Logger::new("kline");
    let timer = Timer::start("kline analysis");
    let client = build_client(config)?;

    let (default_start, default_end) = trailing_window(args.days);
    let start = args.start.as_deref().unwrap_or(&default_start);
    let end = args.end.as_deref().unwrap_or(&default_end);

    let bars = client
        .kline(&args.code, args.period, Some(start), Some(end))
        .await?;
    if bars.is_empty() {
        bail!("no bars for {} between {} and {}", args.code, start, end);
    }
    log.info(&format!(
        "{} {} bars from {} to {}",
        bars.len(),
        args.period.as_str(),
        display_date(&bars[0].trade_date),
        display_date(&bars[bars.len() - 1].trade_date),
    ));

    let frame = IndicatorFrame::compute(&bars);
    let signals = TradeSignals::detect(
        &bars.iter().map(|b| b.close).collect::<Vec<f64>>(),
        &frame,
    );

    heading(&format!("{} {} bars", args.code, args.period.as_str()));
    print_recent_bars(&bars, 5);
    print_indicator_snapshot(&frame);

    let active = signals.latest();
    if active.is_empty() {
        println!("\nsignals on the last bar: none");
    } else {
        println!("\nsignals on the last bar:");
        for name in active {
            println!("  • {name}");
        }
    }

    if let Some(report) = TrendReport::analyze(&bars, &frame) {
        print_trend(&report);

        if args.save {
            let store = DataStore::from_config(config);
            let base = format!("{}_{}", args.code.replace('.', "_"), args.period.as_str());
            if let Some(path) = store.save_csv(&bars, &format!("{base}.csv"))? {
                println!("\nsaved bars to {}", path.display());
            }
            let path = store.save_json_value(&report, &format!("{base}_trend.json"))?;
            println!("saved trend report to {}", path.display());
        }
    }

    if args.chart {
        let charts = ChartBuilder::from_config(config);
        let base = format!("{}_{}", args.code.replace('.', "_"), args.period.as_str());
        let title = format!("{} ({})", args.code, args.period.as_str());

        let kline = charts.kline_chart(&title, &bars, &frame);
        let path = charts.save(&kline, &format!("{base}_kline.html"))?;
        println!("\nwrote {}", path.display());

        let panel = charts.indicator_panel(&title, &bars, &frame);
        let path = charts.save(&panel, &format!("{base}_indicators.html"))?;
        println!("wrote {}", path.display());
    }

    timer.log_elapsed();
    Ok(())
}

fn print_recent_bars(bars: &[crate::models::DailyBar], count: usize) {
    println!(
        "{:<12} {:>8} {:>8} {:>8} {:>8} {:>10} {:>8}",
        "date", "open", "high", "low", "close", "volume", "chg%"
    );
    let start = bars.len().saturating_sub(count);
    for bar in &bars[start..] {
        println!(
            "{:<12} {:>8.2} {:>8.2} {:>8.2} {:>8.2} {:>10.0} {:>8}",
            display_date(&bar.trade_date),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.vol,
            fmt_opt(bar.pct_chg, 2),
        );
    }
}

fn print_indicator_snapshot(frame: &IndicatorFrame) {
    println!("\nlatest indicator values:");
    println!(
        "  MA5 {}  MA10 {}  MA20 {}  MA60 {}",
        fmt_opt(last_value(&frame.ma5), 2),
        fmt_opt(last_value(&frame.ma10), 2),
        fmt_opt(last_value(&frame.ma20), 2),
        fmt_opt(last_value(&frame.ma60), 2),
    );
    println!(
        "  MACD {}  signal {}  histogram {}",
        fmt_opt(frame.macd.macd.last().copied(), 4),
        fmt_opt(frame.macd.signal.last().copied(), 4),
        fmt_opt(frame.macd.histogram.last().copied(), 4),
    );
    println!(
        "  RSI {}  K {}  D {}  J {}",
        fmt_opt(last_value(&frame.rsi14), 2),
        fmt_opt(last_value(&frame.kdj.k), 2),
        fmt_opt(last_value(&frame.kdj.d), 2),
        fmt_opt(last_value(&frame.kdj.j), 2),
    );
    println!(
        "  BOLL upper {}  middle {}  lower {}  ATR {}",
        fmt_opt(last_value(&frame.boll.upper), 2),
        fmt_opt(last_value(&frame.boll.middle), 2),
        fmt_opt(last_value(&frame.boll.lower), 2),
        fmt_opt(last_value(&frame.atr14), 2),
    );
}

fn print_trend(report: &TrendReport) {
    println!("\ntrend summary:");
    println!(
        "  last close {:.2}  period change {:+.2} ({:+.2}%)  direction {}",
        report.latest_price, report.price_change, report.price_change_pct, report.direction(),
    );
    println!(
        "  period high {:.2}  low {:.2}  average close {:.2}  volatility {:.2}",
        report.highest_price, report.lowest_price, report.average_price, report.price_volatility,
    );
    println!("  average volume {:.0}", report.average_volume);
    if let Some(status) = report.rsi_status {
        println!("  RSI status: {}", status.as_str());
    }
    if let Some(stance) = report.macd_stance {
        println!("  MACD stance: {}", stance.as_str());
    }
    let positions = [
        ("MA5", report.ma_positions.ma5),
        ("MA10", report.ma_positions.ma10),
        ("MA20", report.ma_positions.ma20),
        ("MA60", report.ma_positions.ma60),
    ];
    for (name, position) in positions {
        if let Some(position) = position {
            println!("  close is {} {}", position.as_str(), name);
        }
    }
}
