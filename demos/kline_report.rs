//! End-to-end report for one instrument: fetch a year of daily bars,
//! compute indicators and write the two chart pages. Needs a real token:
//!
//! ```text
//! TUSHARE_TOKEN=... cargo run --example kline_report [-- 600519.SH]
//! ```

use tushare_examples::chart::ChartBuilder;
use tushare_examples::client::TushareClient;
use tushare_examples::config::AppConfig;
use tushare_examples::indicators::{IndicatorFrame, TradeSignals};
use tushare_examples::models::KlinePeriod;
use tushare_examples::utils::{init_logger, trailing_window};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger()?;

    let code = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "600519.SH".to_string());

    let config = AppConfig::from_env();
    config.require_token()?;
    let client = TushareClient::from_config(&config)?;

    let (start, end) = trailing_window(365);
    let bars = client
        .kline(&code, KlinePeriod::Daily, Some(&start), Some(&end))
        .await?;
    anyhow::ensure!(!bars.is_empty(), "no bars returned for {code}");
    println!("{}: {} daily bars", code, bars.len());

    let frame = IndicatorFrame::compute(&bars);
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let signals = TradeSignals::detect(&closes, &frame);
    let active = signals.latest();
    if active.is_empty() {
        println!("no signals on the last bar");
    } else {
        println!("signals on the last bar: {}", active.join(", "));
    }

    let charts = ChartBuilder::from_config(&config);
    let base = code.replace('.', "_");

    let kline = charts.kline_chart(&code, &bars, &frame);
    let path = charts.save(&kline, &format!("{base}_kline.html"))?;
    println!("wrote {}", path.display());

    let panel = charts.indicator_panel(&code, &bars, &frame);
    let path = charts.save(&panel, &format!("{base}_indicators.html"))?;
    println!("wrote {}", path.display());

    Ok(())
}
