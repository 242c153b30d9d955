//! Indicator tour on a synthetic series. Runs fully offline, no token
//! required:
//!
//! ```text
//! cargo run --example offline_indicators
//! ```

use chrono::NaiveDate;

use tushare_examples::analysis::TrendReport;
use tushare_examples::indicators::{last_value, IndicatorFrame, TradeSignals};
use tushare_examples::models::DailyBar;
use tushare_examples::utils::{format_compact_date, is_weekend};

/// Deterministic price path: a slow uptrend with a sine swing on top.
fn synthetic_bars(days: usize) -> Vec<DailyBar> {
    let mut bars = Vec::with_capacity(days);
    let mut date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let mut prev_close = None;

    for i in 0..days {
        while is_weekend(date) {
            date = date.succ_opt().unwrap();
        }
        let t = i as f64;
        let close = 100.0 + 0.15 * t + 6.0 * (t / 9.0).sin();
        let open = prev_close.unwrap_or(close - 0.3);
        let high = close.max(open) + 0.8;
        let low = close.min(open) - 0.8;

        bars.push(DailyBar {
            ts_code: "000001.SZ".to_string(),
            trade_date: format_compact_date(date),
            open,
            high,
            low,
            close,
            pre_close: prev_close,
            change: prev_close.map(|p| close - p),
            pct_chg: prev_close.map(|p| (close - p) / p * 100.0),
            vol: 80_000.0 + 20_000.0 * (t / 5.0).cos().abs(),
            amount: None,
        });

        prev_close = Some(close);
        date = date.succ_opt().unwrap();
    }
    bars
}

fn fmt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    }
}

fn main() {
    let bars = synthetic_bars(120);
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let frame = IndicatorFrame::compute(&bars);
    println!("computed indicators over {} synthetic bars\n", bars.len());

    println!("latest values:");
    println!(
        "  close {:.2}  MA5 {}  MA20 {}  MA60 {}",
        closes[closes.len() - 1],
        fmt(last_value(&frame.ma5)),
        fmt(last_value(&frame.ma20)),
        fmt(last_value(&frame.ma60)),
    );
    println!(
        "  MACD {:.4}  signal {:.4}  RSI {}  ATR {}",
        frame.macd.macd[frame.macd.macd.len() - 1],
        frame.macd.signal[frame.macd.signal.len() - 1],
        fmt(last_value(&frame.rsi14)),
        fmt(last_value(&frame.atr14)),
    );
    println!(
        "  BOLL {} / {} / {}  K {}  D {}  J {}",
        fmt(last_value(&frame.boll.upper)),
        fmt(last_value(&frame.boll.middle)),
        fmt(last_value(&frame.boll.lower)),
        fmt(last_value(&frame.kdj.k)),
        fmt(last_value(&frame.kdj.d)),
        fmt(last_value(&frame.kdj.j)),
    );

    let signals = TradeSignals::detect(&closes, &frame);
    let golden: Vec<usize> = signals
        .macd_golden_cross
        .iter()
        .enumerate()
        .filter_map(|(i, &hit)| hit.then_some(i))
        .collect();
    let death: Vec<usize> = signals
        .macd_death_cross
        .iter()
        .enumerate()
        .filter_map(|(i, &hit)| hit.then_some(i))
        .collect();
    println!(
        "\nMACD crosses: {} golden, {} death",
        golden.len(),
        death.len()
    );
    for i in &golden {
        println!("  golden cross on {}", bars[*i].trade_date);
    }
    for i in &death {
        println!("  death cross on {}", bars[*i].trade_date);
    }

    let active = signals.latest();
    if active.is_empty() {
        println!("\nno signals on the last bar");
    } else {
        println!("\nsignals on the last bar: {}", active.join(", "));
    }

    if let Some(report) = TrendReport::analyze(&bars, &frame) {
        println!(
            "\ntrend: {} ({:+.2}% over the period)",
            report.direction(),
            report.price_change_pct
        );
    }
}
