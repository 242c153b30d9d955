//! Latest price snapshot for one or more codes.

use clap::Args;
use tokio::time::sleep;

use super::{build_client, fmt_opt, heading, opt_str, REQUEST_PACING};
use crate::config::AppConfig;
use crate::models::RealtimeInfo;
use crate::utils::{display_date, Logger};

#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// Instrument codes, comma separated (e.g. 000001.SZ,600519.SH)
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub codes: Vec<String>,
}

pub async fn run(config: &AppConfig, args: QuoteArgs) -> anyhow::Result<()> {
    let log = Logger::new("quote");
    let client = build_client(config)?;

    heading("latest quotes");
    for (i, code) in args.codes.iter().enumerate() {
        if i > 0 {
            sleep(REQUEST_PACING).await;
        }
        match client.realtime_info(code).await {
            Ok(info) => print_quote(&info),
            Err(err) => {
                log.warn_with_error(&format!("skipping {code}"), &err);
                println!("✗ {code}: {err}");
            }
        }
    }
    Ok(())
}

fn print_quote(info: &RealtimeInfo) {
    match &info.latest {
        Some(bar) => {
            let sign = match info.price_change {
                Some(change) if change > 0.0 => "+",
                _ => "",
            };
            println!(
                "✓ {} {} ({})  close {:.2}  change {}{} ({}{}%)  high {:.2}  low {:.2}  vol {:.0} [{}]",
                info.ts_code,
                info.name,
                opt_str(&info.industry),
                bar.close,
                sign,
                fmt_opt(info.price_change, 2),
                sign,
                fmt_opt(info.pct_change, 2),
                bar.high,
                bar.low,
                bar.vol,
                display_date(&bar.trade_date),
            );
        }
        None => println!("✗ {} {}: no recent bar", info.ts_code, info.name),
    }
}
