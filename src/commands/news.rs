//! Flash news with keyword sentiment and publishing-frequency stats.

use clap::Args;
use tokio::time::sleep;

use super::{build_client, heading, opt_str, REQUEST_PACING};
use crate::analysis::{analyze_frequency, average_sentiment, score_text, SentimentScore};
use crate::config::AppConfig;
use crate::models::NewsItem;
use crate::utils::{days_ago_compact, today_compact, Logger, Timer};

/// Headlines shown before the aggregate sections.
const SHOWN_HEADLINES: usize = 10;
const TOP_KEYWORDS: usize = 10;

#[derive(Debug, Args)]
pub struct NewsArgs {
    /// News source (sina, wallstreetcn, 10jqka, eastmoney, yuncaijing...)
    #[arg(short, long, default_value = "sina")]
    pub source: String,

    /// Lookback window in days
    #[arg(short, long, default_value_t = 7)]
    pub days: i64,

    /// Maximum number of items to fetch
    #[arg(short, long, default_value_t = 100)]
    pub limit: u32,

    /// Also pull announcements and research reports for this code
    #[arg(long)]
    pub code: Option<String>,
}

pub async fn run(config: &AppConfig, args: NewsArgs) -> anyhow::Result<()> {
    let log = Logger::new("news");
    let timer = Timer::start("news analysis");
    let client = build_client(config)?;

    let start = days_ago_compact(args.days);
    let end = today_compact();
    let items = client
        .news(Some(&args.source), Some(&start), Some(&end), args.limit)
        .await?;
    log.info(&format!(
        "{} items from {} over the last {} days",
        items.len(),
        args.source,
        args.days,
    ));

    heading(&format!("news · {}", args.source));
    if items.is_empty() {
        println!("no news in the window");
    } else {
        print_headlines(&items);
        print_sentiment(&items);
        print_frequency(&items);
    }

    if let Some(code) = &args.code {
        sleep(REQUEST_PACING).await;
        let anns = client
            .announcements(Some(code), None, Some(&start), Some(&end), None, 50)
            .await?;
        heading(&format!("announcements · {code}"));
        if anns.is_empty() {
            println!("no announcements in the window");
        }
        for ann in anns.iter().take(SHOWN_HEADLINES) {
            println!(
                "{}  {}",
                opt_str(&ann.ann_date),
                opt_str(&ann.title),
            );
        }

        sleep(REQUEST_PACING).await;
        let reports = client
            .research_reports(Some(code), Some(&start), Some(&end), 50)
            .await?;
        heading(&format!("research reports · {code}"));
        if reports.is_empty() {
            println!("no research reports in the window");
        }
        for report in reports.iter().take(SHOWN_HEADLINES) {
            println!(
                "{}  [{}] {}",
                opt_str(&report.report_date),
                opt_str(&report.org_name),
                opt_str(&report.title),
            );
        }
    }

    timer.log_elapsed();
    Ok(())
}

fn print_headlines(items: &[NewsItem]) {
    println!("latest headlines:");
    for item in items.iter().take(SHOWN_HEADLINES) {
        let when = item.datetime.as_deref().unwrap_or("-");
        let source = item.source().unwrap_or("-");
        let title = item.title.as_deref().unwrap_or("(untitled)");
        println!("{when}  [{source}] {title}");
    }
}

fn print_sentiment(items: &[NewsItem]) {
    let scores: Vec<SentimentScore> = items.iter().map(|i| score_text(&i.text())).collect();
    let avg = average_sentiment(&scores);
    println!("\nsentiment across {} items: {}", scores.len(), avg.stance());
    println!(
        "  positive {:.2}  negative {:.2}  neutral {:.2}",
        avg.positive, avg.negative, avg.neutral,
    );
}

fn print_frequency(items: &[NewsItem]) {
    let freq = analyze_frequency(items, TOP_KEYWORDS);

    if let Some((first, last)) = &freq.date_range {
        println!("\n{} items between {} and {}", freq.total, first, last);
    }
    if !freq.daily_counts.is_empty() {
        println!("items per day:");
        for (date, count) in &freq.daily_counts {
            println!("  {date}  {count}");
        }
    }
    if !freq.source_counts.is_empty() {
        println!("by source:");
        for (source, count) in &freq.source_counts {
            println!("  {source}  {count}");
        }
    }
    if !freq.top_keywords.is_empty() {
        println!("frequent title keywords:");
        for (token, count) in &freq.top_keywords {
            println!("  {token}  {count}");
        }
    }
}
