//! CLI subcommand implementations. Each module owns its clap argument
//! struct and an async `run` entry point.

pub mod cache;
pub mod compare;
pub mod financials;
pub mod kline;
pub mod news;
pub mod quote;
pub mod screen;
pub mod stocks;

use std::time::Duration;

use crate::client::TushareClient;
use crate::config::AppConfig;
use crate::services::ResponseCache;

/// Pause between consecutive API calls in per-stock loops, to stay
/// friendly with the vendor's per-minute quota.
pub(crate) const REQUEST_PACING: Duration = Duration::from_millis(300);

pub(crate) fn build_client(config: &AppConfig) -> anyhow::Result<TushareClient> {
    Ok(TushareClient::from_config(config)?.with_cache(ResponseCache::from_config(config)))
}

pub(crate) fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{v:.precision$}"),
        None => "-".to_string(),
    }
}

pub(crate) fn opt_str(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

pub(crate) fn heading(title: &str) {
    println!("{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_opt() {
        assert_eq!(fmt_opt(Some(3.14159), 2), "3.14");
        assert_eq!(fmt_opt(None, 2), "-");
    }

    #[test]
    fn test_opt_str() {
        assert_eq!(opt_str(&Some("bank".to_string())), "bank");
        assert_eq!(opt_str(&None), "-");
    }
}
