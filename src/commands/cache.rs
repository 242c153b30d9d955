//! Inspect and maintain the on-disk response cache.

use clap::{Args, Subcommand};

use crate::config::AppConfig;
use crate::services::ResponseCache;

#[derive(Debug, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Show file count, size on disk and expired entries
    Stats,
    /// Delete expired entries only
    Purge,
    /// Delete every cached response
    Clear,
}

pub async fn run(config: &AppConfig, args: CacheArgs) -> anyhow::Result<()> {
    let cache = ResponseCache::from_config(config);

    match args.action {
        CacheAction::Stats => {
            let stats = cache.stats()?;
            println!("cached responses: {}", stats.files);
            println!("size on disk: {:.1} KiB", stats.total_bytes as f64 / 1024.0);
            println!("expired: {}", stats.expired);
        }
        CacheAction::Purge => {
            let removed = cache.remove_expired()?;
            println!("removed {removed} expired entries");
        }
        CacheAction::Clear => {
            let removed = cache.clear()?;
            println!("removed {removed} entries");
        }
    }

    Ok(())
}
