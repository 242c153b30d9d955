use clap::{Parser, Subcommand};

use tushare_examples::commands::{cache, compare, financials, kline, news, quote, screen, stocks};
use tushare_examples::config::AppConfig;
use tushare_examples::utils::init_logger;

#[derive(Parser)]
#[command(name = "tushare-examples")]
#[command(about = "Tushare Pro market data: quotes, indicators, screening and charts")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List and filter the listed-stock universe
    Stocks(stocks::StocksArgs),
    /// Latest price snapshot for one or more codes
    Quote(quote::QuoteArgs),
    /// OHLCV history with indicators, signals and charts
    Kline(kline::KlineArgs),
    /// Financial statements, ratios and a rule-based assessment
    Financials(financials::FinancialsArgs),
    /// Flash news with sentiment and frequency analysis
    News(news::NewsArgs),
    /// Screen the market on fundamental and technical criteria
    Screen(screen::ScreenArgs),
    /// Compare performance and correlation across instruments
    Compare(compare::CompareArgs),
    /// Inspect or clean the response cache
    Cache(cache::CacheArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger()?;

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    match cli.command {
        Commands::Stocks(args) => stocks::run(&config, args).await,
        Commands::Quote(args) => quote::run(&config, args).await,
        Commands::Kline(args) => kline::run(&config, args).await,
        Commands::Financials(args) => financials::run(&config, args).await,
        Commands::News(args) => news::run(&config, args).await,
        Commands::Screen(args) => screen::run(&config, args).await,
        Commands::Compare(args) => compare::run(&config, args).await,
        Commands::Cache(args) => cache::run(&config, args).await,
    }
}
