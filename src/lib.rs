//! # Tushare Pro examples
//!
//! A market-data toolkit for the Tushare Pro HTTP API featuring:
//! - Typed async client with bounded retry, jittered backoff and an
//!   on-disk response cache
//! - Textbook technical indicators (MA, EMA, MACD, RSI, BOLL, KDJ, ATR,
//!   Williams %R, CCI) with pandas-compatible warm-up behavior
//! - Trend, financial, screening, comparison and news analysis
//! - Interactive HTML charts built on plotly
//!
//! ## Quick Start
//!
//! ```no_run
//! use tushare_examples::client::TushareClient;
//! use tushare_examples::indicators::{last_value, IndicatorFrame};
//! use tushare_examples::models::KlinePeriod;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = TushareClient::new("your-40-char-tushare-pro-token-goes-here")?;
//!     let bars = client
//!         .kline("000001.SZ", KlinePeriod::Daily, Some("20240101"), None)
//!         .await?;
//!     let frame = IndicatorFrame::compute(&bars);
//!     println!("{} bars, MA20 {:?}", bars.len(), last_value(&frame.ma20));
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod chart;
pub mod client;
pub mod commands;
pub mod config;
pub mod indicators;
pub mod models;
pub mod services;
pub mod utils;

pub use client::{TushareClient, TushareError};
pub use config::AppConfig;
