//! Analysis built on top of the fetched data: trend summaries,
//! financial statement ratios, screening, multi-stock comparison and
//! news sentiment.

pub mod compare;
pub mod financial;
pub mod news;
pub mod screener;
pub mod trend;

pub use compare::*;
pub use financial::*;
pub use news::*;
pub use screener::*;
pub use trend::*;
