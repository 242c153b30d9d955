pub mod date;
pub mod logger;

pub use date::*;
pub use logger::*;
