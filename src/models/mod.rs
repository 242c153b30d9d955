pub mod financial;
pub mod news;
pub mod stock;
pub mod table;

pub use financial::*;
pub use news::*;
pub use stock::*;
pub use table::*;
