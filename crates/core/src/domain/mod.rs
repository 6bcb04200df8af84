pub mod maturity;
pub mod snapshot;

pub use maturity::Maturity;
pub use snapshot::{unpivot, LongRow, RateRow, RateSnapshot};
