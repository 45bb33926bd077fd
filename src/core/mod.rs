//! Core data structures: periods, frames and result rows.

mod forecast;
mod frame;
pub mod period;

pub use forecast::{ForecastRow, ReconciledRow, Segment};
pub use frame::{FeatureMatrix, TimeSeriesFrame};
pub use period::{Granularity, GranularityPolicy};
