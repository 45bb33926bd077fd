//! Baseline forecasting models.
//!
//! Simple methods used as tail models and as the last resort when the
//! statistical models cannot be fitted.

mod trend;
mod weighted;

pub use trend::LinearTrend;
pub use weighted::WeightedRecentAverage;
