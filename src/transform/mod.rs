//! Data transformations for route series.
//!
//! Provides z-score scaling and the shifted/windowed views behind lag features.

pub mod scale;
pub mod window;

pub use scale::{ColumnScale, StandardScaler};
pub use window::{lag, trailing_mean};
