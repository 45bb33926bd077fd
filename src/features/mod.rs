//! Feature construction for the point-forecast model.

pub mod builder;
pub mod calendar;

pub use builder::{FeatureBuilder, TS_FORECAST};
