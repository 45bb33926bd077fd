//! Numeric utilities shared by the preprocessor, the models and reconciliation.

pub mod metrics;
pub mod ols;
pub mod optimization;
pub mod stats;

pub use metrics::{calculate_metrics, AccuracyMetrics};
pub use ols::{linear_fit, LinearFit};
pub use optimization::{nelder_mead, Minimum, NelderMeadConfig};
