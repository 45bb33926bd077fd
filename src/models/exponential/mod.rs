//! Exponential smoothing models.
//!
//! This module provides exponential smoothing forecasting methods:
//! - Simple Exponential Smoothing (SES)
//! - Holt's Linear Trend, optionally damped

mod holt;
mod ses;

pub use holt::HoltLinearTrend;
pub use ses::SimpleExponentialSmoothing;
