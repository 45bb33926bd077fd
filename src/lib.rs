//! # route-forecast
//!
//! Route-level demand forecasting at monthly, quarterly and yearly
//! granularity.
//!
//! The crate covers the numeric core of a route forecasting service:
//! assembling one route's series from a shared dataset, repairing missing
//! values with separate strategies for the interior and the trailing gap,
//! building calendar, lag and auxiliary time-model features, rolling a point
//! model forward one period at a time, and reconciling a fine forecast against
//! a coarser one (linear calibration or MinT).

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
#![allow(clippy::needless_range_loop)]

pub mod config;
pub mod core;
pub mod error;
pub mod features;
pub mod models;
pub mod pipeline;
pub mod preprocess;
pub mod reconcile;
pub mod transform;
pub mod utils;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::config::{FitScope, PipelineConfig};
    pub use crate::core::{ForecastRow, Granularity, ReconciledRow, Segment, TimeSeriesFrame};
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::{Forecaster, ModelSpec, PointModel, RidgeRegression, TimeModelKind};
    pub use crate::pipeline::{BatchRunner, RawRecord, RouteDataset, RoutePipeline};
    pub use crate::reconcile::{ReconcileMethod, ReconciliationEngine};
    pub use crate::utils::{calculate_metrics, AccuracyMetrics};
}
