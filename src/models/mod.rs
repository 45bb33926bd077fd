//! Forecasting models.
//!
//! Single-series time models (ARIMA, SARIMA, exponential smoothing and
//! baselines) back the tail fill and the auxiliary feature; point models map
//! engineered features to the target.

mod traits;

pub mod arima;
pub mod auxiliary;
pub mod baseline;
pub mod exponential;
pub mod ridge;
pub mod time_model;

pub use auxiliary::AuxiliaryForecaster;
pub use ridge::RidgeRegression;
pub use time_model::{TimeModel, TimeModelKind};
pub use traits::{BoxedPointModel, Forecaster, ModelSpec, PointModel};
