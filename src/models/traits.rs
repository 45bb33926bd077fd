//! Model traits: single-series forecasters and feature-based point models.

use crate::core::FeatureMatrix;
use crate::error::Result;

/// Common interface for the single-series time models.
///
/// Models are fitted on a gap-free slice of observations and forecast a
/// number of steps past its end.
pub trait Forecaster {
    /// Fit the model to the series.
    fn fit(&mut self, series: &[f64]) -> Result<()>;

    /// Generate point predictions for the next `horizon` periods.
    fn predict(&self, horizon: usize) -> Result<Vec<f64>>;

    /// In-sample one-step-ahead fitted values on the original scale.
    ///
    /// Same length as the fitted series; warm-up positions without a fit are `NaN`.
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}

/// Point-forecast regressor driven by the engineered feature matrix.
///
/// Injected into the rolling forecaster; each route gets its own instance.
pub trait PointModel: Send {
    /// Fit on a design matrix and the matching targets.
    fn fit(&mut self, x: &FeatureMatrix, y: &[f64]) -> Result<()>;

    /// Predict one value per row of `x`.
    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>>;

    fn name(&self) -> &str;

    fn is_fitted(&self) -> bool;
}

/// Type alias for boxed point model trait objects.
pub type BoxedPointModel = Box<dyn PointModel>;

/// Named factory producing a fresh point model per route.
///
/// # Example
///
/// ```
/// use route_forecast::models::{ModelSpec, RidgeRegression};
///
/// let spec = ModelSpec::new("Ridge", || Box::new(RidgeRegression::new(1.0)));
/// let model = spec.create();
/// assert!(!model.is_fitted());
/// ```
pub struct ModelSpec {
    /// Display name of the model
    pub name: &'static str,
    factory: Box<dyn Fn() -> BoxedPointModel + Send + Sync>,
}

impl ModelSpec {
    pub fn new<F>(name: &'static str, factory: F) -> Self
    where
        F: Fn() -> BoxedPointModel + Send + Sync + 'static,
    {
        Self {
            name,
            factory: Box::new(factory),
        }
    }

    /// Create a new, unfitted model instance.
    pub fn create(&self) -> BoxedPointModel {
        (self.factory)()
    }
}

impl std::fmt::Debug for ModelSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSpec").field("name", &self.name).finish()
    }
}
