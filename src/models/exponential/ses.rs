//! Simple Exponential Smoothing (SES) forecasting model.
//!
//! SES is suitable for forecasting data with no clear trend or seasonality.

use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use serde::{Deserialize, Serialize};

const ALPHA_BOUNDS: (f64, f64) = (0.0001, 0.9999);

/// Simple Exponential Smoothing forecaster.
///
/// The model equation is:
/// `level_t = α × y_t + (1-α) × level_{t-1}`
///
/// where α (alpha) is the smoothing parameter (0 < α < 1).
///
/// # Example
/// ```
/// use route_forecast::models::exponential::SimpleExponentialSmoothing;
/// use route_forecast::models::Forecaster;
///
/// let values = vec![10.0, 12.0, 11.0, 13.0, 12.0, 14.0, 13.0, 15.0, 14.0, 16.0];
/// let mut model = SimpleExponentialSmoothing::new(0.3);
/// model.fit(&values).unwrap();
///
/// let forecast = model.predict(3).unwrap();
/// assert_eq!(forecast.len(), 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleExponentialSmoothing {
    /// Smoothing parameter; `None` until optimized.
    alpha: Option<f64>,
    optimize: bool,
    level: Option<f64>,
    fitted: Option<Vec<f64>>,
}

impl SimpleExponentialSmoothing {
    /// Create a new SES model with a fixed smoothing parameter.
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: Some(alpha.clamp(ALPHA_BOUNDS.0, ALPHA_BOUNDS.1)),
            optimize: false,
            level: None,
            fitted: None,
        }
    }

    /// Create a new SES model with automatic alpha optimization.
    ///
    /// Alpha will be chosen to minimize the sum of squared errors.
    pub fn auto() -> Self {
        Self {
            alpha: None,
            optimize: true,
            level: None,
            fitted: None,
        }
    }

    pub fn alpha(&self) -> Option<f64> {
        self.alpha
    }

    pub fn level(&self) -> Option<f64> {
        self.level
    }

    /// Calculate SSE for a given alpha value.
    fn calculate_sse(values: &[f64], alpha: f64) -> f64 {
        let mut level = values[0];
        let mut sse = 0.0;
        for &y in &values[1..] {
            let error = y - level;
            sse += error * error;
            level = alpha * y + (1.0 - alpha) * level;
        }
        sse
    }

    fn optimize_alpha(values: &[f64]) -> f64 {
        let result = nelder_mead(
            |params| Self::calculate_sse(values, params[0]),
            &[0.5],
            Some(&[ALPHA_BOUNDS]),
            &NelderMeadConfig::default(),
        );
        result.point[0].clamp(ALPHA_BOUNDS.0, ALPHA_BOUNDS.1)
    }
}

impl Default for SimpleExponentialSmoothing {
    fn default() -> Self {
        Self::auto()
    }
}

impl Forecaster for SimpleExponentialSmoothing {
    fn fit(&mut self, series: &[f64]) -> Result<()> {
        if series.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ComputationError(
                "series contains missing values".into(),
            ));
        }

        if self.optimize && series.len() > 1 {
            self.alpha = Some(Self::optimize_alpha(series));
        }
        let alpha = self.alpha.unwrap_or(0.5);
        self.alpha = Some(alpha);

        // First fitted value is the initial level.
        let mut level = series[0];
        let mut fitted = Vec::with_capacity(series.len());
        for &y in series {
            fitted.push(level);
            level = alpha * y + (1.0 - alpha) * level;
        }

        self.level = Some(level);
        self.fitted = Some(fitted);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Vec<f64>> {
        let level = self.level.ok_or(ForecastError::FitRequired)?;
        // SES produces flat forecasts at the final level
        Ok(vec![level; horizon])
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn name(&self) -> &str {
        "SES"
    }
}
