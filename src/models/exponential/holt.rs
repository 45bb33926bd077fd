//! Holt's Linear Trend forecasting model.
//!
//! Also known as double exponential smoothing, this model is suitable for
//! data with a linear trend but no seasonality.

use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use serde::{Deserialize, Serialize};

const SMOOTHING_BOUNDS: (f64, f64) = (0.0001, 0.9999);

/// Holt's Linear Trend forecaster with optimized smoothing parameters.
///
/// The model equations are:
/// - Level: `l_t = α × y_t + (1-α) × (l_{t-1} + b_{t-1})`
/// - Trend: `b_t = β × (l_t - l_{t-1}) + (1-β) × b_{t-1}`
/// - Forecast: `ŷ_{t+h} = l_t + h × b_t`
///
/// α and β minimise the in-sample one-step squared error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HoltLinearTrend {
    alpha: Option<f64>,
    beta: Option<f64>,
    level: Option<f64>,
    trend: Option<f64>,
    fitted: Option<Vec<f64>>,
}

impl HoltLinearTrend {
    pub fn auto() -> Self {
        Self::default()
    }

    /// Smoothing parameters chosen at fit time.
    pub fn params(&self) -> Option<(f64, f64)> {
        self.alpha.zip(self.beta)
    }

    /// Run the recursion, returning one-step forecasts and the final state.
    fn filter(values: &[f64], alpha: f64, beta: f64) -> (Vec<f64>, f64, f64) {
        let mut l = values[0];
        let mut b = values[1] - values[0];
        let mut fitted = Vec::with_capacity(values.len());
        fitted.push(f64::NAN);

        for &y in values.iter().skip(1) {
            fitted.push(l + b);
            let l_prev = l;
            l = alpha * y + (1.0 - alpha) * (l_prev + b);
            b = beta * (l - l_prev) + (1.0 - beta) * b;
        }
        (fitted, l, b)
    }

    fn sse(values: &[f64], alpha: f64, beta: f64) -> f64 {
        let (fitted, _, _) = Self::filter(values, alpha, beta);
        values
            .iter()
            .zip(&fitted)
            .skip(1)
            .map(|(y, f)| (y - f).powi(2))
            .sum()
    }

    fn optimize_params(values: &[f64]) -> (f64, f64) {
        let config = NelderMeadConfig {
            max_iter: 1000,
            ..Default::default()
        };
        let result = nelder_mead(
            |p| Self::sse(values, p[0], p[1]),
            &[0.3, 0.1],
            Some(&[SMOOTHING_BOUNDS, SMOOTHING_BOUNDS]),
            &config,
        );
        (result.point[0], result.point[1])
    }
}

impl Forecaster for HoltLinearTrend {
    fn fit(&mut self, series: &[f64]) -> Result<()> {
        if series.len() < 3 {
            return Err(ForecastError::InsufficientData {
                needed: 3,
                got: series.len(),
            });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ComputationError(
                "series contains missing values".into(),
            ));
        }

        let (alpha, beta) = Self::optimize_params(series);
        let (fitted, level, trend) = Self::filter(series, alpha, beta);
        self.alpha = Some(alpha);
        self.beta = Some(beta);
        self.level = Some(level);
        self.trend = Some(trend);
        self.fitted = Some(fitted);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Vec<f64>> {
        let level = self.level.ok_or(ForecastError::FitRequired)?;
        let trend = self.trend.ok_or(ForecastError::FitRequired)?;
        Ok((1..=horizon).map(|h| level + h as f64 * trend).collect())
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn name(&self) -> &str {
        "Holt"
    }
}
