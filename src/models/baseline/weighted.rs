//! Recency-weighted average of the latest observations.

use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::stats::recency_weighted_average;
use serde::{Deserialize, Serialize};

/// Forecasts a flat line at the weighted mean of the last `window` values.
///
/// Weights rise linearly from `first_weight` for the oldest value in the
/// window to `1.0` for the most recent one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedRecentAverage {
    window: usize,
    first_weight: f64,
    value: Option<f64>,
    fitted: Option<Vec<f64>>,
}

impl WeightedRecentAverage {
    pub fn new(window: usize, first_weight: f64) -> Self {
        Self {
            window: window.max(1),
            first_weight,
            value: None,
            fitted: None,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl Default for WeightedRecentAverage {
    /// Last six observations, weights 0.1 to 1.0.
    fn default() -> Self {
        Self::new(6, 0.1)
    }
}

impl Forecaster for WeightedRecentAverage {
    fn fit(&mut self, series: &[f64]) -> Result<()> {
        if series.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ComputationError(
                "series contains missing values".into(),
            ));
        }
        let value = recency_weighted_average(series, self.window, self.first_weight)
            .ok_or(ForecastError::EmptyData)?;

        let fitted = (0..series.len())
            .map(|t| {
                recency_weighted_average(&series[..t], self.window, self.first_weight)
                    .unwrap_or(f64::NAN)
            })
            .collect();

        self.value = Some(value);
        self.fitted = Some(fitted);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Vec<f64>> {
        let value = self.value.ok_or(ForecastError::FitRequired)?;
        Ok(vec![value; horizon])
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn name(&self) -> &str {
        "WeightedRecentAverage"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn weighted_average_uses_last_window() {
        let mut model = WeightedRecentAverage::new(2, 0.5);
        model.fit(&[1000.0, 10.0, 20.0]).unwrap();
        // weights 0.5, 1.0
        let expected = (5.0 + 20.0) / 1.5;
        assert_eq!(model.predict(3).unwrap().len(), 3);
        assert_relative_eq!(model.predict(1).unwrap()[0], expected, epsilon = 1e-12);

        let fitted = model.fitted_values().unwrap();
        assert!(fitted[0].is_nan());
        assert_relative_eq!(fitted[1], 1000.0, epsilon = 1e-12);
    }

    #[test]
    fn weighted_average_needs_data() {
        let mut model = WeightedRecentAverage::default();
        assert!(matches!(model.fit(&[]), Err(ForecastError::EmptyData)));
        assert_eq!(model.window(), 6);
    }
}
