//! Straight-line trend on the observation index.

use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::ols::{linear_fit, LinearFit};
use serde::{Deserialize, Serialize};

/// Least-squares line through `(t, y_t)` for `t = 0, 1, ..`, extended past the end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinearTrend {
    line: Option<LinearFit>,
    n: usize,
    fitted: Option<Vec<f64>>,
}

impl LinearTrend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&self) -> Option<LinearFit> {
        self.line
    }
}

impl Forecaster for LinearTrend {
    fn fit(&mut self, series: &[f64]) -> Result<()> {
        if series.len() < 2 {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                got: series.len(),
            });
        }
        let index: Vec<f64> = (0..series.len()).map(|t| t as f64).collect();
        let line = linear_fit(&index, series)?;
        self.fitted = Some(line.predict_many(&index));
        self.line = Some(line);
        self.n = series.len();
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Vec<f64>> {
        let line = self.line.ok_or(ForecastError::FitRequired)?;
        Ok((0..horizon).map(|h| line.predict((self.n + h) as f64)).collect())
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn name(&self) -> &str {
        "LinearTrend"
    }
}
