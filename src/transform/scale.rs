//! Z-score scaling fitted once on a reference frame and reused afterwards.

use crate::core::TimeSeriesFrame;
use crate::error::{ForecastError, Result};
use crate::utils::stats;
use serde::{Deserialize, Serialize};

/// Centre and scale of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnScale {
    pub column: String,
    pub center: f64,
    pub scale: f64,
}

impl ColumnScale {
    pub fn apply(&self, x: f64) -> f64 {
        (x - self.center) / self.scale
    }

    pub fn invert(&self, z: f64) -> f64 {
        z * self.scale + self.center
    }
}

/// Per-column standardization, `x_scaled = (x - mean) / std`.
///
/// Uses the population standard deviation. Constant columns get a scale of 1
/// so they map to zero instead of dividing by zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    scales: Vec<ColumnScale>,
    fitted: bool,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn centre and scale for `columns` from `frame`.
    pub fn fit(&mut self, frame: &TimeSeriesFrame, columns: &[String]) -> Result<()> {
        let mut scales = Vec::with_capacity(columns.len());
        for name in columns {
            let values = frame.column(name)?;
            let center = stats::mean(values);
            let std = stats::population_std_dev(values);
            let center = if center.is_finite() { center } else { 0.0 };
            let scale = if std.is_finite() && std > 1e-10 { std } else { 1.0 };
            scales.push(ColumnScale {
                column: name.clone(),
                center,
                scale,
            });
        }
        self.scales = scales;
        self.fitted = true;
        Ok(())
    }

    /// Scale the fitted columns of `frame` in place. Columns the frame lacks are skipped.
    pub fn transform(&self, frame: &mut TimeSeriesFrame) -> Result<()> {
        if !self.fitted {
            return Err(ForecastError::FitRequired);
        }
        for scale in &self.scales {
            if let Ok(values) = frame.column_mut(&scale.column) {
                values.iter_mut().for_each(|v| *v = scale.apply(*v));
            }
        }
        Ok(())
    }

    /// Undo the scaling of a single value of `column`.
    pub fn inverse_value(&self, column: &str, z: f64) -> Option<f64> {
        self.scales
            .iter()
            .find(|s| s.column == column)
            .map(|s| s.invert(z))
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    pub fn scales(&self) -> &[ColumnScale] {
        &self.scales
    }
}
