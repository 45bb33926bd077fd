//! Ridge regression point model.

use crate::core::FeatureMatrix;
use crate::error::{ForecastError, Result};
use crate::models::PointModel;
use crate::utils::ols::solve_symmetric;
use crate::utils::stats;
use serde::{Deserialize, Serialize};

/// L2-penalised linear regression on standardized features.
///
/// Features are centred and scaled with the training mean and population
/// standard deviation; missing feature values are imputed with the training
/// mean, which is zero after standardization. The intercept is the mean of
/// the training targets and is not penalised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidgeRegression {
    lambda: f64,
    columns: Vec<String>,
    means: Vec<f64>,
    scales: Vec<f64>,
    coefficients: Vec<f64>,
    intercept: f64,
    fitted: bool,
}

impl RidgeRegression {
    pub fn new(lambda: f64) -> Self {
        Self {
            lambda: lambda.max(0.0),
            columns: Vec::new(),
            means: Vec::new(),
            scales: Vec::new(),
            coefficients: Vec::new(),
            intercept: 0.0,
            fitted: false,
        }
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Coefficients on the standardized scale, one per feature column.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    fn standardize_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(&x, (&mean, &scale))| {
                if x.is_finite() {
                    (x - mean) / scale
                } else {
                    0.0
                }
            })
            .collect()
    }
}

impl Default for RidgeRegression {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl PointModel for RidgeRegression {
    fn fit(&mut self, x: &FeatureMatrix, y: &[f64]) -> Result<()> {
        if x.n_rows() != y.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: x.n_rows(),
                got: y.len(),
            });
        }
        if x.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidParameter(
                "training targets must be finite".into(),
            ));
        }

        let p = x.n_cols();
        self.columns = x.columns().to_vec();
        self.means = Vec::with_capacity(p);
        self.scales = Vec::with_capacity(p);
        for j in 0..p {
            let column = x.column_values(j);
            let mean = stats::mean(&column);
            let std = stats::population_std_dev(&column);
            self.means.push(if mean.is_finite() { mean } else { 0.0 });
            self.scales
                .push(if std.is_finite() && std > 1e-12 { std } else { 1.0 });
        }

        let z: Vec<Vec<f64>> = x.rows().iter().map(|r| self.standardize_row(r)).collect();
        let y_mean = y.iter().sum::<f64>() / y.len() as f64;

        // Normal equations (Z'Z + λI) β = Z'(y - ȳ)
        let mut ztz = vec![vec![0.0; p]; p];
        let mut zty = vec![0.0; p];
        for (row, &target) in z.iter().zip(y) {
            let centred = target - y_mean;
            for i in 0..p {
                zty[i] += row[i] * centred;
                for j in 0..=i {
                    ztz[i][j] += row[i] * row[j];
                }
            }
        }
        for i in 0..p {
            for j in 0..i {
                ztz[j][i] = ztz[i][j];
            }
            ztz[i][i] += self.lambda.max(1e-10);
        }

        let coefficients = if p == 0 {
            Vec::new()
        } else {
            solve_symmetric(&ztz, &zty).ok_or_else(|| {
                ForecastError::ComputationError("ridge normal equations are singular".into())
            })?
        };

        self.coefficients = coefficients;
        self.intercept = y_mean;
        self.fitted = true;
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>> {
        if !self.fitted {
            return Err(ForecastError::FitRequired);
        }
        if x.columns() != self.columns.as_slice() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.columns.len(),
                got: x.n_cols(),
            });
        }
        Ok(x.rows()
            .iter()
            .map(|row| {
                let z = self.standardize_row(row);
                self.intercept
                    + z.iter()
                        .zip(&self.coefficients)
                        .map(|(a, b)| a * b)
                        .sum::<f64>()
            })
            .collect())
    }

    fn name(&self) -> &str {
        "Ridge"
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn matrix(rows: Vec<Vec<f64>>) -> FeatureMatrix {
        FeatureMatrix::new(vec!["a".to_string(), "b".to_string()], rows).unwrap()
    }

    #[test]
    fn ridge_recovers_linear_relationship_with_small_penalty() {
        // y = 3 + 2a - b
        let rows: Vec<Vec<f64>> = (0..30)
            .map(|i| vec![i as f64, ((i * 7) % 11) as f64])
            .collect();
        let y: Vec<f64> = rows.iter().map(|r| 3.0 + 2.0 * r[0] - r[1]).collect();
        let mut model = RidgeRegression::new(1e-8);
        model.fit(&matrix(rows), &y).unwrap();

        let pred = model.predict(&matrix(vec![vec![40.0, 5.0]])).unwrap();
        assert_relative_eq!(pred[0], 78.0, epsilon = 1e-4);
    }

    #[test]
    fn ridge_imputes_missing_features_with_training_mean() {
        let rows = vec![vec![1.0, 1.0], vec![2.0, 3.0], vec![3.0, 5.0]];
        let y = vec![10.0, 20.0, 30.0];
        let mut model = RidgeRegression::new(0.1);
        model.fit(&matrix(rows), &y).unwrap();

        let pred = model
            .predict(&matrix(vec![vec![f64::NAN, f64::NAN]]))
            .unwrap();
        assert_relative_eq!(pred[0], 20.0, epsilon = 1e-12);
    }

    #[test]
    fn ridge_rejects_mismatched_columns() {
        let mut model = RidgeRegression::default();
        assert!(matches!(
            model.predict(&matrix(vec![vec![1.0, 2.0]])),
            Err(ForecastError::FitRequired)
        ));
        model
            .fit(&matrix(vec![vec![1.0, 2.0], vec![2.0, 1.0]]), &[1.0, 2.0])
            .unwrap();
        let other = FeatureMatrix::new(vec!["a".to_string()], vec![vec![1.0]]).unwrap();
        assert!(model.predict(&other).is_err());
    }
}
