//! ARIMA and seasonal ARIMA estimated by conditional sum of squares.

use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{difference, integrate, seasonal_difference, seasonal_integrate};
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use serde::{Deserialize, Serialize};

/// Non-seasonal order `(p, d, q)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArimaOrder {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
}

impl ArimaOrder {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

/// Seasonal order `(P, D, Q, s)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub period: usize,
}

impl SeasonalOrder {
    pub fn new(p: usize, d: usize, q: usize, period: usize) -> Self {
        Self { p, d, q, period }
    }
}

/// ARIMA forecasting model with an optional seasonal part.
///
/// The seasonal terms enter additively: AR lags are `1..=p` plus
/// `s, 2s, .., Ps`, MA lags likewise. Differencing applies `D` seasonal
/// rounds first, then `d` regular rounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arima {
    order: ArimaOrder,
    seasonal: Option<SeasonalOrder>,
    ar_lags: Vec<usize>,
    ma_lags: Vec<usize>,
    intercept: f64,
    ar_coefficients: Vec<f64>,
    ma_coefficients: Vec<f64>,
    /// Original series (for integration).
    original: Option<Vec<f64>>,
    /// Differenced series the ARMA part is fitted on.
    differenced: Option<Vec<f64>>,
    /// Residuals on the differenced scale.
    residuals: Option<Vec<f64>>,
    /// Fitted values on the original scale.
    fitted: Option<Vec<f64>>,
}

impl Arima {
    /// Create a non-seasonal ARIMA(p, d, q).
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self::with_orders(ArimaOrder::new(p, d, q), None)
    }

    /// Create a seasonal ARIMA(p, d, q)(P, D, Q, s).
    pub fn seasonal(order: ArimaOrder, seasonal: SeasonalOrder) -> Self {
        Self::with_orders(order, Some(seasonal))
    }

    fn with_orders(order: ArimaOrder, seasonal: Option<SeasonalOrder>) -> Self {
        let mut ar_lags: Vec<usize> = (1..=order.p).collect();
        let mut ma_lags: Vec<usize> = (1..=order.q).collect();
        if let Some(s) = seasonal.filter(|s| s.period > 1) {
            ar_lags.extend((1..=s.p).map(|k| k * s.period));
            ma_lags.extend((1..=s.q).map(|k| k * s.period));
        }
        ar_lags.sort_unstable();
        ar_lags.dedup();
        ma_lags.sort_unstable();
        ma_lags.dedup();

        Self {
            order,
            seasonal: seasonal.filter(|s| s.period > 1),
            ar_lags,
            ma_lags,
            intercept: 0.0,
            ar_coefficients: Vec::new(),
            ma_coefficients: Vec::new(),
            original: None,
            differenced: None,
            residuals: None,
            fitted: None,
        }
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    fn max_lag(&self) -> usize {
        self.ar_lags
            .iter()
            .chain(&self.ma_lags)
            .copied()
            .max()
            .unwrap_or(0)
    }

    /// Observations consumed by differencing.
    fn differencing_loss(&self) -> usize {
        self.order.d + self.seasonal.map_or(0, |s| s.d * s.period)
    }

    fn difference_series(&self, series: &[f64]) -> Vec<f64> {
        let seasonally = match self.seasonal {
            Some(s) => seasonal_difference(series, s.d, s.period),
            None => series.to_vec(),
        };
        difference(&seasonally, self.order.d)
    }

    /// One-step residuals of the ARMA recursion on `w`.
    fn residuals_for(&self, w: &[f64], intercept: f64, ar: &[f64], ma: &[f64]) -> Vec<f64> {
        let start = self.max_lag();
        let mut residuals = vec![0.0; w.len()];
        for t in start..w.len() {
            let pred = self.one_step(w, &residuals, t, intercept, ar, ma);
            residuals[t] = w[t] - pred;
        }
        residuals
    }

    fn one_step(&self, w: &[f64], e: &[f64], t: usize, intercept: f64, ar: &[f64], ma: &[f64]) -> f64 {
        let mut pred = intercept;
        for (lag, phi) in self.ar_lags.iter().zip(ar) {
            pred += phi * (w[t - lag] - intercept);
        }
        for (lag, theta) in self.ma_lags.iter().zip(ma) {
            pred += theta * e[t - lag];
        }
        pred
    }

    fn estimate_parameters(&mut self, w: &[f64]) {
        let n_ar = self.ar_lags.len();
        let n_ma = self.ma_lags.len();
        let mean = w.iter().sum::<f64>() / w.len() as f64;

        if n_ar == 0 && n_ma == 0 {
            self.intercept = mean;
            return;
        }

        let mut initial = vec![mean];
        initial.extend((0..n_ar).map(|i| 0.1 / (i + 1) as f64));
        initial.extend((0..n_ma).map(|i| 0.1 / (i + 1) as f64));

        let mut bounds = vec![(f64::NEG_INFINITY, f64::INFINITY)];
        bounds.extend(std::iter::repeat((-0.99, 0.99)).take(n_ar + n_ma));

        let start = self.max_lag();
        let config = NelderMeadConfig {
            max_iter: 1000,
            ..Default::default()
        };
        let result = nelder_mead(
            |params| {
                let residuals =
                    self.residuals_for(w, params[0], &params[1..1 + n_ar], &params[1 + n_ar..]);
                residuals[start..].iter().map(|e| e * e).sum()
            },
            &initial,
            Some(&bounds),
            &config,
        );

        self.intercept = result.point[0];
        self.ar_coefficients = result.point[1..1 + n_ar].to_vec();
        self.ma_coefficients = result.point[1 + n_ar..].to_vec();
    }
}

impl Default for Arima {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl Forecaster for Arima {
    fn fit(&mut self, series: &[f64]) -> Result<()> {
        let min_len = self.differencing_loss() + self.max_lag() + 2;
        if series.len() < min_len {
            return Err(ForecastError::InsufficientData {
                needed: min_len,
                got: series.len(),
            });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ComputationError(
                "series contains missing values".into(),
            ));
        }

        let w = self.difference_series(series);
        self.ar_coefficients = vec![0.0; self.ar_lags.len()];
        self.ma_coefficients = vec![0.0; self.ma_lags.len()];
        self.estimate_parameters(&w);

        let params_ok = std::iter::once(&self.intercept)
            .chain(&self.ar_coefficients)
            .chain(&self.ma_coefficients)
            .all(|v| v.is_finite());
        if !params_ok {
            return Err(ForecastError::ComputationError(format!(
                "{} parameter estimation diverged",
                self.name()
            )));
        }

        let residuals =
            self.residuals_for(&w, self.intercept, &self.ar_coefficients, &self.ma_coefficients);

        // A level residual equals the differenced residual once the lags are observed.
        let offset = series.len() - w.len();
        let start = offset + self.max_lag();
        let fitted = (0..series.len())
            .map(|t| {
                if t < start {
                    f64::NAN
                } else {
                    series[t] - residuals[t - offset]
                }
            })
            .collect();

        self.original = Some(series.to_vec());
        self.differenced = Some(w);
        self.residuals = Some(residuals);
        self.fitted = Some(fitted);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Vec<f64>> {
        let original = self.original.as_ref().ok_or(ForecastError::FitRequired)?;
        let w = self.differenced.as_ref().ok_or(ForecastError::FitRequired)?;
        let residuals = self.residuals.as_ref().ok_or(ForecastError::FitRequired)?;

        if horizon == 0 {
            return Ok(Vec::new());
        }

        let mut w_ext = w.clone();
        let mut e_ext = residuals.clone();
        for _ in 0..horizon {
            let t = w_ext.len();
            let pred = self.one_step(
                &w_ext,
                &e_ext,
                t,
                self.intercept,
                &self.ar_coefficients,
                &self.ma_coefficients,
            );
            w_ext.push(pred);
            e_ext.push(0.0);
        }
        let forecast_w = &w_ext[w.len()..];

        let forecast = match self.seasonal {
            Some(s) => {
                let seasonal_history = seasonal_difference(original, s.d, s.period);
                let z = integrate(forecast_w, &seasonal_history, self.order.d);
                seasonal_integrate(&z, original, s.d, s.period)
            }
            None => integrate(forecast_w, original, self.order.d),
        };
        Ok(forecast)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn name(&self) -> &str {
        if self.seasonal.is_some() {
            "SARIMA"
        } else {
            "ARIMA"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn trending(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|i| 1_000.0 + 10.0 * i as f64 + rng.gen_range(-5.0..5.0))
            .collect()
    }

    #[test]
    fn arima_fit_and_forecast_follow_trend() {
        let series = trending(48, 7);
        let mut model = Arima::default();
        model.fit(&series).unwrap();

        let forecast = model.predict(6).unwrap();
        assert_eq!(forecast.len(), 6);
        let last = *series.last().unwrap();
        assert!(forecast[0] > last - 40.0 && forecast[0] < last + 60.0);
        assert!(forecast[5] > forecast[0]);
        assert_eq!(model.name(), "ARIMA");
    }

    #[test]
    fn arima_fitted_values_align_with_series() {
        let series = trending(30, 11);
        let mut model = Arima::new(1, 1, 1);
        model.fit(&series).unwrap();
        let fitted = model.fitted_values().unwrap();
        assert_eq!(fitted.len(), series.len());
        assert!(fitted[0].is_nan() && fitted[1].is_nan());
        assert!(fitted[2..].iter().all(|v| v.is_finite()));
        assert!((fitted[20] - series[20]).abs() < 50.0);
    }

    #[test]
    fn arima_rejects_short_series() {
        let mut model = Arima::new(1, 1, 1);
        assert!(matches!(
            model.fit(&[1.0, 2.0, 3.0]),
            Err(ForecastError::InsufficientData { needed: 4, got: 3 })
        ));
        assert!(matches!(model.predict(3), Err(ForecastError::FitRequired)));
    }

    #[test]
    fn sarima_reproduces_seasonal_shape() {
        let pattern = [100.0, 80.0, 90.0, 130.0];
        let series: Vec<f64> = (0..32)
            .map(|i| pattern[i % 4] + 2.0 * (i / 4) as f64)
            .collect();
        let mut model = Arima::seasonal(ArimaOrder::new(1, 1, 1), SeasonalOrder::new(1, 1, 1, 4));
        model.fit(&series).unwrap();
        assert_eq!(model.name(), "SARIMA");

        let forecast = model.predict(4).unwrap();
        // Next cycle keeps the peak in the last quarter of the season.
        assert!(forecast[3] > forecast[1]);
        assert_relative_eq!(forecast[3], 130.0 + 16.0, epsilon = 10.0);
    }

    #[test]
    fn sarima_needs_full_seasons() {
        let mut model = Arima::seasonal(ArimaOrder::default(), SeasonalOrder::new(1, 1, 1, 12));
        let short: Vec<f64> = (0..20).map(|i| i as f64).collect();
        assert!(matches!(
            model.fit(&short),
            Err(ForecastError::InsufficientData { .. })
        ));
    }
}
