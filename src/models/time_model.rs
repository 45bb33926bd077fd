//! Closed set of single-series models used for tail extrapolation and the
//! auxiliary `TS_Forecast` feature.

use crate::core::Granularity;
use crate::error::{ForecastError, Result};
use crate::models::arima::{Arima, ArimaOrder, SeasonalOrder};
use crate::models::baseline::{LinearTrend, WeightedRecentAverage};
use crate::models::exponential::{HoltLinearTrend, SimpleExponentialSmoothing};
use crate::models::Forecaster;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which time model to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeModelKind {
    /// ARIMA(1,1,1).
    Arima,
    /// Seasonal ARIMA(1,1,1)(1,1,1,s) with `s` taken from the granularity.
    #[default]
    Sarima,
    /// Holt's linear trend.
    Holt,
    /// Simple exponential smoothing.
    Ses,
    /// Least-squares line on the observation index.
    Linear,
    /// Weighted mean of the last six observations.
    #[serde(alias = "lastn")]
    WeightedRecent,
}

impl TimeModelKind {
    /// Build an unfitted model for series of the given granularity.
    ///
    /// SARIMA on a granularity without a seasonal cycle degrades to ARIMA.
    pub fn build(self, granularity: Granularity) -> TimeModel {
        match self {
            TimeModelKind::Arima => TimeModel::Arima(Arima::default()),
            TimeModelKind::Sarima => match granularity.seasonal_period() {
                Some(period) => TimeModel::Arima(Arima::seasonal(
                    ArimaOrder::default(),
                    SeasonalOrder::new(1, 1, 1, period),
                )),
                None => TimeModel::Arima(Arima::default()),
            },
            TimeModelKind::Holt => TimeModel::Holt(HoltLinearTrend::auto()),
            TimeModelKind::Ses => TimeModel::Ses(SimpleExponentialSmoothing::auto()),
            TimeModelKind::Linear => TimeModel::Linear(LinearTrend::new()),
            TimeModelKind::WeightedRecent => {
                TimeModel::WeightedRecent(WeightedRecentAverage::default())
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeModelKind::Arima => "arima",
            TimeModelKind::Sarima => "sarima",
            TimeModelKind::Holt => "holt",
            TimeModelKind::Ses => "ses",
            TimeModelKind::Linear => "linear",
            TimeModelKind::WeightedRecent => "weighted_recent",
        }
    }
}

impl fmt::Display for TimeModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeModelKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arima" => Ok(TimeModelKind::Arima),
            "sarima" => Ok(TimeModelKind::Sarima),
            "holt" => Ok(TimeModelKind::Holt),
            "ses" => Ok(TimeModelKind::Ses),
            "linear" => Ok(TimeModelKind::Linear),
            "lastn" | "weighted_recent" => Ok(TimeModelKind::WeightedRecent),
            other => Err(ForecastError::InvalidParameter(format!(
                "unknown time model: {other}"
            ))),
        }
    }
}

/// A built time model. Dispatch is a plain `match` over the closed set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TimeModel {
    Arima(Arima),
    Holt(HoltLinearTrend),
    Ses(SimpleExponentialSmoothing),
    Linear(LinearTrend),
    WeightedRecent(WeightedRecentAverage),
}

impl TimeModel {
    fn inner(&self) -> &dyn Forecaster {
        match self {
            TimeModel::Arima(m) => m,
            TimeModel::Holt(m) => m,
            TimeModel::Ses(m) => m,
            TimeModel::Linear(m) => m,
            TimeModel::WeightedRecent(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Forecaster {
        match self {
            TimeModel::Arima(m) => m,
            TimeModel::Holt(m) => m,
            TimeModel::Ses(m) => m,
            TimeModel::Linear(m) => m,
            TimeModel::WeightedRecent(m) => m,
        }
    }

    /// Fit and forecast in one go, rejecting non-finite output.
    pub fn fit_forecast(&mut self, series: &[f64], horizon: usize) -> Result<Vec<f64>> {
        self.fit(series)?;
        let forecast = self.predict(horizon)?;
        if forecast.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ComputationError(format!(
                "{} produced a non-finite forecast",
                self.name()
            )));
        }
        Ok(forecast)
    }
}

impl Forecaster for TimeModel {
    fn fit(&mut self, series: &[f64]) -> Result<()> {
        self.inner_mut().fit(series)
    }

    fn predict(&self, horizon: usize) -> Result<Vec<f64>> {
        self.inner().predict(horizon)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.inner().fitted_values()
    }

    fn name(&self) -> &str {
        self.inner().name()
    }
}
