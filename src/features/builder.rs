//! Feature builder: calendar, lag and auxiliary-forecast columns.

use crate::config::FeatureConfig;
use crate::core::{Granularity, GranularityPolicy, TimeSeriesFrame};
use crate::error::{ForecastError, Result};
use crate::features::calendar::calendar_columns;
use crate::models::AuxiliaryForecaster;
use crate::transform::{lag, trailing_mean};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Name of the auxiliary forecast column.
pub const TS_FORECAST: &str = "TS_Forecast";

/// Appends engineered features to a preprocessed frame.
///
/// The auxiliary forecaster is fitted once in [`FeatureBuilder::fit`];
/// [`FeatureBuilder::transform`] never refits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureBuilder {
    config: FeatureConfig,
    policy: GranularityPolicy,
    auxiliary: Option<AuxiliaryForecaster>,
    fitted: bool,
}

impl FeatureBuilder {
    pub fn new(config: FeatureConfig, policy: GranularityPolicy) -> Self {
        Self {
            config,
            policy,
            auxiliary: None,
            fitted: false,
        }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    pub fn target_column(&self) -> &str {
        &self.config.target_column
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    /// Whether the auxiliary model was fitted successfully.
    pub fn has_auxiliary_model(&self) -> bool {
        self.auxiliary.as_ref().is_some_and(|a| a.is_fitted())
    }

    fn lag_offsets(&self) -> Vec<usize> {
        self.config
            .lags
            .clone()
            .unwrap_or_else(|| self.policy.lag_offsets().to_vec())
    }

    pub fn lag_column(&self, k: usize) -> String {
        format!("{}_lag_{}", self.config.target_column, k)
    }

    pub fn rolling_column(&self, window: usize) -> String {
        format!("{}_rollmean_{}", self.config.target_column, window)
    }

    /// Fit the auxiliary forecaster on the target series of `frame`.
    ///
    /// A failed auxiliary fit is logged; `TS_Forecast` then falls back to the
    /// previous period's target.
    pub fn fit(&mut self, frame: &TimeSeriesFrame) -> Result<()> {
        let target = frame.column(&self.config.target_column)?;
        self.auxiliary = None;

        if self.config.ts_forecast {
            let mut auxiliary =
                AuxiliaryForecaster::new(self.config.ts_model, self.policy.granularity());
            if let Err(e) = auxiliary.fit(frame.timestamps(), target) {
                warn!(
                    model = %self.config.ts_model,
                    error = %e,
                    "auxiliary forecaster failed to fit, using lag-1 fallback"
                );
            }
            self.auxiliary = Some(auxiliary);
        }
        self.fitted = true;
        Ok(())
    }

    /// Return `frame` with the feature columns appended.
    pub fn transform(&self, frame: &TimeSeriesFrame) -> Result<TimeSeriesFrame> {
        if !self.fitted {
            return Err(ForecastError::FitRequired);
        }
        let target = frame.column(&self.config.target_column)?.to_vec();
        let mut out = frame.clone();

        if self.config.calendar && self.policy.granularity() != Granularity::Yearly {
            for (name, values) in calendar_columns(frame.timestamps(), &self.policy) {
                out.set_column(name, values)?;
            }
        }

        if self.config.ts_forecast {
            let previous = lag(&target, 1);
            let predicted = match &self.auxiliary {
                Some(aux) => aux.predict(frame.timestamps()).unwrap_or_else(|e| {
                    warn!(error = %e, "auxiliary forecast failed, using lag-1 fallback");
                    vec![None; frame.len()]
                }),
                None => vec![None; frame.len()],
            };
            let values = predicted
                .iter()
                .zip(&previous)
                .map(|(p, &fallback)| p.unwrap_or(fallback))
                .collect();
            out.set_column(TS_FORECAST, values)?;
        }

        for k in self.lag_offsets() {
            out.set_column(&self.lag_column(k), lag(&target, k))?;
        }

        if self.config.rolling_means {
            for &w in self.policy.rolling_windows() {
                out.set_column(&self.rolling_column(w), trailing_mean(&target, w))?;
            }
        }
        Ok(out)
    }

    pub fn fit_transform(&mut self, frame: &TimeSeriesFrame) -> Result<TimeSeriesFrame> {
        self.fit(frame)?;
        self.transform(frame)
    }

    /// Every column of a transformed frame except the target.
    pub fn feature_columns(&self, frame: &TimeSeriesFrame) -> Vec<String> {
        frame
            .columns()
            .iter()
            .filter(|c| **c != self.config.target_column)
            .cloned()
            .collect()
    }
}
