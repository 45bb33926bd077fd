//! Series preprocessing: missing-value repair, tail extrapolation and scaling.
//!
//! The preprocessor learns column classes, fit statistics and the scaler once
//! in [`SeriesPreprocessor::fit`]. [`SeriesPreprocessor::fill`] and
//! [`SeriesPreprocessor::transform`] only read that state, so the rolling
//! forecast can re-run them on a growing frame without refitting.

pub mod classify;
pub mod fill;
pub mod tail;

use crate::config::{FillMethod, PreprocessorConfig};
use crate::core::{Granularity, TimeSeriesFrame};
use crate::error::{ForecastError, Result};
use crate::transform::StandardScaler;
use crate::utils::stats;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

pub use classify::{ColumnClass, ColumnStats};
use tail::TailSettings;

/// Numeric time key used by the regressions on time (days from the common era).
pub fn time_key(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

/// Fits on a route frame and repairs missing values in that or any later frame
/// with the same columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesPreprocessor {
    config: PreprocessorConfig,
    granularity: Granularity,
    classes: BTreeMap<String, ColumnClass>,
    stats: BTreeMap<String, ColumnStats>,
    scaler: StandardScaler,
    fitted: bool,
}

impl SeriesPreprocessor {
    pub fn new(config: PreprocessorConfig, granularity: Granularity) -> Self {
        Self {
            config,
            granularity,
            classes: BTreeMap::new(),
            stats: BTreeMap::new(),
            scaler: StandardScaler::new(),
            fitted: false,
        }
    }

    pub fn config(&self) -> &PreprocessorConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    /// Class recorded at fit time; columns unseen at fit are operational.
    pub fn class_of(&self, column: &str) -> ColumnClass {
        self.classes
            .get(column)
            .copied()
            .unwrap_or(ColumnClass::Operational)
    }

    pub fn stats(&self, column: &str) -> Option<&ColumnStats> {
        self.stats.get(column)
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    /// Learn column classes, statistics and, with normalization on, the scaler.
    ///
    /// Replaces any state from a previous fit.
    pub fn fit(&mut self, frame: &TimeSeriesFrame) -> Result<()> {
        if frame.is_empty() {
            return Err(ForecastError::EmptyData);
        }

        let mut classes = BTreeMap::new();
        let mut column_stats = BTreeMap::new();
        for (name, values) in frame.columns().iter().zip(frame.values_by_column()) {
            let class = ColumnClass::of(name, values, &self.config);
            if class != ColumnClass::Binary {
                if let Some(s) = ColumnStats::from_values(values) {
                    column_stats.insert(name.clone(), s);
                }
            }
            classes.insert(name.clone(), class);
        }
        self.classes = classes;
        self.stats = column_stats;
        self.scaler = StandardScaler::new();
        self.fitted = true;

        if self.config.normalize {
            let filled = self.fill(frame)?;
            let columns = self.scaled_columns(&filled);
            self.scaler.fit(&filled, &columns)?;
        }
        debug!(
            columns = frame.width(),
            rows = frame.len(),
            "preprocessor fitted"
        );
        Ok(())
    }

    /// Repair missing values without scaling.
    ///
    /// Every column of the result is free of missing values.
    pub fn fill(&self, frame: &TimeSeriesFrame) -> Result<TimeSeriesFrame> {
        if !self.fitted {
            return Err(ForecastError::FitRequired);
        }
        let times: Vec<f64> = frame.timestamps().iter().map(|&d| time_key(d)).collect();
        let mut out = frame.clone();
        for name in frame.columns() {
            let values = out.column_mut(name)?;
            self.fill_column(name, values, &times);
        }
        Ok(out)
    }

    /// Apply the fitted scaler in place. A no-op with normalization off.
    pub fn scale(&self, frame: &mut TimeSeriesFrame) -> Result<()> {
        if !self.fitted {
            return Err(ForecastError::FitRequired);
        }
        if self.config.normalize {
            self.scaler.transform(frame)?;
        }
        Ok(())
    }

    /// Fill, then scale.
    pub fn transform(&self, frame: &TimeSeriesFrame) -> Result<TimeSeriesFrame> {
        let mut out = self.fill(frame)?;
        self.scale(&mut out)?;
        Ok(out)
    }

    pub fn fit_transform(&mut self, frame: &TimeSeriesFrame) -> Result<TimeSeriesFrame> {
        self.fit(frame)?;
        self.transform(frame)
    }

    fn scaled_columns(&self, frame: &TimeSeriesFrame) -> Vec<String> {
        frame
            .columns()
            .iter()
            .filter(|c| self.class_of(c) != ColumnClass::Binary)
            .filter(|c| !self.config.unscaled_columns.contains(c))
            .cloned()
            .collect()
    }

    fn tail_settings(&self) -> TailSettings {
        TailSettings {
            granularity: self.granularity,
            model: self.config.tail_model,
            min_fit_points: self.config.min_fit_points,
            forecast_horizon: self.config.forecast_horizon,
            fallback_window: self.config.fallback_window,
        }
    }

    fn fill_column(&self, name: &str, values: &mut [f64], times: &[f64]) {
        let class = self.class_of(name);
        if class == ColumnClass::Binary {
            let replacement = stats::mode(values).unwrap_or(0.0);
            fill::fill_constant(values, replacement);
            return;
        }

        let median = self.stats.get(name).map(|s| s.median);
        fill::zeros_to_missing(values);

        let sparse = fill::missing_ratio(values) > self.config.max_missing_ratio;
        if sparse || fill::first_valid(values).is_none() {
            fill::fill_constant(values, median.unwrap_or(0.0));
            return;
        }

        fill::fill_head(values);
        match self.config.fill_method {
            FillMethod::Interpolate => fill::interpolate_interior(values),
            FillMethod::Regression => {
                fill::regression_interior(values, times, self.config.min_fit_points)
            }
            FillMethod::Zero => fill::fill_constant(values, 0.0),
        }

        let settings = self.tail_settings();
        match class {
            ColumnClass::Economic => tail::economic_tail(name, values, times, &settings),
            _ => tail::operational_tail(name, values, &settings),
        }

        if values.iter().any(|v| !v.is_finite()) {
            match median {
                Some(m) => fill::fill_constant(values, m),
                None => {
                    fill::interpolate(values, true);
                    fill::fill_constant(values, 0.0);
                }
            }
        }
    }
}
