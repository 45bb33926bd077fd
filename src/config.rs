//! Configuration for the preprocessing, feature and pipeline stages.
//!
//! Every stage receives its configuration explicitly. All structs implement
//! `Default` with the production settings and derive serde so an orchestrator
//! can load them from whatever format it stores settings in.

use crate::core::Granularity;
use crate::models::TimeModelKind;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Name of the demand column forecast by default.
pub const DEFAULT_TARGET: &str = "Route_Total_Seats";

/// Macro-indicator columns extrapolated by regression on time.
pub const DEFAULT_ECONOMIC_PREFIXES: [&str; 14] = [
    "O_GDP",
    "O_Population",
    "Third_Industry_x",
    "O_Revenue",
    "O_Retail",
    "O_Labor",
    "O_Air_Traffic",
    "D_GDP",
    "D_Population",
    "Third_Industry_y",
    "D_Revenue",
    "D_Retail",
    "D_Labor",
    "D_Air_Traffic",
];

/// Route-redundant columns dropped before modelling.
pub const DEFAULT_DROP_COLUMNS: [&str; 20] = [
    "Origin",
    "Destination",
    "Equipment",
    "International Flight",
    "Equipment_Total_Flights",
    "Equipment_Total_Seats",
    "Route_Total_Flight_Time",
    "Region",
    "Route_Total_Flights",
    "Con Total Est. Pax",
    "First",
    "Business",
    "Premium",
    "Full Y",
    "Disc Y",
    "Total Est. Pax",
    "Local Est. Pax",
    "Behind Est. Pax",
    "Bridge Est. Pax",
    "Beyond Est. Pax",
];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// How interior gaps are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMethod {
    /// Linear interpolation between the surrounding observations.
    #[default]
    Interpolate,
    /// Least-squares line on time through the valid observations.
    Regression,
    /// Every missing value becomes zero.
    Zero,
}

/// Settings of the series preprocessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessorConfig {
    pub fill_method: FillMethod,
    /// Columns whose missing share exceeds this are filled wholesale from
    /// their median. `1.0` disables the guard.
    pub max_missing_ratio: f64,
    /// Minimum valid points for a regression fit.
    pub min_fit_points: usize,
    /// Z-score the non-binary columns after filling.
    pub normalize: bool,
    /// Columns never scaled (the target, so predictions stay in seats).
    pub unscaled_columns: Vec<String>,
    /// Time model for the tail of operational columns.
    pub tail_model: TimeModelKind,
    /// Maximum steps forecast by the tail model; the rest repeats the last forecast.
    pub forecast_horizon: usize,
    /// Number of latest values averaged when the tail model fails.
    pub fallback_window: usize,
    pub economic_prefixes: Vec<String>,
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        Self {
            fill_method: FillMethod::Interpolate,
            max_missing_ratio: 1.0,
            min_fit_points: 5,
            normalize: false,
            unscaled_columns: vec![DEFAULT_TARGET.to_string()],
            tail_model: TimeModelKind::Sarima,
            forecast_horizon: 100,
            fallback_window: 3,
            economic_prefixes: strings(&DEFAULT_ECONOMIC_PREFIXES),
        }
    }
}

impl PreprocessorConfig {
    pub fn with_fill_method(mut self, method: FillMethod) -> Self {
        self.fill_method = method;
        self
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn with_tail_model(mut self, kind: TimeModelKind) -> Self {
        self.tail_model = kind;
        self
    }

    pub fn with_max_missing_ratio(mut self, ratio: f64) -> Self {
        self.max_missing_ratio = ratio;
        self
    }

    pub fn with_unscaled_columns(mut self, columns: Vec<String>) -> Self {
        self.unscaled_columns = columns;
        self
    }

    /// Whether a column name marks a macro-economic indicator.
    pub fn is_economic(&self, column: &str) -> bool {
        self.economic_prefixes
            .iter()
            .any(|prefix| column.starts_with(prefix.as_str()))
    }
}

/// Settings of the feature builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub target_column: String,
    /// Add `Year`, `Month`, `Quarter` and `Is_holiday` (ignored for yearly data).
    pub calendar: bool,
    /// Lag offsets; `None` uses the granularity policy's offsets.
    pub lags: Option<Vec<usize>>,
    /// Add trailing means of the target over the policy's rolling windows.
    pub rolling_means: bool,
    /// Add the auxiliary `TS_Forecast` column.
    pub ts_forecast: bool,
    pub ts_model: TimeModelKind,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            target_column: DEFAULT_TARGET.to_string(),
            calendar: true,
            lags: None,
            rolling_means: false,
            ts_forecast: true,
            ts_model: TimeModelKind::Arima,
        }
    }
}

impl FeatureConfig {
    pub fn with_ts_forecast(mut self, enabled: bool) -> Self {
        self.ts_forecast = enabled;
        self
    }

    pub fn with_lags(mut self, lags: Vec<usize>) -> Self {
        self.lags = Some(lags);
        self
    }

    pub fn with_rolling_means(mut self, enabled: bool) -> Self {
        self.rolling_means = enabled;
        self
    }
}

/// Settings of the route series assembler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblerConfig {
    pub target_column: String,
    pub drop_columns: Vec<String>,
    /// Columns summed when resampling, besides the target. Others are averaged.
    pub additive_columns: Vec<String>,
    /// Months removed before resampling (first day of the month).
    pub excluded_months: Vec<NaiveDate>,
    /// Drop the most recent, possibly incomplete, period for non-monthly data.
    pub drop_last_period: bool,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            target_column: DEFAULT_TARGET.to_string(),
            drop_columns: strings(&DEFAULT_DROP_COLUMNS),
            additive_columns: Vec::new(),
            excluded_months: [(2024, 6), (2024, 7)]
                .iter()
                .filter_map(|&(y, m)| NaiveDate::from_ymd_opt(y, m, 1))
                .collect(),
            drop_last_period: true,
        }
    }
}

impl AssemblerConfig {
    pub fn with_excluded_months(mut self, months: Vec<NaiveDate>) -> Self {
        self.excluded_months = months;
        self
    }
}

/// Which rows the preprocessor and feature builder learn their state from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitScope {
    /// Fit on the whole frame before splitting (test statistics leak into the fit).
    #[default]
    FullFrame,
    /// Fit on the training rows only, then transform the whole frame.
    TrainOnly,
}

/// End-to-end settings of one route run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub granularity: Granularity,
    pub preprocessor: PreprocessorConfig,
    pub features: FeatureConfig,
    pub assembler: AssemblerConfig,
    pub fit_scope: FitScope,
    /// Held-out window in months before granularity adjustment.
    pub test_size: usize,
    /// Periods forecast past the end of the data, in native granularity units.
    pub forecast_periods: usize,
    /// Emit Train/Test rows next to the Future rows.
    pub include_history: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::Monthly,
            preprocessor: PreprocessorConfig::default(),
            features: FeatureConfig::default(),
            assembler: AssemblerConfig::default(),
            fit_scope: FitScope::FullFrame,
            test_size: 12,
            forecast_periods: 12,
            include_history: true,
        }
    }
}

impl PipelineConfig {
    pub fn new(granularity: Granularity) -> Self {
        Self {
            granularity,
            ..Self::default()
        }
    }

    pub fn with_fit_scope(mut self, scope: FitScope) -> Self {
        self.fit_scope = scope;
        self
    }

    pub fn with_test_size(mut self, months: usize) -> Self {
        self.test_size = months;
        self
    }

    pub fn with_forecast_periods(mut self, periods: usize) -> Self {
        self.forecast_periods = periods;
        self
    }

    pub fn with_target(mut self, column: &str) -> Self {
        self.features.target_column = column.to_string();
        self.assembler.target_column = column.to_string();
        self.preprocessor.unscaled_columns = vec![column.to_string()];
        self
    }

    pub fn target_column(&self) -> &str {
        &self.features.target_column
    }
}
