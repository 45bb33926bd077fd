//! Cross-granularity reconciliation of forecast tables.
//!
//! A finer forecast (monthly, or quarterly) is adjusted so its bucket totals
//! agree with an independently produced coarser forecast. The coarse rows are
//! only read, and Train rows of the fine forecast are never changed.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use route_forecast::core::{ForecastRow, Granularity};
//! use route_forecast::reconcile::{ReconcileMethod, ReconciliationEngine};
//!
//! let month = |m| NaiveDate::from_ymd_opt(2025, m, 1).unwrap();
//! let fine = vec![
//!     ForecastRow::future(month(1), 90.0),
//!     ForecastRow::future(month(2), 100.0),
//!     ForecastRow::future(month(3), 110.0),
//! ];
//! let coarse = vec![ForecastRow::future(month(1), 330.0)];
//!
//! let engine = ReconciliationEngine::new(ReconcileMethod::Mint, Granularity::Quarterly);
//! let rows = engine.reconcile(&fine, &coarse).unwrap();
//! let total: f64 = rows.iter().map(|r| r.reconciled).sum();
//! assert!((total - 330.0).abs() < 1e-9);
//! ```

pub mod linalg;
mod linear;
mod mint;
pub mod yearly;

pub use linear::linear_reconcile;
pub use mint::mint_reconcile;
pub use yearly::{aggregate_quarter_labels, aggregate_quarters_to_years, YearTotal, YearlyAggregation};

use crate::core::period::period_start;
use crate::core::{ForecastRow, Granularity, ReconciledRow};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Reconciliation algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileMethod {
    /// Per-bucket ratio from a least-squares map of fine totals onto coarse totals.
    #[default]
    Linear,
    /// Minimum-trace (OLS) distribution of the mismatch.
    Mint,
}

impl fmt::Display for ReconcileMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileMethod::Linear => f.write_str("linear"),
            ReconcileMethod::Mint => f.write_str("mint"),
        }
    }
}

impl FromStr for ReconcileMethod {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(ReconcileMethod::Linear),
            "mint" | "mint_ols" => Ok(ReconcileMethod::Mint),
            other => Err(ForecastError::InvalidParameter(format!(
                "unknown reconciliation method: {other}"
            ))),
        }
    }
}

/// Reconciles fine forecasts against coarse ones with a fixed method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationEngine {
    method: ReconcileMethod,
    coarse: Granularity,
    weights: Option<Vec<f64>>,
}

impl ReconciliationEngine {
    /// `coarse` is the granularity of the forecast the fine rows must add up to.
    pub fn new(method: ReconcileMethod, coarse: Granularity) -> Self {
        Self {
            method,
            coarse,
            weights: None,
        }
    }

    /// Diagonal MinT error weights, one per fine row. Ignored by linear calibration.
    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn method(&self) -> ReconcileMethod {
        self.method
    }

    pub fn coarse_granularity(&self) -> Granularity {
        self.coarse
    }

    pub fn reconcile(
        &self,
        fine: &[ForecastRow],
        coarse: &[ForecastRow],
    ) -> Result<Vec<ReconciledRow>> {
        match self.method {
            ReconcileMethod::Linear => linear_reconcile(fine, coarse, self.coarse),
            ReconcileMethod::Mint => {
                mint_reconcile(fine, coarse, self.coarse, self.weights.as_deref())
            }
        }
    }
}

/// Sum of finite predictions per coarse period.
pub(crate) fn bucket_totals(
    rows: &[ForecastRow],
    granularity: Granularity,
) -> BTreeMap<NaiveDate, f64> {
    let mut totals = BTreeMap::new();
    for row in rows {
        let total = totals
            .entry(period_start(row.period, granularity))
            .or_insert(0.0);
        if row.predicted.is_finite() {
            *total += row.predicted;
        }
    }
    totals
}
