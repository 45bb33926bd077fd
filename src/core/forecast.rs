//! Result rows produced by the forecasting pipeline and the reconciliation engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which part of the timeline a result row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Segment {
    /// In-sample fit on the training window.
    Train,
    /// Held-out evaluation window.
    Test,
    /// Genuine out-of-sample forecast.
    Future,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Segment::Train => "Train",
            Segment::Test => "Test",
            Segment::Future => "Future",
        };
        f.write_str(label)
    }
}

/// One predicted period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub period: NaiveDate,
    pub predicted: f64,
    pub actual: Option<f64>,
    pub segment: Segment,
}

impl ForecastRow {
    pub fn new(period: NaiveDate, predicted: f64, actual: Option<f64>, segment: Segment) -> Self {
        Self {
            period,
            predicted,
            actual,
            segment,
        }
    }

    /// A forecast row with no observed value.
    pub fn future(period: NaiveDate, predicted: f64) -> Self {
        Self::new(period, predicted, None, Segment::Future)
    }

    pub fn is_future(&self) -> bool {
        self.segment == Segment::Future
    }
}

/// A forecast row together with its reconciled value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledRow {
    pub period: NaiveDate,
    pub predicted: f64,
    pub actual: Option<f64>,
    pub segment: Segment,
    pub reconciled: f64,
}

impl ReconciledRow {
    /// Carry a row through reconciliation without adjusting it.
    pub fn unchanged(row: &ForecastRow) -> Self {
        Self::adjusted(row, row.predicted)
    }

    pub fn adjusted(row: &ForecastRow, reconciled: f64) -> Self {
        Self {
            period: row.period,
            predicted: row.predicted,
            actual: row.actual,
            segment: row.segment,
            reconciled,
        }
    }

    /// The amount reconciliation moved this row.
    pub fn adjustment(&self) -> f64 {
        self.reconciled - self.predicted
    }
}
