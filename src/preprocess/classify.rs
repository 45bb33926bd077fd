//! Column classification and per-column fit statistics.

use crate::config::PreprocessorConfig;
use crate::utils::stats;
use serde::{Deserialize, Serialize};

/// How a column is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnClass {
    /// Every observed value is 0 or 1.
    Binary,
    /// Macro-economic indicator, extrapolated by regression on time.
    Economic,
    /// Everything else; tail forecast by the configured time model.
    Operational,
}

impl ColumnClass {
    /// Classify a column from its raw values. Binary wins over economic.
    pub fn of(name: &str, values: &[f64], config: &PreprocessorConfig) -> Self {
        let binary = values
            .iter()
            .filter(|v| v.is_finite())
            .all(|&v| v == 0.0 || v == 1.0);
        if binary {
            ColumnClass::Binary
        } else if config.is_economic(name) {
            ColumnClass::Economic
        } else {
            ColumnClass::Operational
        }
    }
}

/// Statistics of the non-zero observations of a column, captured at fit time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub median: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl ColumnStats {
    /// `None` when the column has no finite non-zero value.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let observed: Vec<f64> = values
            .iter()
            .copied()
            .filter(|v| v.is_finite() && *v != 0.0)
            .collect();
        if observed.is_empty() {
            return None;
        }
        Some(Self {
            median: stats::median(&observed),
            mean: stats::mean(&observed),
            min: observed.iter().copied().fold(f64::INFINITY, f64::min),
            max: observed.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_follows_values_then_prefix() {
        let config = PreprocessorConfig::default();
        let nan = f64::NAN;
        assert_eq!(
            ColumnClass::of("O_GDP", &[0.0, 1.0, nan], &config),
            ColumnClass::Binary
        );
        assert_eq!(
            ColumnClass::of("O_GDP", &[1.5, 2.0], &config),
            ColumnClass::Economic
        );
        assert_eq!(
            ColumnClass::of("Avg yield", &[0.4, 0.6], &config),
            ColumnClass::Operational
        );
    }

    #[test]
    fn stats_ignore_zero_and_missing() {
        let stats = ColumnStats::from_values(&[0.0, 4.0, f64::NAN, 2.0, 9.0]).unwrap();
        assert_eq!(stats.median, 4.0);
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
        assert!(ColumnStats::from_values(&[0.0, f64::NAN]).is_none());
    }
}
