//! Date-keyed wrapper around a time model, feeding the `TS_Forecast` feature.

use crate::core::period::periods_between;
use crate::core::Granularity;
use crate::error::{ForecastError, Result};
use crate::models::time_model::{TimeModel, TimeModelKind};
use crate::models::Forecaster;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Fits a time model on a dated series and answers lookups by date.
///
/// Dates inside the fitted span get the in-sample one-step fitted value;
/// dates after it get a genuine forecast whose horizon is the number of
/// periods past the last fitted date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuxiliaryForecaster {
    kind: TimeModelKind,
    granularity: Granularity,
    model: Option<TimeModel>,
    dates: Vec<NaiveDate>,
}

impl AuxiliaryForecaster {
    pub fn new(kind: TimeModelKind, granularity: Granularity) -> Self {
        Self {
            kind,
            granularity,
            model: None,
            dates: Vec::new(),
        }
    }

    pub fn kind(&self) -> TimeModelKind {
        self.kind
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    /// Fit on `values` observed at `dates`. On error the forecaster stays unfitted.
    pub fn fit(&mut self, dates: &[NaiveDate], values: &[f64]) -> Result<()> {
        self.model = None;
        self.dates.clear();
        if dates.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: dates.len(),
                got: values.len(),
            });
        }

        let mut model = self.kind.build(self.granularity);
        model.fit(values)?;
        self.model = Some(model);
        self.dates = dates.to_vec();
        Ok(())
    }

    /// Value for each requested date, `None` where the model has nothing usable.
    pub fn predict(&self, dates: &[NaiveDate]) -> Result<Vec<Option<f64>>> {
        let (model, last) = match (&self.model, self.dates.last()) {
            (Some(model), Some(&last)) => (model, last),
            _ => return Ok(vec![None; dates.len()]),
        };
        let fitted = model.fitted_values().ok_or(ForecastError::FitRequired)?;

        let horizon = dates
            .iter()
            .map(|&d| periods_between(last, d, self.granularity))
            .max()
            .unwrap_or(0)
            .max(0) as usize;
        let forecast = if horizon > 0 {
            model.predict(horizon)?
        } else {
            Vec::new()
        };

        let finite = |v: f64| v.is_finite().then_some(v);
        Ok(dates
            .iter()
            .map(|&date| {
                if date > last {
                    let h = periods_between(last, date, self.granularity);
                    usize::try_from(h)
                        .ok()
                        .and_then(|h| h.checked_sub(1))
                        .and_then(|i| forecast.get(i).copied())
                        .and_then(finite)
                } else {
                    self.dates
                        .binary_search(&date)
                        .ok()
                        .and_then(|i| fitted.get(i).copied())
                        .and_then(finite)
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn months(n: usize) -> Vec<NaiveDate> {
        (0..n)
            .map(|i| NaiveDate::from_ymd_opt(2020 + (i / 12) as i32, (i % 12) as u32 + 1, 1).unwrap())
            .collect()
    }

    #[test]
    fn historical_dates_get_fitted_values_and_future_dates_forecasts() {
        let dates = months(24);
        let values: Vec<f64> = (0..24).map(|i| 100.0 + 2.0 * i as f64).collect();
        let mut aux = AuxiliaryForecaster::new(TimeModelKind::Linear, Granularity::Monthly);
        aux.fit(&dates, &values).unwrap();

        let all = months(27);
        let out = aux.predict(&all).unwrap();
        assert_relative_eq!(out[5].unwrap(), 110.0, epsilon = 1e-9);
        assert_relative_eq!(out[24].unwrap(), 148.0, epsilon = 1e-9);
        assert_relative_eq!(out[26].unwrap(), 152.0, epsilon = 1e-9);
    }

    #[test]
    fn warm_up_and_unknown_dates_are_none() {
        let dates = months(12);
        let values: Vec<f64> = (0..12).map(|i| 50.0 + i as f64).collect();
        let mut aux = AuxiliaryForecaster::new(TimeModelKind::WeightedRecent, Granularity::Monthly);
        aux.fit(&dates, &values).unwrap();

        let before = NaiveDate::from_ymd_opt(2019, 12, 1).unwrap();
        let out = aux.predict(&[before, dates[0], dates[1]]).unwrap();
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert_eq!(out[2], Some(50.0));
    }

    #[test]
    fn failed_fit_leaves_forecaster_empty() {
        let mut aux = AuxiliaryForecaster::new(TimeModelKind::Arima, Granularity::Monthly);
        assert!(aux.fit(&months(2), &[1.0, 2.0]).is_err());
        assert!(!aux.is_fitted());
        assert_eq!(aux.predict(&months(2)).unwrap(), vec![None, None]);
    }
}
