//! Quarter to year aggregation of a quarterly result table.

use crate::core::period::{advance, parse_quarter_label, period_start};
use crate::core::Granularity;
use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Total of one complete calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearTotal {
    pub year: i32,
    pub value: f64,
}

/// Complete years split into history and forecast.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearlyAggregation {
    pub history: Vec<YearTotal>,
    pub future: Vec<YearTotal>,
}

/// Sum quarters into calendar years.
///
/// History and future quarters are merged, a future quarter replacing a
/// historical one for the same period. Only years with all four quarters are
/// kept. The last `floor(future quarters / 4)` complete years are reported as
/// future. Future quarters must be consecutive and come after every
/// remaining historical quarter.
pub fn aggregate_quarters_to_years(
    history: &[(NaiveDate, f64)],
    future: &[(NaiveDate, f64)],
) -> Result<YearlyAggregation> {
    let future: BTreeMap<NaiveDate, f64> = future
        .iter()
        .map(|&(d, v)| (period_start(d, Granularity::Quarterly), v))
        .collect();
    let history: BTreeMap<NaiveDate, f64> = history
        .iter()
        .map(|&(d, v)| (period_start(d, Granularity::Quarterly), v))
        .filter(|(d, _)| !future.contains_key(d))
        .collect();

    check_contiguous(&history, &future)?;

    let mut years: BTreeMap<i32, (usize, f64)> = BTreeMap::new();
    for (date, value) in history.iter().chain(future.iter()) {
        let entry = years.entry(date.year()).or_insert((0, 0.0));
        entry.0 += 1;
        if value.is_finite() {
            entry.1 += value;
        }
    }
    let complete: Vec<YearTotal> = years
        .into_iter()
        .filter(|(_, (quarters, _))| *quarters == 4)
        .map(|(year, (_, value))| YearTotal { year, value })
        .collect();

    let k = (future.len() / 4).min(complete.len());
    let split = complete.len() - k;
    Ok(YearlyAggregation {
        history: complete[..split].to_vec(),
        future: complete[split..].to_vec(),
    })
}

/// [`aggregate_quarters_to_years`] on `YYYY-Qn` labelled values.
pub fn aggregate_quarter_labels(
    history: &[(&str, f64)],
    future: &[(&str, f64)],
) -> Result<YearlyAggregation> {
    aggregate_quarters_to_years(&parse_labels(history)?, &parse_labels(future)?)
}

fn parse_labels(items: &[(&str, f64)]) -> Result<Vec<(NaiveDate, f64)>> {
    items
        .iter()
        .map(|&(label, v)| parse_quarter_label(label).map(|d| (d, v)))
        .collect()
}

fn check_contiguous(
    history: &BTreeMap<NaiveDate, f64>,
    future: &BTreeMap<NaiveDate, f64>,
) -> Result<()> {
    let quarters: Vec<NaiveDate> = future.keys().copied().collect();
    for pair in quarters.windows(2) {
        if advance(pair[0], Granularity::Quarterly, 1)? != pair[1] {
            return Err(ForecastError::InvalidParameter(format!(
                "future quarters are not contiguous: {} is followed by {}",
                pair[0], pair[1]
            )));
        }
    }
    if let (Some(last_history), Some(first_future)) = (history.keys().next_back(), quarters.first()) {
        if last_history > first_future {
            return Err(ForecastError::InvalidParameter(format!(
                "future quarters must trail history: {first_future} precedes {last_history}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labelled(labels: &[&'static str], value: f64) -> Vec<(&'static str, f64)> {
        labels.iter().map(|&l| (l, value)).collect()
    }

    #[test]
    fn seven_future_quarters_yield_one_future_year() {
        let history = labelled(&["2021-Q1", "2021-Q2", "2021-Q3", "2021-Q4"], 100.0);
        let future = labelled(
            &["2022-Q2", "2022-Q3", "2022-Q4", "2023-Q1", "2023-Q2", "2023-Q3", "2023-Q4"],
            120.0,
        );
        let out = aggregate_quarter_labels(&history, &future).unwrap();
        assert_eq!(out.history, vec![YearTotal { year: 2021, value: 400.0 }]);
        assert_eq!(out.future, vec![YearTotal { year: 2023, value: 480.0 }]);
    }

    #[test]
    fn future_replaces_overlapping_history() {
        let history = labelled(&["2022-Q1", "2022-Q2", "2022-Q3", "2022-Q4"], 100.0);
        let future = labelled(&["2022-Q4", "2023-Q1", "2023-Q2", "2023-Q3"], 50.0);
        let out = aggregate_quarter_labels(&history, &future).unwrap();
        assert_eq!(out.future, vec![YearTotal { year: 2022, value: 350.0 }]);
        assert!(out.history.is_empty());
    }

    #[test]
    fn gaps_and_interleaving_are_rejected() {
        let history = labelled(&["2022-Q1"], 1.0);
        let gapped = labelled(&["2022-Q2", "2022-Q4"], 1.0);
        assert!(aggregate_quarter_labels(&history, &gapped).is_err());

        let late_history = labelled(&["2023-Q1"], 1.0);
        let early_future = labelled(&["2022-Q2", "2022-Q3"], 1.0);
        assert!(aggregate_quarter_labels(&late_history, &early_future).is_err());

        assert!(aggregate_quarter_labels(&labelled(&["2022-Q5"], 1.0), &[]).is_err());
    }

    #[test]
    fn no_complete_year_is_empty() {
        let history = labelled(&["2022-Q1", "2022-Q2"], 1.0);
        let out = aggregate_quarter_labels(&history, &[]).unwrap();
        assert_eq!(out, YearlyAggregation::default());
    }
}
