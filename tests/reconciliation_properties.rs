//! Property tests for cross-granularity reconciliation.

use approx::assert_relative_eq;
use chrono::NaiveDate;
use proptest::prelude::*;
use route_forecast::core::period::shift_months;
use route_forecast::core::{ForecastRow, Granularity, Segment};
use route_forecast::reconcile::{
    aggregate_quarters_to_years, ReconcileMethod, ReconciliationEngine,
};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn month(offset: usize) -> NaiveDate {
    shift_months(start(), offset as i32).unwrap()
}

fn segment_of(code: u8) -> Segment {
    match code % 3 {
        0 => Segment::Train,
        1 => Segment::Test,
        _ => Segment::Future,
    }
}

fn monthly_rows(values: &[f64], segments: &[u8]) -> Vec<ForecastRow> {
    values
        .iter()
        .zip(segments)
        .enumerate()
        .map(|(i, (&v, &s))| ForecastRow::new(month(i), v, None, segment_of(s)))
        .collect()
}

/// Quarterly totals of `values` scaled by `factors`, one factor per quarter.
fn quarterly_rows(values: &[f64], factors: &[f64]) -> Vec<ForecastRow> {
    values
        .chunks(3)
        .zip(factors)
        .enumerate()
        .map(|(q, (chunk, f))| ForecastRow::future(month(3 * q), chunk.iter().sum::<f64>() * f))
        .collect()
}

fn quarter_sums(rows: &[f64]) -> Vec<f64> {
    rows.chunks(3).map(|c| c.iter().sum()).collect()
}

fn engines() -> [ReconciliationEngine; 2] {
    [
        ReconciliationEngine::new(ReconcileMethod::Linear, Granularity::Quarterly),
        ReconciliationEngine::new(ReconcileMethod::Mint, Granularity::Quarterly),
    ]
}

fn fine_series() -> impl Strategy<Value = (Vec<f64>, Vec<u8>, Vec<f64>)> {
    (1usize..6).prop_flat_map(|quarters| {
        (
            prop::collection::vec(10.0..1000.0_f64, 3 * quarters),
            prop::collection::vec(any::<u8>(), 3 * quarters),
            prop::collection::vec(0.5..1.5_f64, quarters),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn train_rows_are_never_adjusted((values, segments, factors) in fine_series()) {
        let fine = monthly_rows(&values, &segments);
        let coarse = quarterly_rows(&values, &factors);
        for engine in engines() {
            let out = engine.reconcile(&fine, &coarse).unwrap();
            prop_assert_eq!(out.len(), fine.len());
            for (row, rec) in fine.iter().zip(&out) {
                prop_assert_eq!(rec.period, row.period);
                prop_assert_eq!(rec.predicted, row.predicted);
                if row.segment == Segment::Train {
                    prop_assert_eq!(rec.reconciled, row.predicted);
                }
            }
        }
    }

    #[test]
    fn consistent_forecasts_are_left_alone((values, segments, _factors) in fine_series()) {
        let fine = monthly_rows(&values, &segments);
        let ones = vec![1.0; values.len() / 3];
        let coarse = quarterly_rows(&values, &ones);
        for engine in engines() {
            let out = engine.reconcile(&fine, &coarse).unwrap();
            for rec in &out {
                prop_assert!(rec.adjustment().abs() <= 1e-6 * rec.predicted.abs().max(1.0));
            }
        }
    }

    #[test]
    fn mint_matches_coarse_totals_on_future_rows(
        (values, _segments, factors) in fine_series(),
    ) {
        let future = vec![2u8; values.len()];
        let fine = monthly_rows(&values, &future);
        let coarse = quarterly_rows(&values, &factors);
        let engine = ReconciliationEngine::new(ReconcileMethod::Mint, Granularity::Quarterly);
        let out = engine.reconcile(&fine, &coarse).unwrap();

        let reconciled: Vec<f64> = out.iter().map(|r| r.reconciled).collect();
        for (got, target) in quarter_sums(&reconciled).iter().zip(&coarse) {
            prop_assert!((got - target.predicted).abs() <= 1e-6 * target.predicted.abs());
        }
    }

    #[test]
    fn linear_calibration_moves_every_future_row_of_a_bucket_by_one_ratio(
        (values, _segments, factors) in fine_series(),
    ) {
        let future = vec![2u8; values.len()];
        let fine = monthly_rows(&values, &future);
        let coarse = quarterly_rows(&values, &factors);
        let engine = ReconciliationEngine::new(ReconcileMethod::Linear, Granularity::Quarterly);
        let out = engine.reconcile(&fine, &coarse).unwrap();

        for bucket in out.chunks(3) {
            let ratio = bucket[0].reconciled / bucket[0].predicted;
            for rec in bucket {
                prop_assert!((rec.reconciled / rec.predicted - ratio).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn complete_future_years_are_bounded_by_future_quarters(
        history_years in 0usize..4,
        future_quarters in 0usize..13,
    ) {
        let quarter = |i: usize| shift_months(NaiveDate::from_ymd_opt(2018, 1, 1).unwrap(), 3 * i as i32).unwrap();
        let history: Vec<(NaiveDate, f64)> = (0..4 * history_years).map(|i| (quarter(i), 100.0)).collect();
        let future: Vec<(NaiveDate, f64)> = (0..future_quarters)
            .map(|i| (quarter(4 * history_years + i), 120.0))
            .collect();

        let out = aggregate_quarters_to_years(&history, &future).unwrap();
        let complete = history_years + future_quarters / 4;
        prop_assert_eq!(out.history.len() + out.future.len(), complete);
        prop_assert_eq!(out.future.len(), future_quarters / 4);
        for year in &out.future {
            prop_assert_eq!(year.value, 480.0);
        }
    }
}

#[test]
fn equal_quarter_totals_leave_monthly_forecast_unchanged() {
    let monthly: Vec<f64> = [90.0, 100.0, 110.0].repeat(4);
    let fine = monthly_rows(&monthly, &vec![2u8; monthly.len()]);
    let coarse: Vec<ForecastRow> = (0..4).map(|q| ForecastRow::future(month(3 * q), 300.0)).collect();

    for engine in engines() {
        let out = engine.reconcile(&fine, &coarse).unwrap();
        for (rec, expected) in out.iter().zip(&monthly) {
            assert_relative_eq!(rec.reconciled, *expected, epsilon = 1e-9);
        }
    }
}

#[test]
fn quarterly_forecast_reconciles_against_yearly() {
    let quarters: Vec<ForecastRow> = (0..8)
        .map(|q| ForecastRow::future(month(3 * q), 100.0 + q as f64))
        .collect();
    let years = vec![
        ForecastRow::future(month(0), 500.0),
        ForecastRow::future(month(12), 420.0),
    ];
    let engine = ReconciliationEngine::new(ReconcileMethod::Mint, Granularity::Yearly);
    let out = engine.reconcile(&quarters, &years).unwrap();

    let first: f64 = out[..4].iter().map(|r| r.reconciled).sum();
    let second: f64 = out[4..].iter().map(|r| r.reconciled).sum();
    assert_relative_eq!(first, 500.0, epsilon = 1e-9);
    assert_relative_eq!(second, 420.0, epsilon = 1e-9);
}

#[test]
fn seven_future_quarters_make_one_future_year() {
    let quarter = |i: i32| shift_months(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(), 3 * i).unwrap();
    let history: Vec<(NaiveDate, f64)> = (0..5).map(|i| (quarter(i), 100.0)).collect();
    let future: Vec<(NaiveDate, f64)> = (5..12).map(|i| (quarter(i), 120.0)).collect();

    let out = aggregate_quarters_to_years(&history, &future).unwrap();
    assert_eq!(out.future.len(), 1);
    assert_eq!(out.future[0].year, 2023);
    assert_eq!(out.history.len(), 2);
    // 2022 mixes one historical quarter with three forecast quarters
    assert_eq!(out.history[1].value, 460.0);
}
