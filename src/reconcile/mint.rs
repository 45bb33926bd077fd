//! Minimum-trace reconciliation, OLS variant.

use crate::core::period::period_start;
use crate::core::{ForecastRow, Granularity, ReconciledRow, Segment};
use crate::error::{ForecastError, Result};
use crate::reconcile::bucket_totals;
use crate::reconcile::linalg::{matmul, matvec, pseudo_inverse, transpose};
use tracing::debug;

/// Distribute the coarse-to-fine mismatch over the fine rows.
///
/// With the 0/1 aggregation matrix `S` (coarse buckets × fine rows inside
/// those buckets) and error weights `W`, the reconciled fine vector is
/// `ŷ = y + W Sᵗ pinv(S W Sᵗ) (y_coarse − S y)`. Only Future and Test rows
/// take the reconciled value.
///
/// `weights` is the diagonal of `W`, one entry per fine row; `None` is the
/// identity.
pub fn mint_reconcile(
    fine: &[ForecastRow],
    coarse: &[ForecastRow],
    coarse_granularity: Granularity,
    weights: Option<&[f64]>,
) -> Result<Vec<ReconciledRow>> {
    if let Some(w) = weights {
        if w.len() != fine.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: fine.len(),
                got: w.len(),
            });
        }
        if w.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(ForecastError::InvalidParameter(
                "MinT weights must be positive and finite".into(),
            ));
        }
    }

    let coarse_totals = bucket_totals(coarse, coarse_granularity);
    let buckets: Vec<_> = coarse_totals.keys().copied().collect();
    let members: Vec<(usize, usize)> = fine
        .iter()
        .enumerate()
        .filter_map(|(j, row)| {
            buckets
                .binary_search(&period_start(row.period, coarse_granularity))
                .ok()
                .map(|i| (j, i))
        })
        .collect();
    if members.is_empty() {
        debug!("no overlapping buckets, fine forecast left unreconciled");
        return Ok(fine.iter().map(ReconciledRow::unchanged).collect());
    }

    let n_q = buckets.len();
    let n_m = members.len();
    let mut s = vec![vec![0.0; n_m]; n_q];
    for (col, &(_, bucket)) in members.iter().enumerate() {
        s[bucket][col] = 1.0;
    }
    let y: Vec<f64> = members
        .iter()
        .map(|&(j, _)| fine[j].predicted)
        .map(|v| if v.is_finite() { v } else { 0.0 })
        .collect();
    let y_coarse: Vec<f64> = buckets.iter().map(|b| coarse_totals[b]).collect();

    let mut w_st = transpose(&s);
    if let Some(w) = weights {
        for (row, &(j, _)) in w_st.iter_mut().zip(&members) {
            row.iter_mut().for_each(|v| *v *= w[j]);
        }
    }
    let s_w_st = matmul(&s, &w_st);
    let g = matmul(&w_st, &pseudo_inverse(&s_w_st));

    let aggregated = matvec(&s, &y);
    let residual: Vec<f64> = y_coarse
        .iter()
        .zip(&aggregated)
        .map(|(c, a)| c - a)
        .collect();
    let adjustment = matvec(&g, &residual);
    debug!(
        buckets = n_q,
        rows = n_m,
        max_residual = residual.iter().fold(0.0_f64, |m, r| m.max(r.abs())),
        "MinT adjustment computed"
    );

    let mut out: Vec<ReconciledRow> = fine.iter().map(ReconciledRow::unchanged).collect();
    for (col, &(j, _)) in members.iter().enumerate() {
        let row = &fine[j];
        if matches!(row.segment, Segment::Future | Segment::Test) {
            out[j] = ReconciledRow::adjusted(row, y[col] + adjustment[col]);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn month(m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, 1).unwrap()
    }

    #[test]
    fn mismatch_is_split_evenly_with_identity_weights() {
        let fine: Vec<ForecastRow> = [90.0, 100.0, 110.0]
            .iter()
            .enumerate()
            .map(|(i, &v)| ForecastRow::future(month(i as u32 + 1), v))
            .collect();
        let coarse = vec![ForecastRow::future(month(1), 330.0)];
        let out = mint_reconcile(&fine, &coarse, Granularity::Quarterly, None).unwrap();
        assert_relative_eq!(out[0].reconciled, 100.0, epsilon = 1e-9);
        assert_relative_eq!(out[1].reconciled, 110.0, epsilon = 1e-9);
        assert_relative_eq!(out[2].reconciled, 120.0, epsilon = 1e-9);
    }

    #[test]
    fn weights_shift_the_adjustment() {
        let fine: Vec<ForecastRow> = (1..=3)
            .map(|m| ForecastRow::future(month(m), 100.0))
            .collect();
        let coarse = vec![ForecastRow::future(month(1), 400.0)];
        let weights = [2.0, 1.0, 1.0];
        let out = mint_reconcile(&fine, &coarse, Granularity::Quarterly, Some(&weights)).unwrap();
        assert_relative_eq!(out[0].reconciled, 150.0, epsilon = 1e-9);
        assert_relative_eq!(out[1].reconciled, 125.0, epsilon = 1e-9);
        assert!(mint_reconcile(&fine, &coarse, Granularity::Quarterly, Some(&[1.0])).is_err());
    }

    #[test]
    fn only_future_and_test_rows_move() {
        let fine = vec![
            ForecastRow::new(month(1), 90.0, Some(90.0), Segment::Train),
            ForecastRow::new(month(2), 100.0, Some(95.0), Segment::Test),
            ForecastRow::future(month(3), 110.0),
            ForecastRow::future(month(4), 120.0),
        ];
        let coarse = vec![ForecastRow::future(month(1), 330.0)];
        let out = mint_reconcile(&fine, &coarse, Granularity::Quarterly, None).unwrap();
        assert_eq!(out[0].reconciled, 90.0);
        assert_relative_eq!(out[1].reconciled, 110.0, epsilon = 1e-9);
        assert_relative_eq!(out[2].reconciled, 120.0, epsilon = 1e-9);
        // April has no coarse counterpart
        assert_eq!(out[3].reconciled, 120.0);
    }
}
