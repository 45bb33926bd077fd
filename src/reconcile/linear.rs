//! Linear calibration of bucket totals.

use crate::core::period::period_start;
use crate::core::{ForecastRow, Granularity, ReconciledRow};
use crate::error::Result;
use crate::reconcile::bucket_totals;
use crate::utils::ols::linear_fit;
use std::collections::BTreeMap;
use tracing::debug;

/// Scale Future rows so each bucket total follows the least-squares map from
/// fine totals to coarse totals.
///
/// The map `coarse ≈ a · fine + b` is fitted over buckets present in both
/// series and applied to every fine bucket. Each Future row is multiplied by
/// its bucket's `adjusted / fine_total`; a non-finite ratio counts as 1.
pub fn linear_reconcile(
    fine: &[ForecastRow],
    coarse: &[ForecastRow],
    coarse_granularity: Granularity,
) -> Result<Vec<ReconciledRow>> {
    let fine_totals = bucket_totals(fine, coarse_granularity);
    let coarse_totals = bucket_totals(coarse, coarse_granularity);

    let (x, y): (Vec<f64>, Vec<f64>) = fine_totals
        .iter()
        .filter_map(|(bucket, &f)| coarse_totals.get(bucket).map(|&c| (f, c)))
        .unzip();
    if x.is_empty() {
        debug!("no overlapping buckets, fine forecast left unreconciled");
        return Ok(fine.iter().map(ReconciledRow::unchanged).collect());
    }

    let map = linear_fit(&x, &y)?;
    let ratios: BTreeMap<_, f64> = fine_totals
        .iter()
        .map(|(&bucket, &total)| {
            let ratio = map.predict(total) / total;
            (bucket, if ratio.is_finite() { ratio } else { 1.0 })
        })
        .collect();
    debug!(
        slope = map.slope,
        intercept = map.intercept,
        buckets = x.len(),
        "linear calibration fitted"
    );

    Ok(fine
        .iter()
        .map(|row| {
            let bucket = period_start(row.period, coarse_granularity);
            match ratios.get(&bucket) {
                Some(&ratio) if row.is_future() => ReconciledRow::adjusted(row, row.predicted * ratio),
                _ => ReconciledRow::unchanged(row),
            }
        })
        .collect())
}
