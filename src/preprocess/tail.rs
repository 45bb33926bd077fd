//! Extrapolation of the trailing gap after a column's last observation.

use crate::core::Granularity;
use crate::models::TimeModelKind;
use crate::utils::ols::linear_fit;
use crate::utils::stats::recency_weighted_average;
use tracing::warn;

/// First weight of the recency-weighted fallback; the latest value weighs 1.
const FALLBACK_FIRST_WEIGHT: f64 = 0.5;

/// Settings shared by the tail strategies.
#[derive(Debug, Clone, Copy)]
pub struct TailSettings {
    pub granularity: Granularity,
    pub model: TimeModelKind,
    pub min_fit_points: usize,
    pub forecast_horizon: usize,
    pub fallback_window: usize,
}

/// Extend a macro indicator along its least-squares line on time.
///
/// `times` are the numeric period keys. The line is fitted on the valid
/// points up to the last observation; with fewer than `min_fit_points`
/// points, or a failed fit, the last observation is repeated.
pub fn economic_tail(column: &str, values: &mut [f64], times: &[f64], settings: &TailSettings) {
    let Some(last) = values.iter().rposition(|v| v.is_finite()) else {
        return;
    };
    if last + 1 == values.len() {
        return;
    }
    let last_value = values[last];

    let (xs, ys): (Vec<f64>, Vec<f64>) = values[..=last]
        .iter()
        .zip(times)
        .filter(|(v, _)| v.is_finite())
        .map(|(v, t)| (*t, *v))
        .unzip();

    if xs.len() < settings.min_fit_points {
        values[last + 1..].fill(last_value);
        return;
    }

    match linear_fit(&xs, &ys) {
        Ok(line) => {
            for (v, t) in values[last + 1..].iter_mut().zip(&times[last + 1..]) {
                *v = line.predict(*t);
            }
        }
        Err(e) => {
            warn!(column = %column, error = %e, "tail regression failed, repeating last value");
            values[last + 1..].fill(last_value);
        }
    }
}

/// Forecast the trailing gap of an operational column with the configured time model.
///
/// At most `forecast_horizon` steps are forecast; any remaining positions
/// repeat the last forecast. A failed fit or a non-finite forecast degrades
/// to the recency-weighted mean of the latest observations.
pub fn operational_tail(column: &str, values: &mut [f64], settings: &TailSettings) {
    let Some(last) = values.iter().rposition(|v| v.is_finite()) else {
        return;
    };
    let gap = values.len() - last - 1;
    if gap == 0 {
        return;
    }

    let history: Vec<f64> = values[..=last]
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .collect();
    let steps = gap.min(settings.forecast_horizon.max(1));

    let mut model = settings.model.build(settings.granularity);
    let forecast = match model.fit_forecast(&history, steps) {
        Ok(forecast) => forecast,
        Err(e) => {
            warn!(
                column = %column,
                model = %settings.model,
                error = %e,
                "tail model failed, using recent weighted mean"
            );
            fallback_fill(&mut values[last + 1..], &history, settings.fallback_window);
            return;
        }
    };

    let tail = &mut values[last + 1..];
    tail[..steps].copy_from_slice(&forecast);
    if let Some(&repeat) = forecast.last() {
        tail[steps..].fill(repeat);
    }
}

/// Fill `tail` with the weighted mean of the last `window` values of `history`.
fn fallback_fill(tail: &mut [f64], history: &[f64], window: usize) {
    let value =
        recency_weighted_average(history, window, FALLBACK_FIRST_WEIGHT).unwrap_or(0.0);
    tail.fill(value);
}
