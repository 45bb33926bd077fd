//! Gap filling primitives over a single column.
//!
//! Positions are treated as equally spaced, so interpolation runs on the row
//! index rather than on calendar distance.

use crate::utils::ols::linear_fit;

/// Index of the first finite value.
pub fn first_valid(values: &[f64]) -> Option<usize> {
    values.iter().position(|v| v.is_finite())
}

/// Index of the last finite value.
pub fn last_valid(values: &[f64]) -> Option<usize> {
    values.iter().rposition(|v| v.is_finite())
}

/// Share of non-finite values; `0.0` for an empty column.
pub fn missing_ratio(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|v| !v.is_finite()).count() as f64 / values.len() as f64
}

/// Replace literal zeros with `NaN`.
pub fn zeros_to_missing(values: &mut [f64]) {
    for v in values.iter_mut() {
        if *v == 0.0 {
            *v = f64::NAN;
        }
    }
}

/// Give every value before the first observation that observation's value.
pub fn fill_head(values: &mut [f64]) {
    if let Some(first) = first_valid(values) {
        let value = values[first];
        values[..first].fill(value);
    }
}

/// Linearly interpolate gaps bounded by observations on both sides.
///
/// With `fill_edges` a leading or trailing gap takes its nearest observation;
/// without it edge gaps are left missing.
pub fn interpolate(values: &mut [f64], fill_edges: bool) {
    let n = values.len();
    let mut i = 0;
    while i < n {
        if values[i].is_finite() {
            i += 1;
            continue;
        }
        let start = i;
        while i < n && !values[i].is_finite() {
            i += 1;
        }
        let end = i;

        let left = start.checked_sub(1).map(|j| values[j]);
        let right = (end < n).then(|| values[end]);
        match (left, right) {
            (Some(l), Some(r)) => {
                let segments = (end - start + 1) as f64;
                for (j, idx) in (start..end).enumerate() {
                    let t = (j + 1) as f64 / segments;
                    values[idx] = l + t * (r - l);
                }
            }
            (Some(l), None) if fill_edges => values[start..end].fill(l),
            (None, Some(r)) if fill_edges => values[start..end].fill(r),
            _ => {}
        }
    }
}

/// Interpolate interior gaps only; the trailing gap after the last observation stays missing.
pub fn interpolate_interior(values: &mut [f64]) {
    if let Some(last) = last_valid(values) {
        interpolate(&mut values[..=last], false);
    }
}

/// Fill interior gaps from a least-squares line of value on `times`.
///
/// Falls back to interpolation with fewer than `min_points` observations or
/// when the fit fails. The trailing gap stays missing.
pub fn regression_interior(values: &mut [f64], times: &[f64], min_points: usize) {
    let Some(last) = last_valid(values) else {
        return;
    };
    let (xs, ys): (Vec<f64>, Vec<f64>) = values
        .iter()
        .zip(times)
        .filter(|(v, _)| v.is_finite())
        .map(|(v, t)| (*t, *v))
        .unzip();

    if xs.len() < min_points {
        interpolate_interior(values);
        return;
    }
    match linear_fit(&xs, &ys) {
        Ok(line) => {
            for (v, t) in values[..=last].iter_mut().zip(times) {
                if !v.is_finite() {
                    *v = line.predict(*t);
                }
            }
        }
        Err(_) => interpolate_interior(values),
    }
}

/// Replace every missing value with `value`.
pub fn fill_constant(values: &mut [f64], value: f64) {
    for v in values.iter_mut() {
        if !v.is_finite() {
            *v = value;
        }
    }
}
