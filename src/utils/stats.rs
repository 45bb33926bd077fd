//! Statistical helpers shared by the preprocessor, the fallbacks and the models.

use statrs::statistics::{Data, Median, Statistics};

/// Mean of the finite values of a slice; `NaN` if there are none.
pub fn mean(values: &[f64]) -> f64 {
    let finite: Vec<f64> = finite_values(values);
    if finite.is_empty() {
        return f64::NAN;
    }
    Statistics::mean(finite.iter())
}

/// Median of the finite values of a slice; `NaN` if there are none.
pub fn median(values: &[f64]) -> f64 {
    let finite = finite_values(values);
    if finite.is_empty() {
        return f64::NAN;
    }
    Data::new(finite).median()
}

/// Population standard deviation (ddof = 0) of the finite values.
pub fn population_std_dev(values: &[f64]) -> f64 {
    let finite = finite_values(values);
    if finite.is_empty() {
        return f64::NAN;
    }
    Statistics::population_std_dev(finite.iter())
}

/// Finite values of a slice, in order.
pub fn finite_values(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

/// `n` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Weighted average of the last `window` values with weights rising linearly
/// from `first_weight` to `1.0` towards the most recent value.
pub fn recency_weighted_average(values: &[f64], window: usize, first_weight: f64) -> Option<f64> {
    let n = window.min(values.len());
    if n == 0 {
        return None;
    }
    let weights = linspace(first_weight, 1.0, n);
    let total: f64 = weights.iter().sum();
    let recent = &values[values.len() - n..];
    let weighted: f64 = recent.iter().zip(&weights).map(|(v, w)| v * w).sum();
    Some(weighted / total)
}

/// Most frequent value among the finite values; ties go to the smallest value.
pub fn mode(values: &[f64]) -> Option<f64> {
    let mut sorted = finite_values(values);
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut best: Option<(f64, usize)> = None;
    let mut i = 0;
    while i < sorted.len() {
        let value = sorted[i];
        let run = sorted[i..].iter().take_while(|v| **v == value).count();
        if best.map_or(true, |(_, count)| run > count) {
            best = Some((value, run));
        }
        i += run;
    }
    best.map(|(value, _)| value)
}
