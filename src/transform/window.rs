//! Shifted and windowed views of a series used to build lag features.

/// Shift a series forward by `k` periods: `out[i] = series[i - k]`.
///
/// The first `k` entries have no source value and are `NaN`.
pub fn lag(series: &[f64], k: usize) -> Vec<f64> {
    let n = series.len();
    let mut result = vec![f64::NAN; n];
    if k < n {
        result[k..].copy_from_slice(&series[..n - k]);
    }
    result
}

/// Mean of the `window` values strictly before each position.
///
/// Excludes the current value so the feature is available at forecast time.
/// Positions with fewer than `window` earlier values are `NaN`.
pub fn trailing_mean(series: &[f64], window: usize) -> Vec<f64> {
    let n = series.len();
    let mut result = vec![f64::NAN; n];
    if window == 0 {
        return result;
    }
    for i in window..n {
        let segment = &series[i - window..i];
        result[i] = segment.iter().sum::<f64>() / window as f64;
    }
    result
}
