//! Derivative-free minimisation used to estimate time-model parameters.

/// Outcome of a simplex search.
#[derive(Debug, Clone)]
pub struct Minimum {
    pub point: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Nelder-Mead simplex settings.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    pub max_iter: usize,
    pub tolerance: f64,
    /// Initial simplex step, relative to the starting coordinate when it is non-zero.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 500,
            tolerance: 1e-8,
            initial_step: 0.05,
        }
    }
}

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Minimise `objective` starting at `initial`, keeping every vertex inside `bounds`.
///
/// Non-finite objective values are treated as `+inf`, so callers can signal an
/// invalid region (e.g. a non-invertible MA polynomial) by returning `NaN`.
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: &NelderMeadConfig,
) -> Minimum
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    let eval = |x: &[f64]| {
        let v = objective(x);
        if v.is_finite() {
            v
        } else {
            f64::INFINITY
        }
    };

    if n == 0 {
        return Minimum {
            point: Vec::new(),
            value: eval(&[]),
            iterations: 0,
            converged: true,
        };
    }

    let clamp = |x: Vec<f64>| clamp_to_bounds(x, bounds);

    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
    let start = clamp(initial.to_vec());
    let start_value = eval(&start);
    simplex.push((start, start_value));
    for i in 0..n {
        let mut vertex = initial.to_vec();
        vertex[i] += if initial[i].abs() > 1e-10 {
            config.initial_step * initial[i].abs()
        } else {
            config.initial_step
        };
        let vertex = clamp(vertex);
        let value = eval(&vertex);
        simplex.push((vertex, value));
    }

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;
        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));

        let best = simplex[0].1;
        let worst = simplex[n].1;
        if (worst - best).abs() < config.tolerance
            || (best.is_infinite() && worst.is_infinite())
        {
            converged = best.is_finite();
            break;
        }

        let centroid = centroid(&simplex[..n]);
        let towards = |coef: f64| -> Vec<f64> {
            let worst_point = &simplex[n].0;
            clamp(
                centroid
                    .iter()
                    .zip(worst_point)
                    .map(|(c, w)| c + coef * (c - w))
                    .collect(),
            )
        };

        let reflected = towards(REFLECT);
        let reflected_value = eval(&reflected);

        if reflected_value < simplex[0].1 {
            let expanded = towards(EXPAND);
            let expanded_value = eval(&expanded);
            simplex[n] = if expanded_value < reflected_value {
                (expanded, expanded_value)
            } else {
                (reflected, reflected_value)
            };
            continue;
        }

        if reflected_value < simplex[n - 1].1 {
            simplex[n] = (reflected, reflected_value);
            continue;
        }

        let contracted = if reflected_value < simplex[n].1 {
            towards(REFLECT * CONTRACT)
        } else {
            towards(-CONTRACT)
        };
        let contracted_value = eval(&contracted);
        if contracted_value < simplex[n].1.min(reflected_value) {
            simplex[n] = (contracted, contracted_value);
            continue;
        }

        let anchor = simplex[0].0.clone();
        for vertex in simplex.iter_mut().skip(1) {
            let shrunk: Vec<f64> = anchor
                .iter()
                .zip(&vertex.0)
                .map(|(a, v)| a + SHRINK * (v - a))
                .collect();
            let shrunk = clamp(shrunk);
            let value = eval(&shrunk);
            *vertex = (shrunk, value);
        }
    }

    simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
    let (point, value) = simplex.swap_remove(0);
    Minimum {
        point,
        value,
        iterations,
        converged,
    }
}

fn centroid(vertices: &[(Vec<f64>, f64)]) -> Vec<f64> {
    let dim = vertices[0].0.len();
    let mut c = vec![0.0; dim];
    for (point, _) in vertices {
        for (ci, pi) in c.iter_mut().zip(point) {
            *ci += pi;
        }
    }
    let k = vertices.len() as f64;
    c.iter_mut().for_each(|ci| *ci /= k);
    c
}

fn clamp_to_bounds(mut x: Vec<f64>, bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    if let Some(bounds) = bounds {
        for (xi, &(lo, hi)) in x.iter_mut().zip(bounds) {
            *xi = xi.clamp(lo, hi);
        }
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn finds_quadratic_minimum() {
        let result = nelder_mead(
            |x| (x[0] - 2.0).powi(2) + (x[1] + 1.0).powi(2),
            &[0.0, 0.0],
            None,
            &NelderMeadConfig::default(),
        );
        assert!(result.converged);
        assert_relative_eq!(result.point[0], 2.0, epsilon = 1e-3);
        assert_relative_eq!(result.point[1], -1.0, epsilon = 1e-3);
    }

    #[test]
    fn respects_bounds() {
        let bounds = [(0.0, 0.5)];
        let result = nelder_mead(
            |x| (x[0] - 3.0).powi(2),
            &[0.1],
            Some(&bounds),
            &NelderMeadConfig::default(),
        );
        assert!(result.point[0] <= 0.5 && result.point[0] >= 0.0);
        assert_relative_eq!(result.point[0], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn nan_objective_is_avoided() {
        let result = nelder_mead(
            |x| if x[0] < 0.0 { f64::NAN } else { (x[0] - 0.3).powi(2) },
            &[0.5],
            None,
            &NelderMeadConfig::default(),
        );
        assert!(result.value.is_finite());
        assert_relative_eq!(result.point[0], 0.3, epsilon = 1e-3);
    }
}
