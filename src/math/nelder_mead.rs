//! Derivative-free minimization with the Nelder–Mead simplex method.
//!
//! The seasonal ARIMA objective is cheap to evaluate but has no convenient
//! analytic gradient, and the search runs without stationarity/invertibility
//! constraints, so a simplex method fits well.
//!
//! We use the dimension-adaptive coefficients of Gao & Han (2012), which
//! behave better than the textbook values once the dimension exceeds ~4.
//!
//! Non-finite objective values are treated as `+inf`, so the simplex simply
//! moves away from regions where the residual recursion explodes.
//!
//! On long narrow valleys the simplex tends to flatten and crawl. The
//! restarted variant rebuilds a regular simplex around the best vertex every
//! `restart_every` iterations, all runs sharing one `max_iter` budget.

/// Settings for a single minimization run.
#[derive(Debug, Clone, Copy)]
pub struct NelderMeadConfig {
    /// Maximum number of simplex iterations.
    pub max_iter: usize,
    /// Convergence tolerance on the simplex diameter (max abs coordinate spread).
    pub xatol: f64,
    /// Convergence tolerance on the spread of objective values.
    pub fatol: f64,
    /// Offset applied to each coordinate when building the initial simplex.
    pub initial_step: f64,
    /// Iterations per run before [`nelder_mead_restarted`] starts afresh.
    pub restart_every: usize,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            xatol: 1e-4,
            fatol: 1e-4,
            initial_step: 0.1,
            restart_every: 250,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    pub point: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub converged: bool,
    /// Largest coordinate spread of the final simplex.
    pub diameter: f64,
    pub restarts: usize,
}

/// Minimize `f` starting from `start`.
pub fn nelder_mead<F>(mut f: F, start: &[f64], config: NelderMeadConfig) -> NelderMeadResult
where
    F: FnMut(&[f64]) -> f64,
{
    let n = start.len();
    let mut evaluations = 0usize;
    let mut eval = |x: &[f64]| {
        evaluations += 1;
        let v = f(x);
        if v.is_finite() { v } else { f64::INFINITY }
    };

    if n == 0 {
        let value = eval(start);
        return NelderMeadResult {
            point: Vec::new(),
            value,
            iterations: 0,
            evaluations: 1,
            converged: value.is_finite(),
            diameter: 0.0,
            restarts: 0,
        };
    }

    let dim = n as f64;
    let alpha = 1.0;
    let gamma = 1.0 + 2.0 / dim;
    let rho = 0.75 - 1.0 / (2.0 * dim);
    let sigma = 1.0 - 1.0 / dim;

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(start.to_vec());
    for i in 0..n {
        let mut vertex = start.to_vec();
        vertex[i] += config.initial_step;
        simplex.push(vertex);
    }
    let mut values: Vec<f64> = simplex.iter().map(|x| eval(x)).collect();

    let mut iterations = 0usize;
    let mut converged = false;

    loop {
        sort_simplex(&mut simplex, &mut values);

        if has_converged(&simplex, &values, config) {
            converged = values[0].is_finite();
            break;
        }
        if iterations >= config.max_iter {
            break;
        }
        iterations += 1;

        let centroid = centroid(&simplex[..n]);
        let worst = simplex[n].clone();

        let reflected = along(&centroid, &worst, -alpha);
        let f_reflected = eval(&reflected);

        if f_reflected < values[0] {
            let expanded = along(&centroid, &worst, -alpha * gamma);
            let f_expanded = eval(&expanded);
            if f_expanded < f_reflected {
                simplex[n] = expanded;
                values[n] = f_expanded;
            } else {
                simplex[n] = reflected;
                values[n] = f_reflected;
            }
            continue;
        }

        if f_reflected < values[n - 1] {
            simplex[n] = reflected;
            values[n] = f_reflected;
            continue;
        }

        let (contracted, f_contracted, accept) = if f_reflected < values[n] {
            // Outside contraction.
            let x = along(&centroid, &worst, -alpha * rho);
            let fx = eval(&x);
            (x, fx, fx <= f_reflected)
        } else {
            // Inside contraction.
            let x = along(&centroid, &worst, rho);
            let fx = eval(&x);
            (x, fx, fx < values[n])
        };

        if accept {
            simplex[n] = contracted;
            values[n] = f_contracted;
            continue;
        }

        // Shrink towards the best vertex.
        let best = simplex[0].clone();
        for i in 1..=n {
            let shrunk: Vec<f64> = best
                .iter()
                .zip(&simplex[i])
                .map(|(&b, &x)| b + sigma * (x - b))
                .collect();
            values[i] = eval(&shrunk);
            simplex[i] = shrunk;
        }
    }

    let spread = diameter(&simplex);
    NelderMeadResult {
        point: simplex.swap_remove(0),
        value: values[0],
        iterations,
        evaluations,
        converged,
        diameter: spread,
        restarts: 0,
    }
}

/// Minimize `f`, restarting from the best vertex until convergence or until
/// `config.max_iter` iterations have been spent in total.
///
/// The new simplex is sized to the spread of the one it replaces, clamped to
/// `[10 * xatol, initial_step]`.
pub fn nelder_mead_restarted<F>(
    mut f: F,
    start: &[f64],
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: FnMut(&[f64]) -> f64,
{
    let per_run = config.restart_every.max(1);
    let mut point = start.to_vec();
    let mut step = config.initial_step;
    let mut iterations = 0usize;
    let mut evaluations = 0usize;
    let mut restarts = 0usize;

    loop {
        let run_config = NelderMeadConfig {
            max_iter: config.max_iter.saturating_sub(iterations).min(per_run),
            initial_step: step,
            ..config
        };
        let run = nelder_mead(&mut f, &point, run_config);
        iterations += run.iterations;
        evaluations += run.evaluations;

        if run.converged || run.iterations == 0 || iterations >= config.max_iter {
            return NelderMeadResult {
                iterations,
                evaluations,
                restarts,
                ..run
            };
        }

        restarts += 1;
        let floor = 10.0 * config.xatol;
        step = if run.diameter.is_finite() {
            run.diameter.clamp(floor, config.initial_step.max(floor))
        } else {
            config.initial_step
        };
        point = run.point;
    }
}

fn sort_simplex(simplex: &mut Vec<Vec<f64>>, values: &mut Vec<f64>) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    *simplex = order.iter().map(|&i| simplex[i].clone()).collect();
    *values = order.iter().map(|&i| values[i]).collect();
}

fn has_converged(simplex: &[Vec<f64>], values: &[f64], config: NelderMeadConfig) -> bool {
    let x_spread = diameter(simplex);
    let f_spread = values[1..]
        .iter()
        .map(|v| (v - values[0]).abs())
        .fold(0.0, f64::max);
    x_spread <= config.xatol && f_spread <= config.fatol
}

/// Largest absolute coordinate difference between the first vertex and the others.
fn diameter(simplex: &[Vec<f64>]) -> f64 {
    let best = &simplex[0];
    simplex[1..]
        .iter()
        .flat_map(|v| v.iter().zip(best).map(|(a, b)| (a - b).abs()))
        .fold(0.0, f64::max)
}

fn centroid(vertices: &[Vec<f64>]) -> Vec<f64> {
    let n = vertices.len() as f64;
    let mut c = vec![0.0; vertices[0].len()];
    for v in vertices {
        for (ci, vi) in c.iter_mut().zip(v) {
            *ci += vi / n;
        }
    }
    c
}

/// `centroid + t * (point - centroid)`.
fn along(centroid: &[f64], point: &[f64], t: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(point)
        .map(|(&c, &p)| c + t * (p - c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimizes_shifted_quadratic() {
        let f = |x: &[f64]| (x[0] - 1.5).powi(2) + 2.0 * (x[1] + 0.5).powi(2);
        let res = nelder_mead(f, &[0.0, 0.0], NelderMeadConfig::default());
        assert!(res.converged);
        assert!((res.point[0] - 1.5).abs() < 1e-3);
        assert!((res.point[1] + 0.5).abs() < 1e-3);
    }

    #[test]
    fn minimizes_rosenbrock_within_cap() {
        let f = |x: &[f64]| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2);
        let config = NelderMeadConfig {
            xatol: 1e-8,
            fatol: 1e-10,
            ..Default::default()
        };
        let res = nelder_mead(f, &[-1.2, 1.0], config);
        assert!(res.converged, "iterations: {}", res.iterations);
        assert!((res.point[0] - 1.0).abs() < 1e-3);
        assert!((res.point[1] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn non_finite_regions_are_avoided() {
        let f = |x: &[f64]| if x[0] < 0.0 { f64::NAN } else { (x[0] - 2.0).powi(2) };
        let res = nelder_mead(f, &[0.5], NelderMeadConfig::default());
        assert!(res.converged);
        assert!((res.point[0] - 2.0).abs() < 1e-3);
    }

    #[test]
    fn reports_non_convergence_at_iteration_cap() {
        let f = |x: &[f64]| x.iter().map(|v| v * v).sum::<f64>();
        let config = NelderMeadConfig {
            max_iter: 3,
            ..Default::default()
        };
        let res = nelder_mead(f, &[5.0, 5.0, 5.0], config);
        assert!(!res.converged);
        assert_eq!(res.iterations, 3);
    }

    #[test]
    fn restarts_share_the_iteration_budget() {
        let f = |x: &[f64]| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2);
        let config = NelderMeadConfig {
            max_iter: 40,
            restart_every: 10,
            ..Default::default()
        };
        let res = nelder_mead_restarted(f, &[-1.2, 1.0], config);
        assert!(!res.converged);
        assert_eq!(res.iterations, 40);
        assert_eq!(res.restarts, 3);
    }

    #[test]
    fn restarted_search_converges_across_short_runs() {
        let f = |x: &[f64]| x[0] * x[0] + 4.0 * x[1] * x[1] + 9.0 * x[2] * x[2];
        let config = NelderMeadConfig {
            restart_every: 30,
            ..Default::default()
        };
        let res = nelder_mead_restarted(f, &[5.0, 5.0, 5.0], config);
        assert!(res.converged, "iterations: {}", res.iterations);
        assert!(res.restarts > 0);
        assert!(res.iterations <= config.max_iter);
        assert!(res.point.iter().all(|v| v.abs() < 1e-2), "{:?}", res.point);
    }
}
