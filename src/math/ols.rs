//! Least squares solver.
//!
//! Start values for the seasonal ARIMA search come from small regressions of
//! the differenced series on its own lags (and lagged residual estimates):
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - We use SVD so tall design matrices (more rows than columns) are handled
//!   robustly. (Nalgebra's `QR::solve` is intended for square systems.)
//! - The parameter dimension is tiny (at most a few dozen columns), so SVD
//!   performance is not a concern.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() < x.ncols() || x.nrows() != y.len() {
        return None;
    }
    let svd = x.clone().svd(true, true);

    // Lagged regressors of a short seasonal series are often nearly collinear;
    // try progressively looser tolerances before giving up.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Build a design matrix from row-major lag columns.
///
/// `rows[i]` holds the regressors for observation `i`; all rows must have the
/// same length.
pub fn design_matrix(rows: &[Vec<f64>]) -> Option<DMatrix<f64>> {
    let ncols = rows.first()?.len();
    if ncols == 0 || rows.iter().any(|r| r.len() != ncols) {
        return None;
    }
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Some(DMatrix::from_row_slice(rows.len(), ncols, &flat))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn underdetermined_system_is_rejected() {
        let x = DMatrix::from_row_slice(1, 2, &[1.0, 2.0]);
        let y = DVector::from_row_slice(&[3.0]);
        assert!(solve_least_squares(&x, &y).is_none());
    }

    #[test]
    fn design_matrix_requires_rectangular_rows() {
        assert!(design_matrix(&[vec![1.0, 2.0], vec![3.0]]).is_none());
        let m = design_matrix(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m[(1, 0)], 3.0);
    }
}
