//! Least squares solver.
//!
//! Autoregressive coefficients are estimated by regressing each differenced
//! value on its `p` predecessors:
//!
//! ```text
//! minimize Σ_t (w_t - φ_1 w_{t-1} - … - φ_p w_{t-p})^2
//! ```
//!
//! Implementation choices:
//! - We use SVD so the solve stays robust when the design matrix is tall
//!   (many more observations than lags) or nearly collinear (flat prices).
//!   Nalgebra's `QR::solve` is intended for square systems.
//! - The parameter dimension is tiny (`p` columns), so SVD cost is negligible.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() != y.len() || x.nrows() == 0 || x.ncols() == 0 {
        return None;
    }

    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Build the lagged design matrix for an AR(`p`) regression without intercept.
///
/// Row `i` holds `[w_{t-1}, …, w_{t-p}]` for target `w_t` with `t = p + i`.
/// Returns `None` when the series has no complete row.
pub fn lagged_design(series: &[f64], p: usize) -> Option<(DMatrix<f64>, DVector<f64>)> {
    if p == 0 || series.len() <= p {
        return None;
    }
    let rows = series.len() - p;
    let x = DMatrix::from_fn(rows, p, |i, j| series[p + i - 1 - j]);
    let y = DVector::from_iterator(rows, series[p..].iter().copied());
    Some((x, y))
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
    fn least_squares_rejects_mismatched_shapes() {
        let x = DMatrix::from_row_slice(2, 1, &[1.0, 2.0]);
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        assert!(solve_least_squares(&x, &y).is_none());
    }

    #[test]
    fn lagged_design_orders_lags_most_recent_first() {
        let series = [1.0, 2.0, 3.0, 4.0, 5.0];
        let (x, y) = lagged_design(&series, 2).unwrap();
        assert_eq!(x.nrows(), 3);
        assert_eq!((x[(0, 0)], x[(0, 1)]), (2.0, 1.0));
        assert_eq!((x[(2, 0)], x[(2, 1)]), (4.0, 3.0));
        assert_eq!(y.as_slice(), &[3.0, 4.0, 5.0]);

        assert!(lagged_design(&series, 5).is_none());
        assert!(lagged_design(&series, 0).is_none());
    }
}
