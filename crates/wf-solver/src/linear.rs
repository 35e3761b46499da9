//! Dense linear solve.

use crate::error::{SolverError, SolverResult};
use nalgebra::{DMatrix, DVector};
use wf_core::numeric::ensure_finite;

/// Solve `a · x = b` by LU decomposition with partial pivoting.
///
/// Fails with [`SolverError::Singular`] when the factorization cannot be
/// inverted, and with [`SolverError::Numeric`] when the solution contains
/// non-finite entries (an ill-conditioned system that slipped through LU).
pub fn solve_dense(a: DMatrix<f64>, b: &DVector<f64>) -> SolverResult<DVector<f64>> {
    if !a.is_square() || a.nrows() != b.len() {
        return Err(SolverError::InvalidArg {
            what: "matrix must be square and match the right-hand side",
        });
    }
    let n = a.nrows();
    let x = a.lu().solve(b).ok_or_else(|| SolverError::Singular {
        what: format!("{n}x{n} system"),
    })?;
    for v in x.iter() {
        ensure_finite(*v, "linear solve result")?;
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_small_system() {
        let a = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 2.0, 3.0]);
        let b = DVector::from_vec(vec![1.0, 2.0]);
        let x = solve_dense(a.clone(), &b).unwrap();
        let r = a * &x - b;
        assert!(r.norm() < 1e-12);
    }

    #[test]
    fn singular_matrix_is_an_error() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        let b = DVector::from_vec(vec![1.0, 2.0]);
        assert!(matches!(
            solve_dense(a, &b),
            Err(SolverError::Singular { .. })
        ));
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let a = DMatrix::<f64>::identity(3, 3);
        let b = DVector::from_vec(vec![1.0, 2.0]);
        assert!(matches!(
            solve_dense(a, &b),
            Err(SolverError::InvalidArg { .. })
        ));
    }
}
