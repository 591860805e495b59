//! Direct dense linear solves.

use nalgebra::{DMatrix, DVector};
use num_complex::Complex;

use crate::error::{Error, Result};

/// Solve `A x = b` by dense LU with full pivoting.
///
/// Invertibility is tested before solving; a singular system reports
/// [`Error::SingularMatrix`] rather than a garbage solution.
pub fn solve_dense(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
    if a.nrows() != a.ncols() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: a.ncols(),
        });
    }
    if a.nrows() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: b.len(),
        });
    }

    let lu = a.clone().full_piv_lu();
    if !lu.is_invertible() {
        return Err(Error::SingularMatrix);
    }
    lu.solve(b).ok_or(Error::SingularMatrix)
}

/// Complex counterpart of [`solve_dense`] for the frequency domain.
pub fn solve_complex(
    a: &DMatrix<Complex<f64>>,
    b: &DVector<Complex<f64>>,
) -> Result<DVector<Complex<f64>>> {
    if a.nrows() != a.ncols() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: a.ncols(),
        });
    }
    if a.nrows() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: b.len(),
        });
    }

    let lu = a.clone().full_piv_lu();
    if !lu.is_invertible() {
        return Err(Error::SingularMatrix);
    }
    lu.solve(b).ok_or(Error::SingularMatrix)
}
