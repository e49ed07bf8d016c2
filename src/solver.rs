//! Linear-system solver: Gauss-Jordan elimination with full pivoting.
//!
//! Both fitters reduce their work to a symmetric linear solve. The normal
//! equations of a fit with strongly correlated parameters are frequently
//! close to singular, so the pivot is chosen as the largest-magnitude element
//! anywhere in the unreduced submatrix (full pivoting), not just within the
//! current column.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{FitError, Result};

/// Conditioning verdict of a [`gauss_jordan`] solve.
///
/// A degraded verdict is a warning, not an error: the computation ran to
/// completion and produced a best-effort result, but the caller should treat
/// the inverse (and any covariance derived from it) as unreliable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    /// Every pivot was comfortably above the noise floor.
    WellConditioned,
    /// A pivot fell below the machine-epsilon-relative threshold.
    NearSingular,
    /// A column was selected as pivot more than once, or a pivot was exactly
    /// zero; the matrix is singular to working precision.
    Singular,
}

impl SolveStatus {
    /// Whether the solution can be used without reservation.
    pub fn is_reliable(&self) -> bool {
        matches!(self, SolveStatus::WellConditioned)
    }

    fn rank(self) -> u8 {
        match self {
            SolveStatus::WellConditioned => 0,
            SolveStatus::NearSingular => 1,
            SolveStatus::Singular => 2,
        }
    }

    /// The worse of two verdicts.
    pub fn worst(self, other: SolveStatus) -> SolveStatus {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }
}

/// Solve `a * x = b` for every column of `b`, in place.
///
/// On return `a` has been replaced by its inverse and each column of `b` by
/// the corresponding solution vector. `b` may have zero columns, in which
/// case only the inversion is performed. The only allocations are three
/// length-n bookkeeping vectors; the elimination itself works in the caller's
/// buffers.
///
/// Row swaps made while bringing each pivot to the diagonal are recorded in
/// swap ledgers and undone column-wise, in reverse order, after the last
/// elimination step, so the inverse comes back in the original index order.
pub fn gauss_jordan(a: &mut Array2<f64>, b: &mut Array2<f64>) -> Result<SolveStatus> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(FitError::DimensionMismatch(format!(
            "coefficient matrix must be square, got {}x{}",
            n,
            a.ncols()
        )));
    }
    if b.nrows() != n {
        return Err(FitError::DimensionMismatch(format!(
            "right-hand side has {} rows, expected {}",
            b.nrows(),
            n
        )));
    }
    let m = b.ncols();

    let mut indxr = vec![0usize; n];
    let mut indxc = vec![0usize; n];
    let mut ipiv = vec![0usize; n];

    // Pivot threshold relative to the largest element of the input matrix.
    let scale = a.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let threshold = f64::EPSILON * scale * n as f64;

    let mut status = SolveStatus::WellConditioned;

    for i in 0..n {
        // Full pivot search over all not-yet-pivoted rows and columns.
        let mut big = 0.0_f64;
        let mut irow = 0usize;
        let mut icol = 0usize;
        for j in 0..n {
            if ipiv[j] == 1 {
                continue;
            }
            for k in 0..n {
                if ipiv[k] == 0 {
                    if a[[j, k]].abs() >= big {
                        big = a[[j, k]].abs();
                        irow = j;
                        icol = k;
                    }
                } else if ipiv[k] > 1 {
                    status = status.worst(SolveStatus::Singular);
                }
            }
        }
        ipiv[icol] += 1;

        if irow != icol {
            for l in 0..n {
                a.swap([irow, l], [icol, l]);
            }
            for l in 0..m {
                b.swap([irow, l], [icol, l]);
            }
        }
        indxr[i] = irow;
        indxc[i] = icol;

        let pivot = a[[icol, icol]];
        if pivot == 0.0 {
            status = status.worst(SolveStatus::Singular);
        } else if pivot.abs() < threshold {
            status = status.worst(SolveStatus::NearSingular);
        }
        // A zero pivot would poison the whole output with non-finite values;
        // skipping its reciprocal keeps the result finite, flagged Singular.
        let pivinv = if pivot == 0.0 { 0.0 } else { 1.0 / pivot };

        a[[icol, icol]] = 1.0;
        for l in 0..n {
            a[[icol, l]] *= pivinv;
        }
        for l in 0..m {
            b[[icol, l]] *= pivinv;
        }

        // Eliminate the pivot column from every other row.
        for ll in 0..n {
            if ll == icol {
                continue;
            }
            let dum = a[[ll, icol]];
            a[[ll, icol]] = 0.0;
            for l in 0..n {
                let t = a[[icol, l]] * dum;
                a[[ll, l]] -= t;
            }
            for l in 0..m {
                let t = b[[icol, l]] * dum;
                b[[ll, l]] -= t;
            }
        }
    }

    // Unscramble the column permutations in reverse order of the swaps.
    for l in (0..n).rev() {
        if indxr[l] != indxc[l] {
            for k in 0..n {
                a.swap([k, indxr[l]], [k, indxc[l]]);
            }
        }
    }

    Ok(status)
}

/// Invert `a` in place without a right-hand side.
pub fn invert(a: &mut Array2<f64>) -> Result<SolveStatus> {
    let mut b = Array2::zeros((a.nrows(), 0));
    gauss_jordan(a, &mut b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_solve_2x2() {
        let mut a = array![[2.0, 1.0], [1.0, 3.0]];
        let mut b = array![[3.0], [5.0]];

        let status = gauss_jordan(&mut a, &mut b).unwrap();
        assert_eq!(status, SolveStatus::WellConditioned);

        // x = [4/5, 7/5]
        assert_relative_eq!(b[[0, 0]], 0.8, epsilon = 1e-12);
        assert_relative_eq!(b[[1, 0]], 1.4, epsilon = 1e-12);

        // a is now its own inverse: inv([[2,1],[1,3]]) = [[0.6,-0.2],[-0.2,0.4]]
        assert_relative_eq!(a[[0, 0]], 0.6, epsilon = 1e-12);
        assert_relative_eq!(a[[0, 1]], -0.2, epsilon = 1e-12);
        assert_relative_eq!(a[[1, 0]], -0.2, epsilon = 1e-12);
        assert_relative_eq!(a[[1, 1]], 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_round_trip() {
        let original = array![
            [4.0, -2.0, 1.0],
            [-2.0, 4.0, -2.0],
            [1.0, -2.0, 4.0]
        ];
        let mut a = original.clone();

        let status = invert(&mut a).unwrap();
        assert_eq!(status, SolveStatus::WellConditioned);

        let product = original.dot(&a);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(product[[i, j]], expected, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_multiple_right_hand_sides() {
        let mut a = array![[1.0, 2.0], [3.0, 4.0]];
        let mut b = array![[1.0, 0.0], [0.0, 1.0]];

        gauss_jordan(&mut a, &mut b).unwrap();

        // Solving against the identity reproduces the inverse.
        for i in 0..2 {
            for j in 0..2 {
                assert_relative_eq!(a[[i, j]], b[[i, j]], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_singular_matrix_flagged() {
        // Second row is a multiple of the first.
        let mut a = array![[1.0, 2.0], [2.0, 4.0]];
        let mut b = array![[1.0], [2.0]];

        let status = gauss_jordan(&mut a, &mut b).unwrap();
        assert_eq!(status, SolveStatus::Singular);
        assert!(!status.is_reliable());
        assert!(a.iter().all(|v| v.is_finite()));
        assert!(b.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_dimension_checks() {
        let mut a = Array2::zeros((2, 3));
        let mut b = Array2::zeros((2, 1));
        assert!(matches!(
            gauss_jordan(&mut a, &mut b),
            Err(FitError::DimensionMismatch(_))
        ));

        let mut a = Array2::<f64>::eye(2);
        let mut b = Array2::zeros((3, 1));
        assert!(matches!(
            gauss_jordan(&mut a, &mut b),
            Err(FitError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_status_ordering() {
        assert_eq!(
            SolveStatus::WellConditioned.worst(SolveStatus::NearSingular),
            SolveStatus::NearSingular
        );
        assert_eq!(
            SolveStatus::Singular.worst(SolveStatus::NearSingular),
            SolveStatus::Singular
        );
    }
}
