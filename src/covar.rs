//! Covariance expansion from packed free-parameter indexing to full
//! coefficient indexing.
//!
//! The fitters solve over the free coefficients only, so the covariance and
//! curvature matrices they produce are packed into the leading
//! `free_count x free_count` block. [`expand`] moves those entries out to
//! their true coefficient positions and zero-fills the rows and columns of
//! fixed coefficients, in place.

use ndarray::Array2;

use crate::data::FreeMask;
use crate::error::{FitError, Result};

/// Rewrite `matrix` from packed free-parameter order to full coefficient
/// order.
///
/// `matrix` must be n x n where n is the mask length, with its meaningful
/// values packed into the top-left `mask.free_count()` block. This is an
/// in-place un-compaction via element-wise row and column swaps, walking the
/// coefficient indices from the back; symmetry of the input is preserved.
pub fn expand(matrix: &mut Array2<f64>, mask: &FreeMask) -> Result<()> {
    let n = mask.len();
    if matrix.nrows() != n || matrix.ncols() != n {
        return Err(FitError::DimensionMismatch(format!(
            "matrix is {}x{}, mask covers {} coefficients",
            matrix.nrows(),
            matrix.ncols(),
            n
        )));
    }
    let mfit = mask.free_count();

    // Everything beyond the packed block belongs to fixed coefficients.
    for i in mfit..n {
        for j in 0..=i {
            matrix[[i, j]] = 0.0;
            matrix[[j, i]] = 0.0;
        }
    }

    // Swap each free coefficient's packed row/column out to its true
    // position, highest index first; `k` tracks the next packed slot.
    let mut k = mfit;
    for j in (0..n).rev() {
        if mask.is_free(j) {
            k -= 1;
            if k != j {
                for i in 0..n {
                    matrix.swap([i, k], [i, j]);
                }
                for i in 0..n {
                    matrix.swap([k, i], [j, i]);
                }
            }
        }
    }
    Ok(())
}
