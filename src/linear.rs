//! Generalized linear least-squares fitting.
//!
//! Fits models of the form `y(x) = sum_i coef[i] * basis_i(x)` by building
//! the normal equations over the free coefficients, solving them with the
//! full-pivot solver, and expanding the resulting covariance back to full
//! coefficient indexing.

use ndarray::{Array1, Array2};

use crate::covar;
use crate::data::{FitData, FreeMask};
use crate::error::{FitError, Result};
use crate::model::BasisSet;
use crate::solver::{gauss_jordan, SolveStatus};

/// Outcome of a linear least-squares fit.
#[derive(Debug, Clone)]
pub struct LinearFit {
    /// Covariance of the fitted coefficients, in full coefficient indexing.
    /// Rows and columns of fixed coefficients are exactly zero.
    pub covariance: Array2<f64>,
    /// Chi-squared of the final coefficients against the data.
    pub chisq: f64,
    /// Conditioning of the normal-equations solve.
    pub solve: SolveStatus,
    /// Number of coefficients that were actually fitted. Zero means the mask
    /// held every coefficient fixed and the fit was a no-op.
    pub free_count: usize,
}

/// Fit `coeffs` to the data by weighted linear least squares.
///
/// Free entries of `coeffs` (per `mask`) are overwritten with the solution;
/// fixed entries keep their values and their contribution is subtracted from
/// the residuals before solving. Chi-squared is recomputed from the final
/// coefficients and the raw data rather than from the linearized system.
///
/// # Errors
///
/// Any zero uncertainty in the data is [`FitError::ZeroUncertainty`] and the
/// coefficients are left unmodified. A mask that frees zero coefficients is
/// not an error: the fit returns with `free_count == 0`, a zero covariance,
/// and chi-squared evaluated at the supplied coefficients.
pub fn linear_fit<M: BasisSet + ?Sized>(
    data: &FitData,
    coeffs: &mut Array1<f64>,
    mask: &FreeMask,
    model: &M,
) -> Result<LinearFit> {
    let n = coeffs.len();
    if mask.len() != n {
        return Err(FitError::DimensionMismatch(format!(
            "mask covers {} coefficients, expected {}",
            mask.len(),
            n
        )));
    }
    data.check_uncertainties()?;

    let mfit = mask.free_count();
    if mfit == 0 {
        // Nothing to fit for; warn-and-return with the inputs untouched.
        let chisq = chi_squared(data, coeffs, model)?;
        return Ok(LinearFit {
            covariance: Array2::zeros((n, n)),
            chisq,
            solve: SolveStatus::WellConditioned,
            free_count: 0,
        });
    }

    // Accumulate the packed normal equations over the free coefficients.
    let mut alpha = Array2::zeros((mfit, mfit));
    let mut beta = Array2::zeros((mfit, 1));
    let mut basis = Array1::zeros(n);

    for k in 0..data.len() {
        model.eval(data.x()[k], &mut basis)?;

        // Residual with the fixed coefficients' contribution pre-subtracted.
        let mut ym = data.y()[k];
        if mfit < n {
            for i in 0..n {
                if !mask.is_free(i) {
                    ym -= coeffs[i] * basis[i];
                }
            }
        }

        let sig2i = 1.0 / (data.sigma()[k] * data.sigma()[k]);
        let mut j = 0;
        for i in 0..n {
            if !mask.is_free(i) {
                continue;
            }
            let wt = basis[i] * sig2i;
            // Upper triangle in packed order; mirrored below.
            let mut l = 0;
            for m in 0..=i {
                if mask.is_free(m) {
                    let t = wt * basis[m];
                    alpha[[j, l]] += t;
                    l += 1;
                }
            }
            let t = ym * wt;
            beta[[j, 0]] += t;
            j += 1;
        }
    }
    for j in 1..mfit {
        for l in 0..j {
            alpha[[l, j]] = alpha[[j, l]];
        }
    }

    let solve = gauss_jordan(&mut alpha, &mut beta)?;

    // Scatter the solution back into the free coefficient slots.
    let mut j = 0;
    for i in 0..n {
        if mask.is_free(i) {
            coeffs[i] = beta[[j, 0]];
            j += 1;
        }
    }

    let chisq = chi_squared(data, coeffs, model)?;

    // The solver left alpha as the inverse of the normal equations, i.e. the
    // packed covariance; expand it to full coefficient indexing.
    let mut covariance = Array2::zeros((n, n));
    for i in 0..mfit {
        for j in 0..mfit {
            covariance[[i, j]] = alpha[[i, j]];
        }
    }
    covar::expand(&mut covariance, mask)?;

    Ok(LinearFit {
        covariance,
        chisq,
        solve,
        free_count: mfit,
    })
}

/// Chi-squared of a basis-function model against the data.
pub fn chi_squared<M: BasisSet + ?Sized>(
    data: &FitData,
    coeffs: &Array1<f64>,
    model: &M,
) -> Result<f64> {
    let mut basis = Array1::zeros(coeffs.len());
    let mut chisq = 0.0;
    for k in 0..data.len() {
        model.eval(data.x()[k], &mut basis)?;
        let prediction: f64 = coeffs.iter().zip(basis.iter()).map(|(c, b)| c * b).sum();
        let r = (data.y()[k] - prediction) / data.sigma()[k];
        chisq += r * r;
    }
    Ok(chisq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PolynomialBasis;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn line_data() -> FitData {
        FitData::new(
            array![0.0, 1.0, 2.0, 3.0],
            array![1.0, 3.0, 5.0, 7.0], // y = 1 + 2x
            array![0.1, 0.1, 0.1, 0.1],
        )
        .unwrap()
    }

    #[test]
    fn test_exact_line_recovery() {
        let data = line_data();
        let mut coeffs = array![0.0, 0.0];
        let basis = PolynomialBasis::new(2);

        let fit = linear_fit(&data, &mut coeffs, &FreeMask::all_free(2), &basis).unwrap();

        assert_relative_eq!(coeffs[0], 1.0, epsilon = 1e-10);
        assert_relative_eq!(coeffs[1], 2.0, epsilon = 1e-10);
        assert!(fit.chisq < 1e-18);
        assert_eq!(fit.solve, SolveStatus::WellConditioned);
        assert_eq!(fit.free_count, 2);
    }

    #[test]
    fn test_fixed_coefficient_held_and_subtracted() {
        let data = line_data();
        // Hold the intercept at its true value; fit only the slope.
        let mut coeffs = array![1.0, 0.0];
        let mask = FreeMask::new(vec![false, true]);
        let basis = PolynomialBasis::new(2);

        let fit = linear_fit(&data, &mut coeffs, &mask, &basis).unwrap();

        assert_eq!(coeffs[0], 1.0);
        assert_relative_eq!(coeffs[1], 2.0, epsilon = 1e-10);
        assert_eq!(fit.free_count, 1);

        // Fixed coefficient's covariance row and column are exactly zero.
        assert_eq!(fit.covariance[[0, 0]], 0.0);
        assert_eq!(fit.covariance[[0, 1]], 0.0);
        assert_eq!(fit.covariance[[1, 0]], 0.0);
        assert!(fit.covariance[[1, 1]] > 0.0);
    }

    #[test]
    fn test_zero_sigma_rejected_without_touching_coeffs() {
        let data = FitData::new(
            array![0.0, 1.0, 2.0],
            array![1.0, 3.0, 5.0],
            array![0.1, 0.0, 0.1],
        )
        .unwrap();
        let mut coeffs = array![7.0, 8.0];
        let basis = PolynomialBasis::new(2);

        let result = linear_fit(&data, &mut coeffs, &FreeMask::all_free(2), &basis);
        assert!(matches!(result, Err(FitError::ZeroUncertainty)));
        assert_eq!(coeffs, array![7.0, 8.0]);
    }

    #[test]
    fn test_no_free_parameters_is_noop() {
        let data = line_data();
        let mut coeffs = array![1.0, 2.0];
        let mask = FreeMask::new(vec![false, false]);
        let basis = PolynomialBasis::new(2);

        let fit = linear_fit(&data, &mut coeffs, &mask, &basis).unwrap();

        assert_eq!(fit.free_count, 0);
        assert_eq!(coeffs, array![1.0, 2.0]);
        assert!(fit.covariance.iter().all(|v| *v == 0.0));
        // Chi-squared is still evaluated at the supplied coefficients.
        assert!(fit.chisq < 1e-18);
    }

    #[test]
    fn test_mask_length_mismatch() {
        let data = line_data();
        let mut coeffs = array![0.0, 0.0];
        let basis = PolynomialBasis::new(2);
        let result = linear_fit(&data, &mut coeffs, &FreeMask::all_free(3), &basis);
        assert!(matches!(result, Err(FitError::DimensionMismatch(_))));
    }
}
