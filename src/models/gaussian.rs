//! Gaussian peak model for nonlinear least-squares fitting.

use ndarray::Array1;

use crate::error::{FitError, Result};
use crate::model::CurveModel;

/// A sum of Gaussian peaks with analytic partial derivatives.
///
/// The model is
///
/// `y(x) = sum_k B_k * exp(-((x - E_k) / G_k)^2)`
///
/// with coefficients packed as `[B_1, E_1, G_1, B_2, E_2, G_2, ...]`:
/// height, center, and width of each peak in turn.
#[derive(Debug, Clone, Copy)]
pub struct GaussianSum {
    peaks: usize,
}

impl GaussianSum {
    /// A model with `peaks` Gaussians (`3 * peaks` coefficients).
    pub fn new(peaks: usize) -> Self {
        Self { peaks }
    }

    /// Number of coefficients the model expects.
    pub fn coefficient_count(&self) -> usize {
        3 * self.peaks
    }
}

impl CurveModel for GaussianSum {
    fn eval(&self, x: f64, coeffs: &Array1<f64>, dyda: &mut Array1<f64>) -> Result<f64> {
        let n = self.coefficient_count();
        if coeffs.len() != n || dyda.len() != n {
            return Err(FitError::DimensionMismatch(format!(
                "expected {} coefficients, got {} (gradient buffer {})",
                n,
                coeffs.len(),
                dyda.len()
            )));
        }

        let mut y = 0.0;
        for p in 0..self.peaks {
            let height = coeffs[3 * p];
            let center = coeffs[3 * p + 1];
            let width = coeffs[3 * p + 2];

            let arg = (x - center) / width;
            let ex = (-arg * arg).exp();
            let fac = height * ex * 2.0 * arg;

            y += height * ex;
            dyda[3 * p] = ex;
            dyda[3 * p + 1] = fac / width;
            dyda[3 * p + 2] = fac * arg / width;
        }
        Ok(y)
    }
}
