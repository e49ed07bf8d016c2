//! Polynomial basis for linear least-squares fitting.

use ndarray::Array1;

use crate::error::{FitError, Result};
use crate::model::BasisSet;

/// The power basis: `basis_i(x) = x^i` for `i = 0 .. terms`.
///
/// Fitting against this basis with the linear fitter recovers the
/// coefficients of the polynomial
/// `y(x) = c[0] + c[1]*x + ... + c[terms-1]*x^(terms-1)`.
#[derive(Debug, Clone, Copy)]
pub struct PolynomialBasis {
    terms: usize,
}

impl PolynomialBasis {
    /// A basis with `terms` functions, i.e. a polynomial of degree
    /// `terms - 1`.
    pub fn new(terms: usize) -> Self {
        Self { terms }
    }

    /// Number of basis functions.
    pub fn terms(&self) -> usize {
        self.terms
    }
}

impl BasisSet for PolynomialBasis {
    fn eval(&self, x: f64, basis: &mut Array1<f64>) -> Result<()> {
        if basis.len() != self.terms {
            return Err(FitError::DimensionMismatch(format!(
                "basis buffer has length {}, expected {}",
                basis.len(),
                self.terms
            )));
        }
        if self.terms == 0 {
            return Ok(());
        }
        basis[0] = 1.0;
        for i in 1..self.terms {
            basis[i] = basis[i - 1] * x;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    #[test]
    fn test_powers_of_x() {
        let basis = PolynomialBasis::new(4);
        let mut out = Array1::zeros(4);
        basis.eval(2.0, &mut out).unwrap();
        assert_eq!(out, array![1.0, 2.0, 4.0, 8.0]);
    }

    #[test]
    fn test_buffer_length_checked() {
        let basis = PolynomialBasis::new(3);
        let mut out = Array1::zeros(2);
        assert!(matches!(
            basis.eval(1.0, &mut out),
            Err(FitError::DimensionMismatch(_))
        ));
    }
}
