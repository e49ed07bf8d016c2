//! Model capability traits.
//!
//! A fit is parameterized over the model it adjusts: a [`BasisSet`] for
//! models that are linear combinations of fixed basis functions, or a
//! [`CurveModel`] for models that are nonlinear in their coefficients.
//! Both traits have blanket implementations for closures with the matching
//! signature, so a one-off model does not need a named type.

use ndarray::Array1;

use crate::error::Result;

/// A set of basis functions for linear least-squares fitting.
///
/// The model is `y(x) = sum_i coef[i] * basis_i(x)`; an implementation
/// evaluates every basis function at one x-value. The number of basis
/// functions is dictated by the length of the output buffer, which equals
/// the length of the coefficient vector being fitted.
pub trait BasisSet {
    /// Fill `basis` with the basis-function values at `x`.
    fn eval(&self, x: f64, basis: &mut Array1<f64>) -> Result<()>;
}

impl<F> BasisSet for F
where
    F: Fn(f64, &mut Array1<f64>) -> Result<()>,
{
    fn eval(&self, x: f64, basis: &mut Array1<f64>) -> Result<()> {
        self(x, basis)
    }
}

/// A model for nonlinear least-squares fitting.
///
/// An implementation evaluates the predicted y at one x-value for the given
/// coefficients, and fills `dyda` with the partial derivative of the
/// prediction with respect to each coefficient. `dyda` has the same length
/// as `coeffs`; every entry must be written, including those of coefficients
/// the fit holds fixed.
pub trait CurveModel {
    /// Evaluate the model at `x`, returning the predicted y and writing the
    /// coefficient gradient into `dyda`.
    fn eval(&self, x: f64, coeffs: &Array1<f64>, dyda: &mut Array1<f64>) -> Result<f64>;
}

impl<F> CurveModel for F
where
    F: Fn(f64, &Array1<f64>, &mut Array1<f64>) -> Result<f64>,
{
    fn eval(&self, x: f64, coeffs: &Array1<f64>, dyda: &mut Array1<f64>) -> Result<f64> {
        self(x, coeffs, dyda)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array1};

    #[test]
    fn test_closure_as_basis_set() {
        let basis = |x: f64, out: &mut Array1<f64>| -> Result<()> {
            out[0] = 1.0;
            out[1] = x;
            Ok(())
        };

        let mut out = Array1::zeros(2);
        BasisSet::eval(&basis, 3.0, &mut out).unwrap();
        assert_eq!(out, array![1.0, 3.0]);
    }

    #[test]
    fn test_closure_as_curve_model() {
        // y = a * exp(b * x)
        let model = |x: f64, c: &Array1<f64>, dyda: &mut Array1<f64>| -> Result<f64> {
            let e = (c[1] * x).exp();
            dyda[0] = e;
            dyda[1] = c[0] * x * e;
            Ok(c[0] * e)
        };

        let coeffs = array![2.0, 0.5];
        let mut dyda = Array1::zeros(2);
        let y = CurveModel::eval(&model, 1.0, &coeffs, &mut dyda).unwrap();
        assert_relative_eq!(y, 2.0 * 0.5_f64.exp(), epsilon = 1e-12);
        assert_relative_eq!(dyda[0], 0.5_f64.exp(), epsilon = 1e-12);
        assert_relative_eq!(dyda[1], 2.0 * 0.5_f64.exp(), epsilon = 1e-12);
    }
}
