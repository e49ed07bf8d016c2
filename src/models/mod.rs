//! Reference model implementations.
//!
//! These are ready-made implementations of the model traits for common
//! fitting problems: a polynomial basis for the linear fitter and a
//! multi-peak Gaussian for the nonlinear fitter. They double as examples of
//! how to implement [`BasisSet`](crate::BasisSet) and
//! [`CurveModel`](crate::CurveModel) for custom models.

mod gaussian;
mod polynomial;

pub use gaussian::GaussianSum;
pub use polynomial::PolynomialBasis;
