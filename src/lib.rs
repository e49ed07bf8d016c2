//! # curvefit
//!
//! `curvefit` is a chi-squared curve-fitting library: given measurements
//! (x, y, sigma), it determines the coefficients of a user-supplied model
//! that minimize chi-squared and reports their covariance.
//!
//! The library provides:
//! - A generalized linear least-squares fitter for models that are linear
//!   combinations of basis functions, with per-coefficient fixed/free masking
//! - A Levenberg-Marquardt fitter for models nonlinear in their
//!   coefficients, driven step by step through a resumable session
//! - The full-pivot Gauss-Jordan solver both fitters are built on
//!
//! ## Basic Usage
//!
//! ```
//! use curvefit::{linear_fit, FitData, FreeMask};
//! use curvefit::models::PolynomialBasis;
//! use ndarray::array;
//!
//! let data = FitData::new(
//!     array![0.0, 1.0, 2.0, 3.0],
//!     array![1.0, 3.0, 5.0, 7.0],
//!     array![0.1, 0.1, 0.1, 0.1],
//! )?;
//! let mut coeffs = array![0.0, 0.0];
//!
//! let fit = linear_fit(
//!     &data,
//!     &mut coeffs,
//!     &FreeMask::all_free(2),
//!     &PolynomialBasis::new(2),
//! )?;
//! assert!(fit.chisq < 1e-12);
//! # Ok::<(), curvefit::FitError>(())
//! ```

pub mod error;

pub mod covar;
pub mod data;
pub mod linear;
pub mod lm;
pub mod model;
pub mod models;
pub mod solver;

// Re-exports for convenience
pub use error::{FitError, Result};

pub use data::{FitData, FreeMask};
pub use linear::{linear_fit, LinearFit};
pub use lm::{LevenbergMarquardt, LmConfig, LmFit, LmSession, StepOutcome};
pub use model::{BasisSet, CurveModel};
pub use solver::{gauss_jordan, invert, SolveStatus};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
