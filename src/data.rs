//! Caller-owned fit inputs: measurement data and the free-parameter mask.

use ndarray::Array1;

use crate::error::{FitError, Result};

/// A set of measurements to fit against: x-values, y-values, and the
/// one-sigma uncertainty of each y-value.
///
/// The three arrays are parallel and must have equal, nonzero length. The
/// uncertainties are expected to be strictly positive; this is deliberately
/// not enforced here — the linear fitter rejects zero uncertainties with
/// [`FitError::ZeroUncertainty`](crate::FitError::ZeroUncertainty) before
/// touching the data, while the nonlinear fitter trusts the caller.
#[derive(Debug, Clone)]
pub struct FitData {
    x: Array1<f64>,
    y: Array1<f64>,
    sigma: Array1<f64>,
}

impl FitData {
    /// Create a data set from parallel x, y, and sigma arrays.
    pub fn new(x: Array1<f64>, y: Array1<f64>, sigma: Array1<f64>) -> Result<Self> {
        if x.len() != y.len() || x.len() != sigma.len() {
            return Err(FitError::DimensionMismatch(format!(
                "x, y and sigma must have equal length, got {}, {}, {}",
                x.len(),
                y.len(),
                sigma.len()
            )));
        }
        if x.is_empty() {
            return Err(FitError::InvalidInput(
                "data set must contain at least one point".to_string(),
            ));
        }
        Ok(Self { x, y, sigma })
    }

    /// Number of data points.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// A constructed data set is never empty, but clippy likes the pair.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// The x-values.
    pub fn x(&self) -> &Array1<f64> {
        &self.x
    }

    /// The y-values.
    pub fn y(&self) -> &Array1<f64> {
        &self.y
    }

    /// The y-uncertainties.
    pub fn sigma(&self) -> &Array1<f64> {
        &self.sigma
    }

    /// Reject data sets containing a zero uncertainty.
    pub(crate) fn check_uncertainties(&self) -> Result<()> {
        if self.sigma.iter().any(|s| *s == 0.0) {
            return Err(FitError::ZeroUncertainty);
        }
        Ok(())
    }
}

/// Per-coefficient fixed/free flags: `true` means the coefficient is varied
/// by the fit, `false` means it is held at its current value.
///
/// The mask is immutable for the duration of a fit. Rows and columns of the
/// returned covariance matrix that correspond to fixed coefficients are
/// exactly zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeMask(Vec<bool>);

impl FreeMask {
    /// Create a mask from explicit flags.
    pub fn new(flags: Vec<bool>) -> Self {
        Self(flags)
    }

    /// A mask that lets every one of `n` coefficients vary.
    pub fn all_free(n: usize) -> Self {
        Self(vec![true; n])
    }

    /// Total number of coefficients covered by the mask.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the mask covers zero coefficients.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether coefficient `i` is varied by the fit.
    pub fn is_free(&self, i: usize) -> bool {
        self.0[i]
    }

    /// Number of coefficients the fit is allowed to adjust.
    pub fn free_count(&self) -> usize {
        self.0.iter().filter(|f| **f).count()
    }
}

impl From<Vec<bool>> for FreeMask {
    fn from(flags: Vec<bool>) -> Self {
        Self::new(flags)
    }
}
