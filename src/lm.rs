//! Levenberg-Marquardt nonlinear least-squares fitting.
//!
//! The algorithm blends Gauss-Newton and steepest-descent steps through a
//! damping factor lambda: the curvature matrix's diagonal is scaled by
//! (1 + lambda) before solving for a coefficient increment, so large lambda
//! means small, conservative steps. An accepted trial (strictly smaller
//! chi-squared) divides lambda by the step factor and adopts the trial
//! state; a rejected one multiplies lambda and leaves the baseline alone.
//!
//! Iteration state lives in an explicit [`LmSession`] that the caller steps
//! until satisfied, then consumes with [`LmSession::finalize`] to obtain the
//! covariance. [`LevenbergMarquardt`] wraps that loop with a stock
//! convergence criterion for callers who don't need step-level control.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::covar;
use crate::data::{FitData, FreeMask};
use crate::error::{FitError, Result};
use crate::model::CurveModel;
use crate::solver::{gauss_jordan, invert, SolveStatus};

/// Configuration options for the Levenberg-Marquardt algorithm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LmConfig {
    /// Maximum number of iterations for the driving loop. Default: 100
    pub max_iterations: usize,

    /// Relative chi-squared improvement below which an accepted step counts
    /// as negligible; two in a row stop the driving loop. Default: 1e-8
    pub ftol: f64,

    /// Initial value for the damping parameter. Default: 1e-3
    pub initial_lambda: f64,

    /// Factor by which to increase/decrease lambda. Default: 10.0
    pub lambda_factor: f64,

    /// Lambda above which the driving loop gives up on a stalled fit.
    /// Default: 1e10
    pub max_lambda: f64,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            ftol: 1e-8,
            initial_lambda: 1e-3,
            lambda_factor: 10.0,
            max_lambda: 1e10,
        }
    }
}

/// Result of one [`LmSession::step`].
#[derive(Debug, Clone, Copy)]
pub struct StepOutcome {
    /// Whether the trial strictly improved chi-squared and was adopted.
    pub accepted: bool,
    /// Chi-squared of the trial coefficients (the new baseline if accepted).
    pub chisq: f64,
    /// Conditioning of the damped linear solve.
    pub solve: SolveStatus,
}

/// Result of a finished Levenberg-Marquardt fit.
#[derive(Debug, Clone)]
pub struct LmFit {
    /// Best coefficients found.
    pub coefficients: Array1<f64>,
    /// Covariance of the coefficients (inverse of the undamped curvature
    /// matrix), in full coefficient indexing; fixed coefficients' rows and
    /// columns are exactly zero.
    pub covariance: Array2<f64>,
    /// Curvature matrix at the best coefficients, in full coefficient
    /// indexing.
    pub curvature: Array2<f64>,
    /// Chi-squared at the best coefficients.
    pub chisq: f64,
    /// Conditioning of the covariance inversion.
    pub solve: SolveStatus,
    /// Number of steps taken.
    pub iterations: usize,
    /// Whether the driving loop's convergence criterion was met. Always
    /// `false` for hand-driven sessions, which apply their own criterion.
    pub converged: bool,
}

/// A resumable Levenberg-Marquardt fitting session.
///
/// Construction evaluates the curvature matrix and chi-squared at the
/// initial coefficients and arms the damping factor. Each [`step`] solves
/// the damped system, trials the increment, and accepts or rejects it; the
/// caller inspects [`chisq`]/[`lambda`] between steps and decides when to
/// [`finalize`]. Finalization consumes the session, so no further steps are
/// possible afterwards.
///
/// Independent sessions share nothing; concurrent fits over disjoint
/// sessions are sound.
///
/// [`step`]: LmSession::step
/// [`chisq`]: LmSession::chisq
/// [`lambda`]: LmSession::lambda
/// [`finalize`]: LmSession::finalize
pub struct LmSession<'a, M: CurveModel + ?Sized> {
    data: &'a FitData,
    model: &'a M,
    mask: &'a FreeMask,
    coeffs: Array1<f64>,
    lambda: f64,
    lambda_factor: f64,
    chisq: f64,
    /// Packed curvature matrix at the current best coefficients.
    alpha: Array2<f64>,
    /// Packed chi-squared gradient at the current best coefficients.
    beta: Array1<f64>,
    mfit: usize,
    iterations: usize,
}

impl<'a, M: CurveModel + ?Sized> LmSession<'a, M> {
    /// Start a session at `initial` coefficients.
    pub fn new(
        data: &'a FitData,
        model: &'a M,
        mask: &'a FreeMask,
        initial: Array1<f64>,
        config: &LmConfig,
    ) -> Result<Self> {
        if mask.len() != initial.len() {
            return Err(FitError::DimensionMismatch(format!(
                "mask covers {} coefficients, expected {}",
                mask.len(),
                initial.len()
            )));
        }
        let mfit = mask.free_count();
        let mut session = Self {
            data,
            model,
            mask,
            coeffs: initial,
            lambda: config.initial_lambda,
            lambda_factor: config.lambda_factor,
            chisq: 0.0,
            alpha: Array2::zeros((mfit, mfit)),
            beta: Array1::zeros(mfit),
            mfit,
            iterations: 0,
        };
        let (alpha, beta, chisq) = session.curvature(&session.coeffs)?;
        session.alpha = alpha;
        session.beta = beta;
        session.chisq = chisq;
        Ok(session)
    }

    /// Chi-squared at the current best coefficients.
    pub fn chisq(&self) -> f64 {
        self.chisq
    }

    /// Current damping factor.
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Current best coefficients.
    pub fn coefficients(&self) -> &Array1<f64> {
        &self.coeffs
    }

    /// Number of steps taken so far.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Number of free coefficients.
    pub fn free_count(&self) -> usize {
        self.mfit
    }

    /// Take one damped Gauss-Newton step.
    ///
    /// Solves `(alpha with diagonal * (1 + lambda)) * delta = beta` for the
    /// packed coefficient increment, trials it, and re-evaluates the model
    /// there. A strictly smaller chi-squared adopts the trial coefficients
    /// and curvature and divides lambda by the step factor; otherwise lambda
    /// is multiplied and the baseline is left unchanged. With zero free
    /// coefficients a step is a rejected no-op.
    pub fn step(&mut self) -> Result<StepOutcome> {
        if self.mfit == 0 {
            return Ok(StepOutcome {
                accepted: false,
                chisq: self.chisq,
                solve: SolveStatus::WellConditioned,
            });
        }
        self.iterations += 1;

        let mut damped = self.alpha.clone();
        for j in 0..self.mfit {
            damped[[j, j]] *= 1.0 + self.lambda;
        }
        let mut rhs = Array2::zeros((self.mfit, 1));
        for j in 0..self.mfit {
            rhs[[j, 0]] = self.beta[j];
        }

        let solve = gauss_jordan(&mut damped, &mut rhs)?;

        let mut trial = self.coeffs.clone();
        let mut j = 0;
        for i in 0..trial.len() {
            if self.mask.is_free(i) {
                trial[i] += rhs[[j, 0]];
                j += 1;
            }
        }

        let (trial_alpha, trial_beta, trial_chisq) = self.curvature(&trial)?;

        let accepted = trial_chisq < self.chisq;
        if accepted {
            self.lambda /= self.lambda_factor;
            self.chisq = trial_chisq;
            self.alpha = trial_alpha;
            self.beta = trial_beta;
            self.coeffs = trial;
        } else {
            self.lambda *= self.lambda_factor;
        }

        Ok(StepOutcome {
            accepted,
            chisq: trial_chisq,
            solve,
        })
    }

    /// Finish the session: compute the covariance by inverting the undamped
    /// curvature matrix (no new model evaluation) and expand both matrices
    /// to full coefficient indexing.
    pub fn finalize(self) -> Result<LmFit> {
        let n = self.coeffs.len();
        let mut covariance = Array2::zeros((n, n));
        let mut curvature = Array2::zeros((n, n));
        let mut solve = SolveStatus::WellConditioned;

        if self.mfit > 0 {
            let mut packed = self.alpha.clone();
            solve = invert(&mut packed)?;
            for i in 0..self.mfit {
                for j in 0..self.mfit {
                    covariance[[i, j]] = packed[[i, j]];
                    curvature[[i, j]] = self.alpha[[i, j]];
                }
            }
            covar::expand(&mut covariance, self.mask)?;
            covar::expand(&mut curvature, self.mask)?;
        }

        Ok(LmFit {
            coefficients: self.coeffs,
            covariance,
            curvature,
            chisq: self.chisq,
            solve,
            iterations: self.iterations,
            converged: false,
        })
    }

    /// Evaluate the packed curvature matrix, packed gradient, and
    /// chi-squared at `coeffs`, calling the model once per data point.
    fn curvature(&self, coeffs: &Array1<f64>) -> Result<(Array2<f64>, Array1<f64>, f64)> {
        let n = coeffs.len();
        let mut alpha = Array2::zeros((self.mfit, self.mfit));
        let mut beta = Array1::zeros(self.mfit);
        let mut dyda = Array1::zeros(n);
        let mut chisq = 0.0;

        for k in 0..self.data.len() {
            let ymod = self.model.eval(self.data.x()[k], coeffs, &mut dyda)?;
            let sig2i = 1.0 / (self.data.sigma()[k] * self.data.sigma()[k]);
            let dy = self.data.y()[k] - ymod;

            let mut j = 0;
            for i in 0..n {
                if !self.mask.is_free(i) {
                    continue;
                }
                let wt = dyda[i] * sig2i;
                // Upper triangle in packed order; mirrored below.
                let mut l = 0;
                for m in 0..=i {
                    if self.mask.is_free(m) {
                        let t = wt * dyda[m];
                        alpha[[j, l]] += t;
                        l += 1;
                    }
                }
                let t = dy * wt;
                beta[j] += t;
                j += 1;
            }
            chisq += dy * dy * sig2i;
        }
        for j in 1..self.mfit {
            for l in 0..j {
                alpha[[l, j]] = alpha[[j, l]];
            }
        }

        Ok((alpha, beta, chisq))
    }
}

/// The Levenberg-Marquardt optimizer: a configured driving loop over
/// [`LmSession`].
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create an optimizer with the given configuration.
    pub fn new(config: LmConfig) -> Self {
        Self { config }
    }

    /// Create an optimizer with default configuration.
    pub fn with_default_config() -> Self {
        Self {
            config: LmConfig::default(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Fit `initial` to the data, stepping a session until the relative
    /// chi-squared improvement of accepted steps drops below `ftol` twice in
    /// a row, `max_iterations` is reached, or lambda exceeds `max_lambda`
    /// (stall). A mask with zero free coefficients returns a no-op fit with
    /// the coefficients untouched and zero matrices.
    pub fn fit<M: CurveModel + ?Sized>(
        &self,
        data: &FitData,
        model: &M,
        initial: Array1<f64>,
        mask: &FreeMask,
    ) -> Result<LmFit> {
        let mut session = LmSession::new(data, model, mask, initial, &self.config)?;
        if session.free_count() == 0 {
            return session.finalize();
        }

        let mut negligible = 0;
        while session.iterations() < self.config.max_iterations && negligible < 2 {
            let before = session.chisq();
            let outcome = session.step()?;
            if outcome.accepted {
                let improvement = (before - outcome.chisq) / before.max(f64::MIN_POSITIVE);
                if improvement < self.config.ftol {
                    negligible += 1;
                } else {
                    negligible = 0;
                }
            } else if session.lambda() > self.config.max_lambda {
                break;
            }
        }

        let converged = negligible >= 2;
        let mut fit = session.finalize()?;
        fit.converged = converged;
        Ok(fit)
    }
}
