use super::error::{EstimatorError, Result};
use super::param_guard::ParamGuard;
use crate::Float;

/// A verified hyperparameter set ready for the fitting of an ordinary
/// least-squares regression model
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRegressionValidParams<F> {
    fit_intercept: bool,
    min_samples: Option<usize>,
    rank_tolerance: F,
    verbose: bool,
}

impl<F: Float> LinearRegressionValidParams<F> {
    pub fn fit_intercept(&self) -> bool {
        self.fit_intercept
    }

    pub fn min_samples(&self) -> Option<usize> {
        self.min_samples
    }

    pub fn rank_tolerance(&self) -> F {
        self.rank_tolerance
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Number of samples required to fit `n_features` features: one per
    /// estimated coefficient (intercept included), or the configured
    /// `min_samples` if it is larger.
    pub fn required_samples(&self, n_features: usize) -> usize {
        let structural = n_features + usize::from(self.fit_intercept);
        self.min_samples
            .map_or(structural, |min_samples| min_samples.max(structural))
    }
}

/// A hyper-parameter set during construction
///
/// Configures and minimizes the following objective function:
/// ```ignore
/// ||y - Xw - b||^2_2
/// ```
/// where `b` is the intercept, fixed at `0` when `fit_intercept` is disabled.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRegressionParams<F>(LinearRegressionValidParams<F>);

impl<F: Float> Default for LinearRegressionParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Configure and fit an ordinary least-squares model
impl<F: Float> LinearRegressionParams<F> {
    /// Create default linear regression hyper parameters
    pub fn new() -> LinearRegressionParams<F> {
        Self(LinearRegressionValidParams {
            fit_intercept: true,
            min_samples: None,
            rank_tolerance: F::cast(1e-10),
            verbose: false,
        })
    }

    /// Whether an intercept is estimated alongside the coefficients.
    ///
    /// Defaults to `true` if not set.
    pub fn fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.0.fit_intercept = fit_intercept;
        self
    }

    /// Set the minimum number of samples accepted by `fit`. It can only raise
    /// the structural minimum of one sample per estimated coefficient.
    ///
    /// Defaults to `None` (structural minimum) if not set.
    pub fn min_samples(mut self, min_samples: usize) -> Self {
        self.0.min_samples = Some(min_samples);
        self
    }

    /// Set the relative threshold under which a diagonal entry of the QR
    /// factor is considered zero, making the design rank deficient.
    ///
    /// Each column of the design matrix is scaled to a largest absolute entry
    /// of `1` before factoring, so the threshold compares column directions and
    /// not their units: a feature measured in 1e-200 is as well conditioned as
    /// the same feature measured in 1.
    ///
    /// Defaults to `1e-10` if not set.
    pub fn rank_tolerance(mut self, rank_tolerance: F) -> Self {
        self.0.rank_tolerance = rank_tolerance;
        self
    }

    /// Logs the fit summary at `info` level instead of `debug`.
    ///
    /// Defaults to `false` if not set.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.0.verbose = verbose;
        self
    }
}

impl<F: Float> ParamGuard for LinearRegressionParams<F> {
    type Checked = LinearRegressionValidParams<F>;
    type Error = EstimatorError;

    /// Validate the hyper parameters
    fn check_ref(&self) -> Result<&Self::Checked> {
        let tolerance = self.0.rank_tolerance;
        if !tolerance.is_finite() || tolerance < F::zero() || tolerance >= F::one() {
            Err(EstimatorError::InvalidTolerance(
                tolerance.to_f32().unwrap_or(f32::NAN),
            ))
        } else if self.0.min_samples == Some(0) {
            Err(EstimatorError::InvalidMinSamples(0))
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}
