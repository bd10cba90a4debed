use log::{debug, info, warn};
use ndarray::{s, Array1, ArrayBase, ArrayView1, ArrayView2, Data, Ix1, Ix2};

use super::error::{EstimatorError, Result};
use super::hyperparams::{LinearRegressionParams, LinearRegressionValidParams};
use super::traits::{Fit, Predict};

use crate::datasets::{DatasetBase, DesignMatrix};
use crate::helpers::helpers::{first_non_finite, first_non_finite_2d, with_intercept_column};
use crate::helpers::linalg::lstsq_qr;
use crate::Float;

/// Ordinary least-squares regression
///
/// The estimator minimizes the residual sum of squares between the targets and
/// the affine prediction `Xw + b`. The problem is solved with a Householder QR
/// factorization of the design matrix, augmented with a constant column when
/// an intercept is fitted. A fitted model is immutable: fitting again yields a
/// new [`LinearRegression`].
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRegression<F> {
    coefficients: Array1<F>,
    intercept: F,
}

impl<F: Float> LinearRegression<F> {
    /// This method instantiates a [`LinearRegression`] estimator with default
    /// parameters.
    pub fn params() -> LinearRegressionParams<F> {
        LinearRegressionParams::new()
    }

    /// This method is a getter for the coefficients vector.
    pub fn coefficients(&self) -> ArrayView1<F> {
        self.coefficients.view()
    }

    pub fn intercept(&self) -> F {
        self.intercept
    }

    /// Number of features the model was fitted on.
    pub fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn check_n_features(&self, found: usize) -> Result<()> {
        if found != self.n_features() {
            return Err(EstimatorError::DimensionMismatch {
                expected: self.n_features(),
                found,
            });
        }
        Ok(())
    }

    fn decision(&self, x: ArrayView1<F>) -> F {
        self.coefficients.dot(&x) + self.intercept
    }
}

/// This implements the QR least-squares procedure for dense design matrices.
impl<F, S, S2> Fit<ArrayBase<S, Ix2>, ArrayBase<S2, Ix1>, EstimatorError>
    for LinearRegressionValidParams<F>
where
    F: 'static + Float,
    S: Data<Elem = F>,
    S2: Data<Elem = F>,
{
    /// If successful, the output of the solver is an instance of
    /// [`LinearRegression`] containing the fitted coefficients and intercept.
    type Object = LinearRegression<F>;

    /// This method fits a [`LinearRegression`] instance to a dataset with a
    /// dense design matrix.
    fn fit(
        &self,
        dataset: &DatasetBase<ArrayBase<S, Ix2>, ArrayBase<S2, Ix1>>,
    ) -> Result<Self::Object> {
        let X = dataset.design_matrix().as_dense();
        let y = dataset.targets().view();
        let (n_samples, n_features) = X.dim();

        if !dataset.is_consistent() {
            return Err(EstimatorError::TargetLengthMismatch {
                n_samples,
                n_targets: y.len(),
            });
        }

        let required = self.required_samples(n_features);
        if n_samples < required {
            return Err(EstimatorError::InsufficientData {
                n_samples,
                required,
            });
        }

        if let Some((row, _)) = first_non_finite_2d(X) {
            return Err(EstimatorError::InvalidInput {
                context: "design matrix",
                row,
            });
        }
        if let Some(row) = first_non_finite(y) {
            return Err(EstimatorError::InvalidInput {
                context: "targets",
                row,
            });
        }

        let solution = if self.fit_intercept() {
            let design = with_intercept_column(X);
            lstsq_qr(design.view(), y, self.rank_tolerance())
        } else {
            lstsq_qr(X, y, self.rank_tolerance())
        };
        let beta = match solution {
            Ok(beta) => beta,
            Err(err) => {
                warn!("least-squares solve failed: {}", err);
                return Err(err.into());
            }
        };

        let model = if self.fit_intercept() {
            LinearRegression {
                coefficients: beta.slice(s![1..]).to_owned(),
                intercept: beta[0],
            }
        } else {
            LinearRegression {
                coefficients: beta,
                intercept: F::zero(),
            }
        };

        if self.verbose() {
            info!(
                "fitted {} coefficients on {} samples, intercept {}",
                n_features, n_samples, model.intercept
            );
        } else {
            debug!(
                "fitted {} coefficients on {} samples, intercept {}",
                n_features, n_samples, model.intercept
            );
        }
        Ok(model)
    }
}

impl<F: 'static + Float> Predict<F, EstimatorError> for LinearRegression<F> {
    fn predict_one(&self, x: ArrayView1<F>) -> Result<F> {
        self.check_n_features(x.len())?;
        if first_non_finite(x).is_some() {
            return Err(EstimatorError::InvalidInput {
                context: "observation",
                row: 0,
            });
        }
        Ok(self.decision(x))
    }

    fn predict(&self, X: ArrayView2<F>) -> Result<Array1<F>> {
        self.check_n_features(X.ncols())?;
        if let Some((row, _)) = first_non_finite_2d(X) {
            return Err(EstimatorError::InvalidInput {
                context: "observation",
                row,
            });
        }
        Ok(X.rows().into_iter().map(|x| self.decision(x)).collect())
    }
}
