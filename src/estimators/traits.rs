use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::datasets::{DatasetBase, DesignMatrix, Targets};

/// Fit trait
///
/// The fittable trait allows an estimator to be fitted to a dataset (a combination
/// of design matrix and targets). More formally, the model estimates coefficients
/// that minimizes an empirical risk (loss function).
pub trait Fit<DM: DesignMatrix, T: Targets, E: std::error::Error> {
    type Object;

    fn fit(&self, dataset: &DatasetBase<DM, T>) -> Result<Self::Object, E>;
}

/// Predict trait
///
/// Applies a fitted model to new samples laid out like the design matrix it
/// was fitted on.
pub trait Predict<F, E: std::error::Error> {
    /// Predicts the target of a single sample.
    fn predict_one(&self, x: ArrayView1<F>) -> Result<F, E>;

    /// Predicts the targets of every row of `X`, in order. A single invalid
    /// row fails the whole batch.
    fn predict(&self, X: ArrayView2<F>) -> Result<Array1<F>, E>;
}
