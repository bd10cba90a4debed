use ndarray::ArrayView2;

mod impl_datasets;
mod impl_design_matrix;
mod impl_targets;


/// A dataset pairs a design matrix (one row per sample, one column per
/// feature) with the targets the estimator is fitted against.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetBase<DM, T>
where
    DM: DesignMatrix,
{
    pub design_matrix: DM,
    pub targets: T,
}

/// The design matrix of a regression problem, without the constant column
/// used for the intercept.
pub trait DesignMatrix: Sized {
    type Elem;

    fn n_samples(&self) -> usize;
    fn n_features(&self) -> usize;

    /// Dense row-major view of the matrix.
    fn as_dense(&self) -> ArrayView2<Self::Elem>;
}

/// Single-task regression targets.
pub trait Targets: Sized {
    type Elem;

    fn n_samples(&self) -> usize;
}
