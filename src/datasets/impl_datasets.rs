use super::{DatasetBase, DesignMatrix, Targets};
use crate::Float;
use ndarray::{ArrayBase, Data, Ix1, Ix2};

/// This implementation block provides a method for the creation of datasets
/// from dense matrices.
impl<F: Float, D: Data<Elem = F>, D2: Data<Elem = F>> From<(ArrayBase<D, Ix2>, ArrayBase<D2, Ix1>)>
    for DatasetBase<ArrayBase<D, Ix2>, ArrayBase<D2, Ix1>>
{
    fn from(data: (ArrayBase<D, Ix2>, ArrayBase<D2, Ix1>)) -> Self {
        DatasetBase {
            design_matrix: data.0,
            targets: data.1,
        }
    }
}

/// This implementation block provides methods to get record and target objects
/// from the dataset.
impl<DM: DesignMatrix, T: Targets> DatasetBase<DM, T> {
    /// This method instantiates a new dataset from a design matrix and targets.
    pub fn new(design_matrix: DM, targets: T) -> DatasetBase<DM, T> {
        DatasetBase {
            design_matrix,
            targets,
        }
    }

    /// This method is a getter for the targets.
    pub fn targets(&self) -> &T {
        &self.targets
    }

    /// This method is a getter for the design matrix.
    pub fn design_matrix(&self) -> &DM {
        &self.design_matrix
    }

    pub fn n_samples(&self) -> usize {
        self.design_matrix.n_samples()
    }

    pub fn n_features(&self) -> usize {
        self.design_matrix.n_features()
    }

    /// Whether the design matrix and the targets describe the same samples.
    pub fn is_consistent(&self) -> bool {
        self.design_matrix.n_samples() == self.targets.n_samples()
    }
}
