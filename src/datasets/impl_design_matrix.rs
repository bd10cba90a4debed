use super::DesignMatrix;
use ndarray::{ArrayBase, ArrayView2, Axis, Data, Ix2};

/// This implements the [`DesignMatrix`] trait for dense matrices.
impl<F, S: Data<Elem = F>> DesignMatrix for ArrayBase<S, Ix2> {
    type Elem = F;

    fn n_samples(&self) -> usize {
        self.len_of(Axis(0))
    }

    fn n_features(&self) -> usize {
        self.len_of(Axis(1))
    }

    fn as_dense(&self) -> ArrayView2<F> {
        self.view()
    }
}

/// This implements the [`DesignMatrix`] trait for references.
impl<DM: DesignMatrix> DesignMatrix for &DM {
    type Elem = DM::Elem;

    fn n_samples(&self) -> usize {
        (*self).n_samples()
    }

    fn n_features(&self) -> usize {
        (*self).n_features()
    }

    fn as_dense(&self) -> ArrayView2<Self::Elem> {
        (*self).as_dense()
    }
}
