//! Goodness-of-fit measures comparing historical targets with the predictions
//! of a fitted model.

use ndarray::ArrayView1;
use ndarray_stats::errors::{MultiInputError, ShapeMismatch};
use ndarray_stats::DeviationExt;
use num_traits::Signed;

use crate::estimators::error::Result;
use crate::Float;


/// Coefficient of determination `1 - SS_res / SS_tot`.
///
/// Returns `1` for a perfect fit and can be arbitrarily negative. When the
/// targets are constant `SS_tot` vanishes: the score is `1` if the predictions
/// are exact and `0` otherwise.
pub fn r2_score<F: 'static + Float + Signed>(
    y_true: ArrayView1<F>,
    y_pred: ArrayView1<F>,
) -> Result<F> {
    check_shapes(y_true, y_pred)?;

    let ss_res = y_true.sq_l2_dist(&y_pred)?;
    let mean = y_true.sum() / F::cast(y_true.len());
    let ss_tot = y_true.fold(F::zero(), |acc, &y| acc + (y - mean) * (y - mean));

    if ss_tot == F::zero() {
        return Ok(if ss_res == F::zero() {
            F::one()
        } else {
            F::zero()
        });
    }
    Ok(F::one() - ss_res / ss_tot)
}

/// Summary of the residuals `actual - predicted` over a set of samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidualSummary {
    pub n_samples: usize,
    pub r2: f64,
    pub mean_absolute_error: f64,
    pub root_mean_squared_error: f64,
    pub max_absolute_error: f64,
}

impl ResidualSummary {
    pub fn new<F: 'static + Float + Signed>(
        y_true: ArrayView1<F>,
        y_pred: ArrayView1<F>,
    ) -> Result<Self> {
        check_shapes(y_true, y_pred)?;

        let r2 = r2_score(y_true, y_pred)?;
        let max_absolute_error = y_true.linf_dist(&y_pred)?;
        Ok(ResidualSummary {
            n_samples: y_true.len(),
            r2: r2.to_f64().unwrap_or(f64::NAN),
            mean_absolute_error: y_true.mean_abs_err(&y_pred)?,
            root_mean_squared_error: y_true.root_mean_sq_err(&y_pred)?,
            max_absolute_error: max_absolute_error.to_f64().unwrap_or(f64::NAN),
        })
    }
}

fn check_shapes<F>(y_true: ArrayView1<F>, y_pred: ArrayView1<F>) -> Result<()> {
    if y_true.is_empty() {
        return Err(MultiInputError::EmptyInput.into());
    }
    if y_true.len() != y_pred.len() {
        return Err(MultiInputError::ShapeMismatch(ShapeMismatch {
            first_shape: vec![y_true.len()],
            second_shape: vec![y_pred.len()],
        })
        .into());
    }
    Ok(())
}
