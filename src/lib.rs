#![allow(non_snake_case)]

use ndarray::ScalarOperand;

use num_traits::{AsPrimitive, FromPrimitive, NumAssignOps, NumCast};

use std::cmp::PartialOrd;
use std::fmt;
use std::iter::Sum;
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

/// Float point numbers
///
/// This trait bound multiplexes to the most common assumption of floating point
/// number and implement them for 32bit and 64bit float points.
/// Ref: https://github.com/rust-ml/linfa/blob/master/src/dataset/mod.rs#L36
pub trait Float:
    FromPrimitive
    + num_traits::Float
    + PartialOrd
    + Sync
    + Send
    + Default
    + fmt::Display
    + fmt::Debug
    + Sum
    + NumAssignOps
    + AsPrimitive<usize>
    + for<'a> AddAssign<&'a Self>
    + for<'a> MulAssign<&'a Self>
    + for<'a> SubAssign<&'a Self>
    + for<'a> DivAssign<&'a Self>
    + num_traits::MulAdd<Output = Self>
    + ScalarOperand
    + approx::AbsDiffEq<Epsilon = Self>
{
    /// Conversion used for hyperparameter defaults and literal constants.
    /// Every value cast in this crate is representable in both f32 and f64.
    fn cast<T: NumCast>(x: T) -> Self {
        NumCast::from(x).unwrap()
    }
}

impl Float for f32 {}

impl Float for f64 {}


pub mod calibration;
pub mod datasets;
pub mod estimators;
pub mod helpers;
pub mod metrics;

pub use calibration::{
    CalibrationModel, Comparison, FittedModel, InputObservation, ModelCache, TrainingRow,
};
pub use estimators::error::{EstimatorError, Result};
