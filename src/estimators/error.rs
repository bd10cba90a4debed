use ndarray_stats::errors::MultiInputError;
use thiserror::Error;

use crate::helpers::linalg::LinalgError;

/// Simplified `Result` using [`EstimatorError`] as error type
pub type Result<T> = std::result::Result<T, EstimatorError>;

/// Error variants from hyperparameter construction, model estimation or
/// prediction
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimatorError {
    #[error("invalid rank tolerance {0}")]
    InvalidTolerance(f32),
    #[error("invalid minimum number of samples {0}")]
    InvalidMinSamples(usize),
    /// The input has not enough samples
    #[error("insufficient data: {n_samples} samples provided, at least {required} required")]
    InsufficientData { n_samples: usize, required: usize },
    /// The least-squares solution is not unique
    #[error("design matrix is rank deficient (numerical rank {rank} < {n_columns} columns)")]
    SingularDesign { rank: usize, n_columns: usize },
    #[error("expected {expected} predictors, got {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("design matrix has {n_samples} samples but {n_targets} targets were provided")]
    TargetLengthMismatch { n_samples: usize, n_targets: usize },
    /// NaN or infinite value in the predictors or targets
    #[error("non-finite value in {context} at row {row}")]
    InvalidInput { context: &'static str, row: usize },
    #[error(transparent)]
    Metrics(#[from] MultiInputError),
}

impl From<LinalgError> for EstimatorError {
    fn from(err: LinalgError) -> Self {
        match err {
            LinalgError::RankDeficient { rank, n_columns } => {
                EstimatorError::SingularDesign { rank, n_columns }
            }
            LinalgError::Underdetermined { n_rows, n_columns } => EstimatorError::InsufficientData {
                n_samples: n_rows,
                required: n_columns,
            },
            LinalgError::DimensionMismatch { expected, found } => {
                EstimatorError::TargetLengthMismatch {
                    n_samples: expected,
                    n_targets: found,
                }
            }
        }
    }
}
