//! Calibration factor prediction.
//!
//! A [`CalibrationModel`] fits an ordinary least-squares model mapping a raw
//! sensor reading, the ambient temperature and the relative humidity to the
//! calibration factor observed on historical records. The resulting
//! [`FittedModel`] is immutable and can be shared between readers; refitting
//! produces a new one. [`ModelCache`] keeps a single fitted model per dataset
//! version so that callers fit once and predict many times.

use std::ops::RangeInclusive;

use log::debug;
use ndarray::{Array1, Array2, ArrayView1};

use crate::datasets::DatasetBase;
use crate::estimators::error::{EstimatorError, Result};
use crate::estimators::estimators::LinearRegression;
use crate::estimators::hyperparams::LinearRegressionParams;
use crate::estimators::param_guard::ParamGuard;
use crate::estimators::traits::{Fit, Predict};
use crate::metrics::ResidualSummary;

mod cache;

pub use cache::ModelCache;

#[cfg(test)]
mod tests;

/// Number of predictors of a sensor reading.
pub const N_PREDICTORS: usize = 3;

/// Names of the predictors, in the order used by observations and by the
/// fitted coefficients.
pub const PREDICTOR_NAMES: [&str; N_PREDICTORS] = ["raw_value", "ambient_temp", "humidity"];

/// Physical range of the raw sensor value. Input forms are expected to clamp
/// to it; the model itself accepts any finite value.
pub const RAW_VALUE_RANGE: RangeInclusive<f64> = 80.0..=120.0;

/// Physical range of the ambient temperature, in degrees Celsius.
pub const AMBIENT_TEMP_RANGE: RangeInclusive<f64> = 15.0..=45.0;

/// Physical range of the relative humidity, in percent.
pub const HUMIDITY_RANGE: RangeInclusive<f64> = 0.0..=100.0;

/// One historical sensor record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingRow {
    pub raw_value: f64,
    pub ambient_temp: f64,
    pub humidity: f64,
    pub calibration_factor: f64,
}

impl TrainingRow {
    pub fn new(raw_value: f64, ambient_temp: f64, humidity: f64, calibration_factor: f64) -> Self {
        TrainingRow {
            raw_value,
            ambient_temp,
            humidity,
            calibration_factor,
        }
    }

    /// The predictor values, ordered as [`PREDICTOR_NAMES`].
    pub fn predictors(&self) -> [f64; N_PREDICTORS] {
        [self.raw_value, self.ambient_temp, self.humidity]
    }

    pub fn observation(&self) -> InputObservation {
        InputObservation(self.predictors())
    }
}

impl From<(f64, f64, f64, f64)> for TrainingRow {
    fn from(row: (f64, f64, f64, f64)) -> Self {
        TrainingRow::new(row.0, row.1, row.2, row.3)
    }
}

/// The predictor values of a single new reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputObservation([f64; N_PREDICTORS]);

impl InputObservation {
    pub fn new(raw_value: f64, ambient_temp: f64, humidity: f64) -> Self {
        InputObservation([raw_value, ambient_temp, humidity])
    }

    pub fn raw_value(&self) -> f64 {
        self.0[0]
    }

    pub fn ambient_temp(&self) -> f64 {
        self.0[1]
    }

    pub fn humidity(&self) -> f64 {
        self.0[2]
    }

    /// Whether every value lies in its physical range. Informational only:
    /// prediction does not require it.
    pub fn within_physical_ranges(&self) -> bool {
        RAW_VALUE_RANGE.contains(&self.raw_value())
            && AMBIENT_TEMP_RANGE.contains(&self.ambient_temp())
            && HUMIDITY_RANGE.contains(&self.humidity())
    }
}

impl AsRef<[f64]> for InputObservation {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

impl From<[f64; N_PREDICTORS]> for InputObservation {
    fn from(values: [f64; N_PREDICTORS]) -> Self {
        InputObservation(values)
    }
}

impl TryFrom<&[f64]> for InputObservation {
    type Error = EstimatorError;

    fn try_from(values: &[f64]) -> Result<Self> {
        <[f64; N_PREDICTORS]>::try_from(values)
            .map(InputObservation)
            .map_err(|_| EstimatorError::DimensionMismatch {
                expected: N_PREDICTORS,
                found: values.len(),
            })
    }
}

/// Splits rows into a `(n_rows, 3)` design matrix and the target vector.
pub fn design_from_rows(rows: &[TrainingRow]) -> (Array2<f64>, Array1<f64>) {
    let X = Array2::from_shape_fn((rows.len(), N_PREDICTORS), |(i, j)| rows[i].predictors()[j]);
    let y = rows.iter().map(|row| row.calibration_factor).collect();
    (X, y)
}

/// Fits calibration models.
///
/// Fitting requires at least one row per estimated coefficient, i.e. four
/// rows for the three predictors and the intercept, and fails with
/// [`EstimatorError::SingularDesign`] when the predictors are collinear
/// instead of picking one of infinitely many solutions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CalibrationModel {
    params: LinearRegressionParams<f64>,
}

impl CalibrationModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses custom regression hyperparameters, validated up front.
    pub fn with_params(params: LinearRegressionParams<f64>) -> Result<Self> {
        params.check_ref()?;
        Ok(CalibrationModel { params })
    }

    pub fn params(&self) -> &LinearRegressionParams<f64> {
        &self.params
    }

    /// Fits a model on historical rows. Pure: the rows are only read.
    pub fn fit(&self, rows: &[TrainingRow]) -> Result<FittedModel> {
        let (X, y) = design_from_rows(rows);
        let dataset = DatasetBase::new(X, y);
        let regression = self.params.fit(&dataset)?;

        debug!(
            "calibration model fitted on {} rows: coefficients {} intercept {}",
            rows.len(),
            regression.coefficients(),
            regression.intercept()
        );
        Ok(FittedModel {
            regression,
            n_training_rows: rows.len(),
        })
    }
}

/// An immutable calibration model produced by [`CalibrationModel::fit`].
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    regression: LinearRegression<f64>,
    n_training_rows: usize,
}

impl FittedModel {
    /// Coefficients ordered as [`PREDICTOR_NAMES`].
    pub fn coefficients(&self) -> ArrayView1<f64> {
        self.regression.coefficients()
    }

    pub fn intercept(&self) -> f64 {
        self.regression.intercept()
    }

    /// Number of rows the model was fitted on.
    pub fn n_training_rows(&self) -> usize {
        self.n_training_rows
    }

    pub fn regression(&self) -> &LinearRegression<f64> {
        &self.regression
    }

    /// Predicts the calibration factor of one reading. The observation must
    /// hold exactly three finite values; no rounding is applied.
    pub fn predict<O: AsRef<[f64]>>(&self, observation: O) -> Result<f64> {
        self.regression
            .predict_one(ArrayView1::from(observation.as_ref()))
    }

    /// Predicts the calibration factor of every row, in input order. A single
    /// non-finite row fails the whole batch.
    pub fn predict_batch(&self, rows: &[TrainingRow]) -> Result<Array1<f64>> {
        let (X, _) = design_from_rows(rows);
        self.regression.predict(X.view())
    }

    /// Predicts every row and pairs the predictions with the recorded
    /// calibration factors.
    pub fn compare(&self, rows: &[TrainingRow]) -> Result<Comparison> {
        let predicted = self.predict_batch(rows)?;
        let actual: Array1<f64> = rows.iter().map(|row| row.calibration_factor).collect();
        let summary = ResidualSummary::new(actual.view(), predicted.view())?;

        debug!(
            "compared {} rows: r2 {:.4} rmse {:.4}",
            summary.n_samples, summary.r2, summary.root_mean_squared_error
        );
        Ok(Comparison {
            actual,
            predicted,
            summary,
        })
    }
}

/// Historical targets next to the predictions of a fitted model.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    actual: Array1<f64>,
    predicted: Array1<f64>,
    summary: ResidualSummary,
}

impl Comparison {
    pub fn actual(&self) -> ArrayView1<f64> {
        self.actual.view()
    }

    pub fn predicted(&self) -> ArrayView1<f64> {
        self.predicted.view()
    }

    pub fn summary(&self) -> &ResidualSummary {
        &self.summary
    }

    /// `(actual, predicted)` pairs in row order, as plotted on an
    /// actual-vs-predicted scatter chart.
    pub fn pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.actual
            .iter()
            .zip(self.predicted.iter())
            .map(|(&actual, &predicted)| (actual, predicted))
    }
}
