use std::cell::Cell;
use std::sync::Arc;

use approx::assert_abs_diff_eq;
use ndarray::array;

use super::*;
use crate::helpers::test_helpers::{assert_array_all_close, generate_sensor_readings};

fn historical_rows() -> Vec<TrainingRow> {
    vec![
        TrainingRow::new(98., 27., 40., 1.02),
        TrainingRow::new(100., 30., 45., 1.05),
        TrainingRow::new(95., 25., 35., 0.98),
        TrainingRow::new(105., 35., 50., 1.10),
        TrainingRow::new(90., 20., 30., 0.93),
    ]
}

/// Noiseless rows following `2 raw - 0.5 temp + 0.1 humidity + 3`.
fn exact_rows(n_rows: usize) -> Vec<TrainingRow> {
    (0..n_rows)
        .map(|i| {
            let raw = 80. + i as f64 * 4.1 + ((i * i) % 7) as f64;
            let temp = 15. + ((i * 7) % 30) as f64;
            let humidity = ((i * 37) % 100) as f64;
            TrainingRow::new(raw, temp, humidity, 2. * raw - 0.5 * temp + 0.1 * humidity + 3.)
        })
        .collect()
}

#[test]
fn recovers_exact_linear_relationship() {
    let fitted = CalibrationModel::new().fit(&exact_rows(10)).unwrap();

    assert_array_all_close(fitted.coefficients(), array![2., -0.5, 0.1].view(), 1e-6);
    assert_abs_diff_eq!(fitted.intercept(), 3., epsilon = 1e-6);
    assert_eq!(fitted.n_training_rows(), 10);
}

#[test]
fn fit_is_independent_of_measurement_scale() {
    for &scale in &[1e200, 1e-200] {
        let rows: Vec<TrainingRow> = exact_rows(10)
            .into_iter()
            .map(|row| {
                TrainingRow::new(
                    row.raw_value * scale,
                    row.ambient_temp * scale,
                    row.humidity * scale,
                    row.calibration_factor * scale,
                )
            })
            .collect();
        let fitted = CalibrationModel::new().fit(&rows).unwrap();

        assert_array_all_close(fitted.coefficients(), array![2., -0.5, 0.1].view(), 1e-6);
        assert_abs_diff_eq!(fitted.intercept() / scale, 3., epsilon = 1e-6);
    }
}

#[test]
fn fitting_twice_gives_identical_models() {
    let rows = historical_rows();
    let model = CalibrationModel::new();
    assert_eq!(model.fit(&rows).unwrap(), model.fit(&rows).unwrap());
}

#[test]
fn interpolates_near_historical_reading() {
    let fitted = CalibrationModel::new().fit(&historical_rows()).unwrap();
    let prediction = fitted
        .predict(InputObservation::new(98.5, 27.0, 40.0))
        .unwrap();
    assert!(
        (1.02..=1.03).contains(&prediction),
        "prediction {} outside the historical neighbourhood",
        prediction
    );
}

#[test]
fn prediction_is_the_affine_combination() {
    let fitted = CalibrationModel::new().fit(&historical_rows()).unwrap();
    let observation = InputObservation::new(112.3, 41.0, 87.5);

    let coefficients = fitted.coefficients();
    let expected = coefficients[0] * observation.raw_value()
        + coefficients[1] * observation.ambient_temp()
        + coefficients[2] * observation.humidity()
        + fitted.intercept();
    assert_abs_diff_eq!(fitted.predict(observation).unwrap(), expected, epsilon = 1e-12);
}

#[test]
fn batch_agrees_with_single_predictions() {
    let rows = historical_rows();
    let fitted = CalibrationModel::new().fit(&rows).unwrap();

    let batch = fitted.predict_batch(&rows).unwrap();
    assert_eq!(batch.len(), rows.len());
    for (row, &predicted) in rows.iter().zip(batch.iter()) {
        assert_eq!(predicted, fitted.predict(row.predictors()).unwrap());
        assert_eq!(
            fitted.predict_batch(std::slice::from_ref(row)).unwrap()[0],
            fitted.predict(row.observation()).unwrap()
        );
    }
}

#[test]
fn batch_preserves_input_order() {
    let X = generate_sensor_readings(12, 3);
    let rows: Vec<TrainingRow> = X
        .rows()
        .into_iter()
        .enumerate()
        .map(|(i, x)| TrainingRow::new(x[0], x[1], x[2], 0.9 + 0.01 * i as f64))
        .collect();
    let fitted = CalibrationModel::new().fit(&rows).unwrap();
    let predictions = fitted.predict_batch(&rows).unwrap();

    let permutation = [7, 2, 11, 0, 5, 9, 1, 10, 3, 8, 6, 4];
    let permuted: Vec<TrainingRow> = permutation.iter().map(|&i| rows[i]).collect();
    let permuted_predictions = fitted.predict_batch(&permuted).unwrap();

    assert_eq!(permuted_predictions.len(), permutation.len());
    for (k, &i) in permutation.iter().enumerate() {
        assert_eq!(permuted_predictions[k], predictions[i]);
    }
}

#[test]
fn empty_or_short_training_sets_are_insufficient() {
    let model = CalibrationModel::new();
    assert_eq!(
        model.fit(&[]),
        Err(EstimatorError::InsufficientData {
            n_samples: 0,
            required: 4
        })
    );
    assert_eq!(
        model.fit(&historical_rows()[..3]),
        Err(EstimatorError::InsufficientData {
            n_samples: 3,
            required: 4
        })
    );
}

#[test]
fn duplicated_rows_are_valid_training_data() {
    let mut rows = historical_rows();
    rows.extend(historical_rows());
    let doubled = CalibrationModel::new().fit(&rows).unwrap();
    let single = CalibrationModel::new().fit(&historical_rows()).unwrap();

    assert_array_all_close(doubled.coefficients(), single.coefficients(), 1e-8);
    assert_abs_diff_eq!(doubled.intercept(), single.intercept(), epsilon = 1e-8);
}

#[test]
fn collinear_readings_are_rejected() {
    // Humidity tracks the ambient temperature exactly.
    let rows: Vec<TrainingRow> = (0..6)
        .map(|i| {
            let temp = 20. + 3. * i as f64;
            TrainingRow::new(90. + (i * i) as f64, temp, 2. * temp + 5., 1.)
        })
        .collect();
    assert!(matches!(
        CalibrationModel::new().fit(&rows),
        Err(EstimatorError::SingularDesign { n_columns: 4, .. })
    ));
}

#[test]
fn non_finite_training_rows_are_rejected() {
    let mut rows = historical_rows();
    rows[2].humidity = f64::NAN;
    assert_eq!(
        CalibrationModel::new().fit(&rows),
        Err(EstimatorError::InvalidInput {
            context: "design matrix",
            row: 2
        })
    );

    let mut rows = historical_rows();
    rows[4].calibration_factor = f64::INFINITY;
    assert_eq!(
        CalibrationModel::new().fit(&rows),
        Err(EstimatorError::InvalidInput {
            context: "targets",
            row: 4
        })
    );
}

#[test]
fn observations_must_have_three_values() {
    let fitted = CalibrationModel::new().fit(&historical_rows()).unwrap();

    assert_eq!(
        fitted.predict([98.5, 27.0]),
        Err(EstimatorError::DimensionMismatch {
            expected: 3,
            found: 2
        })
    );
    assert_eq!(
        fitted.predict(vec![98.5, 27.0, 40.0, 1.0]),
        Err(EstimatorError::DimensionMismatch {
            expected: 3,
            found: 4
        })
    );
    assert_eq!(
        InputObservation::try_from(&[1., 2.][..]),
        Err(EstimatorError::DimensionMismatch {
            expected: 3,
            found: 2
        })
    );
}

#[test]
fn non_finite_observations_are_rejected() {
    let fitted = CalibrationModel::new().fit(&historical_rows()).unwrap();
    assert_eq!(
        fitted.predict([98.5, f64::NAN, 40.0]),
        Err(EstimatorError::InvalidInput {
            context: "observation",
            row: 0
        })
    );

    let mut rows = historical_rows();
    rows[3].raw_value = f64::INFINITY;
    assert_eq!(
        fitted.predict_batch(&rows),
        Err(EstimatorError::InvalidInput {
            context: "observation",
            row: 3
        })
    );
}

#[test]
fn out_of_range_observations_are_still_predicted() {
    let fitted = CalibrationModel::new().fit(&historical_rows()).unwrap();
    let observation = InputObservation::new(150., -10., 120.);
    assert!(!observation.within_physical_ranges());
    assert!(fitted.predict(observation).unwrap().is_finite());
    assert!(InputObservation::new(98.5, 27., 40.).within_physical_ranges());
}

#[test]
fn comparison_pairs_targets_with_predictions() {
    let rows = exact_rows(12);
    let fitted = CalibrationModel::new().fit(&rows).unwrap();
    let comparison = fitted.compare(&rows).unwrap();

    let pairs: Vec<(f64, f64)> = comparison.pairs().collect();
    assert_eq!(pairs.len(), rows.len());
    for (row, (actual, predicted)) in rows.iter().zip(pairs) {
        assert_eq!(actual, row.calibration_factor);
        assert_abs_diff_eq!(predicted, actual, epsilon = 1e-8);
    }
    assert_abs_diff_eq!(comparison.summary().r2, 1., epsilon = 1e-10);
    assert!(comparison.summary().max_absolute_error < 1e-8);
    assert_eq!(comparison.predicted(), fitted.predict_batch(&rows).unwrap());
}

#[test]
fn comparison_on_noisy_history() {
    let mut rows = historical_rows();
    rows.push(TrainingRow::new(102., 31., 47., 1.08));
    rows.push(TrainingRow::new(93., 23., 31., 0.95));
    let comparison = CalibrationModel::new()
        .fit(&rows)
        .unwrap()
        .compare(&rows)
        .unwrap();
    let summary = comparison.summary();

    assert_eq!(summary.n_samples, 7);
    assert!(summary.r2 > 0.99 && summary.r2 < 1.);
    assert!(summary.max_absolute_error > 1e-3 && summary.max_absolute_error < 1e-2);
    assert!(summary.root_mean_squared_error >= summary.mean_absolute_error);
    assert!(summary.max_absolute_error >= summary.root_mean_squared_error);
}

#[test]
fn custom_params_are_validated() {
    assert!(CalibrationModel::with_params(LinearRegressionParams::new().min_samples(0)).is_err());

    let model = CalibrationModel::with_params(LinearRegressionParams::new().min_samples(8)).unwrap();
    assert_eq!(
        model.fit(&historical_rows()),
        Err(EstimatorError::InsufficientData {
            n_samples: 5,
            required: 8
        })
    );
    assert!(model.fit(&exact_rows(8)).is_ok());
}

#[test]
fn fitted_models_are_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<FittedModel>();

    let fitted = Arc::new(CalibrationModel::new().fit(&historical_rows()).unwrap());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let fitted = Arc::clone(&fitted);
            std::thread::spawn(move || {
                fitted
                    .predict(InputObservation::new(95. + i as f64, 27., 40.))
                    .unwrap()
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        let expected = fitted
            .predict(InputObservation::new(95. + i as f64, 27., 40.))
            .unwrap();
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn cache_fits_once_per_version() {
    let mut cache = ModelCache::default();
    let loads = Cell::new(0);
    let load = || {
        loads.set(loads.get() + 1);
        historical_rows()
    };

    assert!(cache.current().is_none());
    let first = cache.get_or_fit(1, load).unwrap();
    let second = cache.get_or_fit(1, load).unwrap();
    assert_eq!(loads.get(), 1);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.version(), Some(1));

    let refitted = cache.get_or_fit(2, || exact_rows(10)).unwrap();
    assert!(!Arc::ptr_eq(&first, &refitted));
    assert_eq!(cache.version(), Some(2));
    // Readers holding the previous model are unaffected.
    assert_eq!(first.n_training_rows(), 5);
    assert_eq!(refitted.n_training_rows(), 10);
}

#[test]
fn cache_invalidation_and_failed_refits() {
    let mut cache = ModelCache::new(CalibrationModel::new());
    let fitted = cache.get_or_fit(7, historical_rows).unwrap();

    assert!(cache.get_or_fit(8, Vec::new).is_err());
    assert_eq!(cache.version(), Some(7));
    assert!(Arc::ptr_eq(&cache.current().unwrap(), &fitted));

    cache.invalidate();
    assert!(cache.current().is_none());
    assert_eq!(cache.version(), None);
    let refitted = cache.get_or_fit(7, historical_rows).unwrap();
    assert!(!Arc::ptr_eq(&fitted, &refitted));
    assert_eq!(*fitted, *refitted);
}

#[test]
fn training_rows_from_tuples() {
    let rows: Vec<TrainingRow> = [(98., 27., 40., 1.02), (100., 30., 45., 1.05)]
        .into_iter()
        .map(TrainingRow::from)
        .collect();
    assert_eq!(rows, historical_rows()[..2].to_vec());

    let (X, y) = design_from_rows(&rows);
    assert_eq!(X, array![[98., 27., 40.], [100., 30., 45.]]);
    assert_eq!(y, array![1.02, 1.05]);
}
