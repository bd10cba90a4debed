extern crate sensorcal;

use sensorcal::calibration::{CalibrationModel, InputObservation, ModelCache, TrainingRow};
use sensorcal::EstimatorError;

fn load_history() -> Vec<TrainingRow> {
    [
        (98., 27., 40., 1.02),
        (100., 30., 45., 1.05),
        (95., 25., 35., 0.98),
        (105., 35., 50., 1.10),
        (90., 20., 30., 0.93),
        (102., 31., 47., 1.08),
        (93., 23., 31., 0.95),
    ]
    .into_iter()
    .map(TrainingRow::from)
    .collect()
}

fn main() -> Result<(), EstimatorError> {
    // Fit once per dataset version, then reuse the model for every request.
    let mut cache = ModelCache::new(CalibrationModel::new());
    let fitted = cache.get_or_fit(1, load_history)?;

    println!(
        "coefficients {} intercept {:.4}",
        fitted.coefficients(),
        fitted.intercept()
    );

    let observation = InputObservation::new(98.5, 27.0, 40.0);
    let factor = fitted.predict(observation)?;
    println!("predicted calibration factor: {:.3}", factor);

    let comparison = fitted.compare(&load_history())?;
    println!("actual\tpredicted");
    for (actual, predicted) in comparison.pairs() {
        println!("{:.3}\t{:.3}", actual, predicted);
    }
    let summary = comparison.summary();
    println!(
        "r2 {:.4} mae {:.4} rmse {:.4}",
        summary.r2, summary.mean_absolute_error, summary.root_mean_squared_error
    );
    Ok(())
}
