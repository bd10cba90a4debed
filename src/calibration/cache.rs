use std::sync::Arc;

use log::debug;

use super::{CalibrationModel, FittedModel, TrainingRow};
use crate::estimators::error::Result;

/// Caller-owned holder of the model fitted on the current dataset version.
///
/// The dataset version is an opaque number chosen by the data source (a table
/// revision, a row count, a load timestamp). The model is refitted only when
/// the requested version differs from the cached one, and readers keep the
/// `Arc` they obtained even after a refit replaces it.
#[derive(Debug, Default)]
pub struct ModelCache {
    model: CalibrationModel,
    entry: Option<CacheEntry>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    version: u64,
    fitted: Arc<FittedModel>,
}

impl ModelCache {
    pub fn new(model: CalibrationModel) -> Self {
        ModelCache { model, entry: None }
    }

    /// Returns the model fitted on `version`, fitting it on the rows returned
    /// by `load` if the cache is empty or holds another version. `load` is not
    /// called on a hit. A failed fit leaves the cache unchanged.
    pub fn get_or_fit<L>(&mut self, version: u64, load: L) -> Result<Arc<FittedModel>>
    where
        L: FnOnce() -> Vec<TrainingRow>,
    {
        if let Some(entry) = &self.entry {
            if entry.version == version {
                return Ok(Arc::clone(&entry.fitted));
            }
        }

        let rows = load();
        let fitted = Arc::new(self.model.fit(&rows)?);
        debug!(
            "refitted calibration model for dataset version {} ({} rows)",
            version,
            rows.len()
        );
        self.entry = Some(CacheEntry {
            version,
            fitted: Arc::clone(&fitted),
        });
        Ok(fitted)
    }

    /// The cached model, if any, without fitting.
    pub fn current(&self) -> Option<Arc<FittedModel>> {
        self.entry.as_ref().map(|entry| Arc::clone(&entry.fitted))
    }

    /// Dataset version of the cached model.
    pub fn version(&self) -> Option<u64> {
        self.entry.as_ref().map(|entry| entry.version)
    }

    /// Drops the cached model; the next `get_or_fit` refits.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}
