//! Model bundle contract and the single-initialization store.

use crate::error::ScoreError;
use crate::features::FeatureVector;
use anyhow::Result;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Inference contract of an externally trained model bundle: a supervised
/// classifier paired with an unsupervised anomaly detector.
///
/// Implementations degrade internally to neutral values on inference
/// faults rather than erroring, so the scoring pipeline stays total once a
/// bundle is installed.
pub trait ModelBundle: Send + Sync {
    /// Probability in [0, 1] that the transaction is fraudulent.
    fn probability(&self, features: &FeatureVector) -> f64;

    /// Anomaly score; more negative means more anomalous.
    fn anomaly_score(&self, features: &FeatureVector) -> f64;

    /// Per-feature importance weights aligned with the feature vector's
    /// field order, if the bundle exposes them.
    fn importances(&self) -> Option<&[f64]>;
}

/// Install-once, read-many handle for the shared model bundle.
///
/// Concurrent first requests cannot race to load twice or observe a
/// partially constructed bundle: the slot is set exactly once and only a
/// fully built bundle is ever published.
pub struct ModelStore {
    slot: OnceCell<Arc<dyn ModelBundle>>,
}

impl ModelStore {
    pub fn new() -> Self {
        Self {
            slot: OnceCell::new(),
        }
    }

    /// Install the bundle. Fails if a bundle was already installed.
    pub fn install(&self, bundle: Arc<dyn ModelBundle>) -> Result<()> {
        self.slot
            .set(bundle)
            .map_err(|_| anyhow::anyhow!("model bundle already installed"))
    }

    /// Get the installed bundle, or `ModelUnavailable` if none has been
    /// installed yet.
    pub fn get(&self) -> Result<Arc<dyn ModelBundle>, ScoreError> {
        self.slot
            .get()
            .cloned()
            .ok_or(ScoreError::ModelUnavailable)
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.get().is_some()
    }
}

impl Default for ModelStore {
    fn default() -> Self {
        Self::new()
    }
}
