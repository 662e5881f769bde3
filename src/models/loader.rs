//! ONNX model bundle loader

use crate::features::FEATURE_COUNT;
use crate::models::onnx::OnnxModelBundle;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use tracing::{info, warn};

/// Loads a model bundle directory: `classifier.onnx` (supervised fraud
/// probability), `anomaly.onnx` (isolation-forest style decision scores)
/// and an optional `importances.json` with one weight per feature.
pub struct ModelLoader {
    /// Number of threads for ONNX inference per session
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Result<Self> {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        ort::init().commit()?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load the full bundle from a directory.
    pub fn load_bundle<P: AsRef<Path>>(&self, bundle_dir: P) -> Result<OnnxModelBundle> {
        let bundle_dir = bundle_dir.as_ref();

        let classifier = self.load_session(&bundle_dir.join("classifier.onnx"), "classifier")?;
        let anomaly = self.load_session(&bundle_dir.join("anomaly.onnx"), "anomaly")?;
        let importances = self.load_importances(&bundle_dir.join("importances.json"));

        info!(
            dir = %bundle_dir.display(),
            importances = importances.is_some(),
            "Model bundle loaded"
        );

        Ok(OnnxModelBundle::new(classifier, anomaly, importances))
    }

    fn load_session(&self, path: &Path, name: &str) -> Result<Session> {
        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .context(format!("Failed to load model from {:?}", path))?;

        Ok(session)
    }

    /// Read per-feature importance weights, if the bundle ships them.
    /// A missing or malformed file falls back to uniform weights downstream.
    fn load_importances(&self, path: &Path) -> Option<Vec<f64>> {
        if !path.exists() {
            return None;
        }

        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read importances file");
                return None;
            }
        };

        match serde_json::from_str::<Vec<f64>>(&raw) {
            Ok(weights) if weights.len() == FEATURE_COUNT => Some(weights),
            Ok(weights) => {
                warn!(
                    path = %path.display(),
                    expected = FEATURE_COUNT,
                    got = weights.len(),
                    "Importances length mismatch, ignoring"
                );
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to parse importances file");
                None
            }
        }
    }
}
