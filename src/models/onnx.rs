//! ONNX-backed model bundle.
//!
//! Wraps the classifier and anomaly sessions behind the [`ModelBundle`]
//! contract. Inference faults degrade to neutral values (0.5 probability,
//! 0.0 anomaly) with a warning, so scoring stays total once the bundle is
//! installed.

use crate::features::FeatureVector;
use crate::models::bundle::ModelBundle;
use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::session::Session;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType};
use std::sync::RwLock;
use tracing::{debug, warn};

pub struct OnnxModelBundle {
    /// Supervised classifier session (wrapped in RwLock: `run` needs
    /// exclusive access)
    classifier: RwLock<Session>,
    classifier_input: String,
    classifier_output: String,
    /// Anomaly detector session
    anomaly: RwLock<Session>,
    anomaly_input: String,
    anomaly_output: String,
    /// Per-feature importance weights, if shipped with the bundle
    importances: Option<Vec<f64>>,
}

impl OnnxModelBundle {
    pub fn new(classifier: Session, anomaly: Session, importances: Option<Vec<f64>>) -> Self {
        let classifier_input = input_name(&classifier);
        let classifier_output = output_name(&classifier, &["prob", "output"]);
        let anomaly_input = input_name(&anomaly);
        let anomaly_output = output_name(&anomaly, &["score"]);

        Self {
            classifier: RwLock::new(classifier),
            classifier_input,
            classifier_output,
            anomaly: RwLock::new(anomaly),
            anomaly_input,
            anomaly_output,
            importances,
        }
    }

    fn run_classifier(&self, features: &FeatureVector) -> Result<f64> {
        let input = feature_tensor(features)?;

        let mut session = self
            .classifier
            .write()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        let outputs = session.run(ort::inputs![&self.classifier_input => input])?;

        extract_probability(&outputs, &self.classifier_output)
    }

    fn run_anomaly(&self, features: &FeatureVector) -> Result<f64> {
        let input = feature_tensor(features)?;

        let mut session = self
            .anomaly
            .write()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        let outputs = session.run(ort::inputs![&self.anomaly_input => input])?;

        extract_decision_score(&outputs, &self.anomaly_output)
    }
}

impl ModelBundle for OnnxModelBundle {
    fn probability(&self, features: &FeatureVector) -> f64 {
        match self.run_classifier(features) {
            Ok(probability) => probability,
            Err(e) => {
                warn!(error = %e, "Classifier inference failed, using neutral probability");
                0.5
            }
        }
    }

    fn anomaly_score(&self, features: &FeatureVector) -> f64 {
        match self.run_anomaly(features) {
            Ok(score) => score,
            Err(e) => {
                warn!(error = %e, "Anomaly inference failed, using neutral score");
                0.0
            }
        }
    }

    fn importances(&self) -> Option<&[f64]> {
        self.importances.as_deref()
    }
}

fn input_name(session: &Session) -> String {
    session
        .inputs
        .first()
        .map(|i| i.name.clone())
        .unwrap_or_else(|| "float_input".to_string())
}

/// Pick the output carrying the values we want: first match on the hint
/// substrings, falling back to the last declared output.
fn output_name(session: &Session, hints: &[&str]) -> String {
    session
        .outputs
        .iter()
        .find(|o| hints.iter().any(|hint| o.name.contains(hint)))
        .map(|o| o.name.clone())
        .unwrap_or_else(|| {
            session
                .outputs
                .last()
                .map(|o| o.name.clone())
                .unwrap_or_else(|| "output".to_string())
        })
}

/// Build the [1, FEATURE_COUNT] input tensor.
fn feature_tensor(features: &FeatureVector) -> Result<ort::value::Tensor<f32>> {
    use ort::value::Tensor;

    let data: Vec<f32> = features.as_slice().iter().map(|&v| v as f32).collect();
    let shape = vec![1_i64, data.len() as i64];
    Tensor::from_array((shape, data)).context("Failed to create input tensor")
}

/// Extract the fraud probability from classifier output.
/// Handles both tensor outputs (XGBoost, RandomForest) and seq(map)
/// outputs (sklearn ZipMap exports).
fn extract_probability(outputs: &ort::session::SessionOutputs, output_name: &str) -> Result<f64> {
    if let Some(output) = outputs.get(output_name) {
        let dtype = output.dtype();

        if let Ok(tensor) = output.try_extract_tensor::<f32>() {
            let (shape, data) = tensor;
            return Ok(fraud_class_probability(shape, data));
        }

        if DynSequenceValueType::can_downcast(&dtype) {
            if let Ok(probability) = extract_from_sequence_map(output) {
                return Ok(probability);
            }
        }
    }

    // Fallback: iterate all outputs and try extraction
    for (name, output) in outputs.iter() {
        if name.contains("label") {
            continue;
        }

        let dtype = output.dtype();

        if let Ok(tensor) = output.try_extract_tensor::<f32>() {
            let (shape, data) = tensor;
            debug!(output = %name, "Extracted probability from fallback output");
            return Ok(fraud_class_probability(shape, data));
        }

        if DynSequenceValueType::can_downcast(&dtype) {
            if let Ok(probability) = extract_from_sequence_map(&output) {
                return Ok(probability);
            }
        }
    }

    anyhow::bail!("No probability output found")
}

/// Extract probability of the fraud class (class 1) from seq(map(int64,
/// float)) format, as produced by sklearn ONNX exports.
fn extract_from_sequence_map(output: &ort::value::DynValue) -> Result<f64> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;

    let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;
    if maps.is_empty() {
        return Err(anyhow::anyhow!("Empty sequence"));
    }

    // batch_size is always 1
    let kv_pairs = maps[0].try_extract_key_values::<i64, f32>()?;

    for (class_id, probability) in &kv_pairs {
        if *class_id == 1 {
            return Ok(*probability as f64);
        }
    }
    for (class_id, probability) in &kv_pairs {
        if *class_id == 0 {
            return Ok(1.0 - *probability as f64);
        }
    }

    Err(anyhow::anyhow!("No probability found in map"))
}

/// Extract the fraud class probability from tensor data: index 1 for
/// [batch, num_classes] outputs, the single value for [batch, 1].
fn fraud_class_probability(shape: &ort::tensor::Shape, data: &[f32]) -> f64 {
    let dims: Vec<i64> = shape.iter().copied().collect();

    if let Some(&classes) = dims.last() {
        if classes >= 2 && data.len() >= 2 {
            return data[1] as f64;
        }
    }

    data.first().map(|&v| v as f64).unwrap_or(0.5)
}

/// Extract the decision score from anomaly detector output (a [batch, 1]
/// tensor; more negative means more anomalous).
fn extract_decision_score(outputs: &ort::session::SessionOutputs, output_name: &str) -> Result<f64> {
    if let Some(output) = outputs.get(output_name) {
        if let Ok(tensor) = output.try_extract_tensor::<f32>() {
            let (_, data) = tensor;
            if let Some(&score) = data.first() {
                return Ok(score as f64);
            }
        }
    }

    for (name, output) in outputs.iter() {
        if name.contains("label") {
            continue;
        }
        if let Ok(tensor) = output.try_extract_tensor::<f32>() {
            let (_, data) = tensor;
            if let Some(&score) = data.first() {
                debug!(output = %name, "Extracted anomaly score from fallback output");
                return Ok(score as f64);
            }
        }
    }

    anyhow::bail!("No anomaly score output found")
}
