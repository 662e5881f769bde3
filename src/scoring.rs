//! Scoring orchestrator: sequences extraction, model inference, blending,
//! explanation and action classification for one request.

use crate::config::ScoringConfig;
use crate::error::ScoreError;
use crate::explain::Explainer;
use crate::features::FeatureExtractor;
use crate::models::blender::ScoreBlender;
use crate::models::bundle::ModelStore;
use crate::types::score::{ActionThresholds, RecommendedAction, ScoreResult};
use crate::types::transaction::{HistoryRecord, Transaction};
use std::sync::Arc;
use tracing::debug;

/// Per-request scoring engine.
///
/// Stateless across calls: everything per-request is local, and the only
/// shared resource is the read-only model bundle behind the store.
pub struct ScoringEngine {
    store: Arc<ModelStore>,
    extractor: FeatureExtractor,
    blender: ScoreBlender,
    explainer: Explainer,
    thresholds: ActionThresholds,
}

impl ScoringEngine {
    pub fn new(config: &ScoringConfig, store: Arc<ModelStore>) -> Self {
        Self {
            store,
            extractor: FeatureExtractor::from_config(config),
            blender: ScoreBlender::from_config(config),
            explainer: Explainer::new(),
            thresholds: config.action_thresholds.clone(),
        }
    }

    /// Score one transaction against its account history.
    ///
    /// Fails only with [`ScoreError::ModelUnavailable`]; every other step
    /// is total. History is read-only and need not be sorted.
    pub fn score_transaction(
        &self,
        user_id: &str,
        transaction: &Transaction,
        history: &[HistoryRecord],
    ) -> Result<ScoreResult, ScoreError> {
        let bundle = self.store.get()?;

        let features = self.extractor.extract(transaction, history);

        let probability = bundle.probability(&features);
        let anomaly_score = bundle.anomaly_score(&features);
        let score = self.blender.blend(probability, anomaly_score);

        let explanation = self.explainer.explain(bundle.importances(), &features);
        let recommended_action = RecommendedAction::from_score(score, &self.thresholds);

        debug!(
            user_id = %user_id,
            score = score,
            probability = probability,
            anomaly_score = anomaly_score,
            action = ?recommended_action,
            "Transaction scored"
        );

        Ok(ScoreResult {
            user_id: user_id.to_string(),
            score,
            explanation,
            recommended_action,
        })
    }
}
