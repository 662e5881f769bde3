//! Explanation of a score: ranked feature contributions and rule flags.

use crate::features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use crate::types::score::{Explanation, TopFeature};

/// Number of ranked contributions reported
const TOP_FEATURE_COUNT: usize = 3;

/// Flag when the amount exceeds this multiple of the history average
const HIGH_AMOUNT_RATIO: f64 = 3.0;

/// Flag when the primary category's risk weight exceeds this
const RISKY_CATEGORY_THRESHOLD: f64 = 0.5;

/// Ranks features by importance and raises rule-based flags.
pub struct Explainer;

impl Explainer {
    pub fn new() -> Self {
        Self
    }

    /// Build an explanation for one scored feature vector.
    ///
    /// Importances come from the model bundle; absent (or wrongly sized)
    /// importances fall back to uniform weights. Ranking is a stable sort
    /// by descending weight over the fixed-order table, so ties break by
    /// original field index.
    pub fn explain(&self, importances: Option<&[f64]>, features: &FeatureVector) -> Explanation {
        let uniform = [1.0 / FEATURE_COUNT as f64; FEATURE_COUNT];
        let weights: &[f64] = match importances {
            Some(weights) if weights.len() == FEATURE_COUNT => weights,
            _ => &uniform,
        };

        let mut ranked: Vec<TopFeature> = FEATURE_NAMES
            .iter()
            .zip(weights.iter())
            .zip(features.as_slice().iter())
            .map(|((name, &weight), &value)| TopFeature {
                feature: name.to_string(),
                weight,
                value,
            })
            .collect();
        ranked.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(TOP_FEATURE_COUNT);

        let mut flags = Vec::new();
        if features.amount_vs_avg_ratio() > HIGH_AMOUNT_RATIO {
            flags.push("high_amount_vs_avg".to_string());
        }
        if features.category_risk() > RISKY_CATEGORY_THRESHOLD {
            flags.push("risky_category".to_string());
        }
        if features.is_new_merchant() == 1.0 {
            flags.push("new_merchant".to_string());
        }

        Explanation {
            top_features: ranked,
            flags,
        }
    }
}

impl Default for Explainer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(values: [f64; FEATURE_COUNT]) -> FeatureVector {
        FeatureVector::from(values)
    }

    #[test]
    fn test_ranking_by_weight_descending() {
        let explainer = Explainer::new();
        let importances = [0.1, 0.5, 0.4, 0.05, 0.05, 0.0, 0.0, 0.0, 0.0, 0.0];
        let features = vector([120.0, 5.33, 2.0, 0.5, 0.4, 0.0, 0.0, 2.0, 0.0, 0.0]);

        let explanation = explainer.explain(Some(&importances), &features);

        assert_eq!(explanation.top_features.len(), 3);
        assert_eq!(explanation.top_features[0].feature, "amount_vs_avg_ratio");
        assert_eq!(explanation.top_features[0].weight, 0.5);
        assert_eq!(explanation.top_features[0].value, 5.33);
        assert_eq!(explanation.top_features[1].feature, "days_since_last_tx");
        assert_eq!(explanation.top_features[2].feature, "amount");
    }

    #[test]
    fn test_uniform_fallback_ties_break_by_field_order() {
        let explainer = Explainer::new();
        let features = vector([1.0; FEATURE_COUNT]);

        let explanation = explainer.explain(None, &features);

        let names: Vec<&str> = explanation
            .top_features
            .iter()
            .map(|f| f.feature.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["amount", "amount_vs_avg_ratio", "days_since_last_tx"]
        );
        assert!(explanation
            .top_features
            .iter()
            .all(|f| (f.weight - 0.1).abs() < 1e-12));
    }

    #[test]
    fn test_wrong_length_importances_fall_back_to_uniform() {
        let explainer = Explainer::new();
        let features = vector([0.0; FEATURE_COUNT]);

        let explanation = explainer.explain(Some(&[0.9, 0.1]), &features);
        assert_eq!(explanation.top_features[0].feature, "amount");
        assert!((explanation.top_features[0].weight - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_flags_in_rule_order() {
        let explainer = Explainer::new();

        // ratio 5.0, risk 0.6, new merchant
        let features = vector([10.0, 5.0, 2.0, 0.0, 0.6, 0.0, 0.0, 0.0, 0.0, 1.0]);
        let explanation = explainer.explain(None, &features);
        assert_eq!(
            explanation.flags,
            vec!["high_amount_vs_avg", "risky_category", "new_merchant"]
        );

        // none triggered: boundary values are exclusive
        let features = vector([10.0, 3.0, 2.0, 0.5, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let explanation = explainer.explain(None, &features);
        assert!(explanation.flags.is_empty());
    }
}
