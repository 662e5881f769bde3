//! Scoring output data structures

use serde::{Deserialize, Serialize};

/// Recommended action for a scored transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendedAction {
    Allow,
    Challenge,
    Flag,
}

impl RecommendedAction {
    /// Classify a final score into an action tier.
    ///
    /// Boundaries are inclusive on the lower bound of each tier.
    pub fn from_score(score: u8, thresholds: &ActionThresholds) -> Self {
        if score >= thresholds.flag {
            RecommendedAction::Flag
        } else if score >= thresholds.challenge {
            RecommendedAction::Challenge
        } else {
            RecommendedAction::Allow
        }
    }
}

/// Score thresholds for the action tiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionThresholds {
    pub challenge: u8,
    pub flag: u8,
}

impl Default for ActionThresholds {
    fn default() -> Self {
        Self {
            challenge: 60,
            flag: 85,
        }
    }
}

/// One ranked feature contribution in an explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopFeature {
    /// Feature name
    pub feature: String,
    /// Importance weight from the model bundle (or uniform fallback)
    pub weight: f64,
    /// Observed feature value for this transaction
    pub value: f64,
}

/// Ranked feature contributions plus rule-based flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    /// At most three entries, ordered by descending weight
    pub top_features: Vec<TopFeature>,
    /// Flags in rule evaluation order
    pub flags: Vec<String>,
}

/// Result of scoring one transaction.
///
/// Carries no generated ids or wall-clock fields: scoring the same inputs
/// against the same bundle yields an identical result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Account/user identifier, passed through unchanged
    pub user_id: String,

    /// Final risk score in [0, 100]
    pub score: u8,

    pub explanation: Explanation,

    pub recommended_action: RecommendedAction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_tier_boundaries() {
        let thresholds = ActionThresholds::default();

        assert_eq!(
            RecommendedAction::from_score(59, &thresholds),
            RecommendedAction::Allow
        );
        assert_eq!(
            RecommendedAction::from_score(60, &thresholds),
            RecommendedAction::Challenge
        );
        assert_eq!(
            RecommendedAction::from_score(84, &thresholds),
            RecommendedAction::Challenge
        );
        assert_eq!(
            RecommendedAction::from_score(85, &thresholds),
            RecommendedAction::Flag
        );
        assert_eq!(
            RecommendedAction::from_score(100, &thresholds),
            RecommendedAction::Flag
        );
    }

    #[test]
    fn test_action_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&RecommendedAction::Challenge).unwrap(),
            r#""challenge""#
        );
    }

    #[test]
    fn test_score_result_serialization() {
        let result = ScoreResult {
            user_id: "user_42".to_string(),
            score: 67,
            explanation: Explanation {
                top_features: vec![TopFeature {
                    feature: "amount_vs_avg_ratio".to_string(),
                    weight: 0.5,
                    value: 5.33,
                }],
                flags: vec!["high_amount_vs_avg".to_string()],
            },
            recommended_action: RecommendedAction::Challenge,
        };

        let json = serde_json::to_string(&result).unwrap();
        let deserialized: ScoreResult = serde_json::from_str(&json).unwrap();

        assert_eq!(result, deserialized);
    }
}
