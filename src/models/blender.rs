//! Blending of the supervised probability with the anomaly signal.

use crate::config::ScoringConfig;

/// Combines a fraud probability and an anomaly score into one bounded
/// score. Deterministic and stateless.
pub struct ScoreBlender {
    /// Anomaly scores below this trigger the boost
    boost_threshold: f64,
    /// Multiplier applied to |anomaly| for the boost
    boost_factor: f64,
}

impl ScoreBlender {
    pub fn new() -> Self {
        Self::from_config(&ScoringConfig::default())
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self {
            boost_threshold: config.anomaly_boost_threshold,
            boost_factor: config.anomaly_boost_factor,
        }
    }

    /// Blend probability and anomaly score into a final score in [0, 100].
    ///
    /// The anomaly contribution is a one-sided boost: scores at or above
    /// the threshold never reduce the base.
    pub fn blend(&self, probability: f64, anomaly_score: f64) -> u8 {
        let base = (probability * 100.0).clamp(0.0, 100.0).round() as i64;

        let blended = if anomaly_score < self.boost_threshold {
            base + (anomaly_score.abs() * self.boost_factor).round() as i64
        } else {
            base
        };

        blended.clamp(0, 100) as u8
    }
}

impl Default for ScoreBlender {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_base_score_without_anomaly() {
        let blender = ScoreBlender::new();

        assert_eq!(blender.blend(0.0, 0.0), 0);
        assert_eq!(blender.blend(0.42, 0.0), 42);
        assert_eq!(blender.blend(1.0, 0.0), 100);
        // round, not truncate
        assert_eq!(blender.blend(0.425, 0.0), 43);
    }

    #[test]
    fn test_anomaly_boost_is_one_sided() {
        let blender = ScoreBlender::new();

        // -0.5 is past the threshold: +round(0.5 * 50) = +25
        assert_eq!(blender.blend(0.42, -0.5), 67);
        // at the threshold, no boost
        assert_eq!(blender.blend(0.42, -0.2), 42);
        // positive anomaly scores never reduce the base
        assert_eq!(blender.blend(0.42, 1.5), 42);
    }

    #[test]
    fn test_boost_clamps_at_100() {
        let blender = ScoreBlender::new();
        assert_eq!(blender.blend(0.95, -2.0), 100);
    }

    #[test]
    fn test_out_of_range_probability_is_clamped() {
        let blender = ScoreBlender::new();
        assert_eq!(blender.blend(1.7, 0.0), 100);
        assert_eq!(blender.blend(-0.3, 0.0), 0);
    }

    #[test]
    fn test_score_bounded_over_random_inputs() {
        let blender = ScoreBlender::new();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..10_000 {
            let probability = rng.gen_range(-1.0..2.0);
            let anomaly = rng.gen_range(-5.0..5.0);
            let score = blender.blend(probability, anomaly);
            assert!(score <= 100);
        }
    }
}
