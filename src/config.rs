//! Configuration management for the risk scoring pipeline

use crate::types::score::ActionThresholds;
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming score requests
    pub request_subject: String,
    /// Subject for outgoing score results (used when the request carries no
    /// reply subject)
    pub result_subject: String,
}

/// Model bundle configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Directory containing the bundle: classifier.onnx, anomaly.onnx and
    /// an optional importances.json
    pub bundle_dir: String,
    /// Number of threads for ONNX inference per session (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_onnx_threads() -> usize {
    1
}

/// Scoring constants.
///
/// These are process-level configuration with defaults matching the trained
/// bundle; they are never varied per request.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Risk weight per primary category
    #[serde(default = "default_category_risk")]
    pub category_risk: HashMap<String, f64>,
    /// Risk weight for categories not in the table (and empty categories)
    #[serde(default = "default_category_risk_fallback")]
    pub default_category_risk: f64,
    /// Trailing velocity windows, in hours
    #[serde(default)]
    pub velocity_windows: VelocityWindows,
    /// Score thresholds for the challenge/flag tiers
    #[serde(default)]
    pub action_thresholds: ActionThresholds,
    /// Anomaly scores below this add a boost to the base score
    #[serde(default = "default_anomaly_boost_threshold")]
    pub anomaly_boost_threshold: f64,
    /// Multiplier applied to |anomaly| for the boost
    #[serde(default = "default_anomaly_boost_factor")]
    pub anomaly_boost_factor: f64,
}

/// Velocity window sizes in hours
#[derive(Debug, Clone, Deserialize)]
pub struct VelocityWindows {
    pub hour: u64,
    pub day: u64,
    pub week: u64,
}

impl Default for VelocityWindows {
    fn default() -> Self {
        Self {
            hour: 1,
            day: 24,
            week: 24 * 7,
        }
    }
}

fn default_category_risk() -> HashMap<String, f64> {
    let mut table = HashMap::new();
    table.insert("Travel".to_string(), 0.6);
    table.insert("Restaurants".to_string(), 0.2);
    table.insert("Shops".to_string(), 0.4);
    table.insert("Entertainment".to_string(), 0.5);
    table
}

fn default_category_risk_fallback() -> f64 {
    0.3
}

fn default_anomaly_boost_threshold() -> f64 {
    -0.2
}

fn default_anomaly_boost_factor() -> f64 {
    50.0
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            category_risk: default_category_risk(),
            default_category_risk: default_category_risk_fallback(),
            velocity_windows: VelocityWindows::default(),
            action_thresholds: ActionThresholds::default(),
            anomaly_boost_threshold: default_anomaly_boost_threshold(),
            anomaly_boost_factor: default_anomaly_boost_factor(),
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Number of concurrent scoring workers
    pub workers: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                request_subject: "score.requests".to_string(),
                result_subject: "score.results".to_string(),
            },
            model: ModelConfig {
                bundle_dir: "models".to_string(),
                onnx_threads: 1,
            },
            scoring: ScoringConfig::default(),
            pipeline: PipelineConfig { workers: 4 },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.nats.url, "nats://localhost:4222");
        assert_eq!(config.scoring.category_risk.len(), 4);
        assert_eq!(config.scoring.category_risk.get("Travel"), Some(&0.6));
        assert_eq!(config.scoring.default_category_risk, 0.3);
        assert_eq!(config.scoring.velocity_windows.week, 168);
        assert_eq!(config.scoring.action_thresholds.challenge, 60);
        assert_eq!(config.scoring.action_thresholds.flag, 85);
        assert_eq!(config.scoring.anomaly_boost_threshold, -0.2);
        assert_eq!(config.scoring.anomaly_boost_factor, 50.0);
    }
}
