//! Risk Scoring Pipeline Library
//!
//! Scores financial transactions for fraud risk in real time: feature
//! extraction from transaction + history, blending of a supervised
//! probability with an unsupervised anomaly signal, explanation ranking
//! and action thresholding.

pub mod config;
pub mod consumer;
pub mod error;
pub mod explain;
pub mod features;
pub mod metrics;
pub mod models;
pub mod producer;
pub mod scoring;
pub mod types;

pub use config::AppConfig;
pub use consumer::ScoreRequestConsumer;
pub use error::ScoreError;
pub use features::{FeatureExtractor, FeatureVector};
pub use models::{ModelBundle, ModelLoader, ModelStore, OnnxModelBundle};
pub use producer::ScoreResultProducer;
pub use scoring::ScoringEngine;
pub use types::{HistoryRecord, ScoreRequest, ScoreResult, Transaction};
