//! Type definitions for the risk scoring pipeline

pub mod request;
pub mod score;
pub mod transaction;

pub use request::ScoreRequest;
pub use score::{ActionThresholds, Explanation, RecommendedAction, ScoreResult, TopFeature};
pub use transaction::{HistoryRecord, PaymentChannel, Transaction};
