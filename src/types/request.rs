//! Inbound scoring request envelope

use crate::types::transaction::{HistoryRecord, Transaction};
use serde::{Deserialize, Serialize};

/// A scoring request: one transaction plus a bounded slice of the account's
/// settled history. History order is not significant; the extractor sorts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRequest {
    /// Opaque account/user identifier
    pub user_id: String,

    pub transaction: Transaction,

    #[serde(default)]
    pub history: Vec<HistoryRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_without_history() {
        let request: ScoreRequest =
            serde_json::from_str(r#"{"user_id": "u1", "transaction": {"amount": 12.5}}"#)
                .unwrap();

        assert_eq!(request.user_id, "u1");
        assert_eq!(request.transaction.amount, 12.5);
        assert!(request.history.is_empty());
    }
}
