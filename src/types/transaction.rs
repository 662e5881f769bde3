//! Transaction and history data structures for risk scoring

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payment channel of a transaction.
///
/// Unknown channel strings deserialize to `Other` so that sparse or
/// unexpected payloads still score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentChannel {
    Online,
    InStore,
    #[serde(other)]
    #[default]
    Other,
}

/// A transaction to be scored for fraud risk.
///
/// Every field beyond the shape itself is optional: missing values resolve
/// to the documented defaults so feature extraction is total over any
/// syntactically valid payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Opaque pass-through identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,

    /// Transaction amount; 0 if absent
    #[serde(default)]
    pub amount: f64,

    /// Merchant name
    #[serde(default, alias = "name")]
    pub merchant_name: Option<String>,

    /// Category tags; the first element is the primary category
    #[serde(default)]
    pub category: Vec<String>,

    /// Payment channel; unknown values map to `Other`
    #[serde(default)]
    pub payment_channel: PaymentChannel,

    /// Transaction timestamp; defaults to receipt time when absent
    #[serde(default = "Utc::now", alias = "date")]
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Create a transaction with the fields the scoring core reads.
    pub fn new(amount: f64, merchant_name: &str, category: Vec<String>) -> Self {
        Self {
            transaction_id: None,
            amount,
            merchant_name: Some(merchant_name.to_string()),
            category,
            payment_channel: PaymentChannel::Other,
            timestamp: Utc::now(),
        }
    }
}

/// A prior, already-settled transaction for the same account.
///
/// Same shape as [`Transaction`], but the timestamp may be absent; the
/// extractor resolves a missing timestamp to the scored transaction's own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(default)]
    pub amount: f64,

    #[serde(default, alias = "name")]
    pub merchant_name: Option<String>,

    #[serde(default)]
    pub category: Vec<String>,

    #[serde(default)]
    pub payment_channel: PaymentChannel,

    #[serde(default, alias = "date", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl HistoryRecord {
    pub fn new(amount: f64, merchant_name: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            amount,
            merchant_name: Some(merchant_name.to_string()),
            category: Vec::new(),
            payment_channel: PaymentChannel::Other,
            timestamp: Some(timestamp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_transaction_deserializes_with_defaults() {
        let tx: Transaction = serde_json::from_str("{}").unwrap();

        assert_eq!(tx.amount, 0.0);
        assert_eq!(tx.merchant_name, None);
        assert!(tx.category.is_empty());
        assert_eq!(tx.payment_channel, PaymentChannel::Other);
    }

    #[test]
    fn test_unknown_channel_maps_to_other() {
        let tx: Transaction =
            serde_json::from_str(r#"{"payment_channel": "telephone"}"#).unwrap();
        assert_eq!(tx.payment_channel, PaymentChannel::Other);

        let tx: Transaction = serde_json::from_str(r#"{"payment_channel": "online"}"#).unwrap();
        assert_eq!(tx.payment_channel, PaymentChannel::Online);
    }

    #[test]
    fn test_transaction_serialization_roundtrip() {
        let tx = Transaction::new(120.0, "Test Shop", vec!["Shops".to_string()]);

        let json = serde_json::to_string(&tx).unwrap();
        let deserialized: Transaction = serde_json::from_str(&json).unwrap();

        assert_eq!(tx, deserialized);
    }

    #[test]
    fn test_merchant_name_alias() {
        let record: HistoryRecord =
            serde_json::from_str(r#"{"amount": 20, "name": "Coffee Hut"}"#).unwrap();
        assert_eq!(record.merchant_name.as_deref(), Some("Coffee Hut"));
        assert_eq!(record.timestamp, None);
    }
}
