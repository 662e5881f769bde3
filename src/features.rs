//! Feature extraction from a transaction plus its account history.
//!
//! Produces the fixed-order 10-field vector the model bundle was trained
//! on. Field order is part of the contract: importance ranking downstream
//! indexes positionally.

use crate::config::ScoringConfig;
use crate::types::transaction::{HistoryRecord, PaymentChannel, Transaction};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Number of features in the vector
pub const FEATURE_COUNT: usize = 10;

/// Feature names, in vector order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "amount",
    "amount_vs_avg_ratio",
    "days_since_last_tx",
    "merchant_frequency",
    "category_risk",
    "velocity_1h",
    "velocity_24h",
    "velocity_7d",
    "is_card_not_present",
    "is_new_merchant",
];

/// Guard against division by a zero average amount
const EPSILON: f64 = 1e-6;

/// Average amount assumed when the account has no history
const EMPTY_HISTORY_AVG_AMOUNT: f64 = 50.0;

/// Days since last transaction assumed when the account has no history
const EMPTY_HISTORY_DAYS_SINCE_LAST: f64 = 30.0;

/// Fixed-length, fixed-order feature vector.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn amount(&self) -> f64 {
        self.0[0]
    }

    pub fn amount_vs_avg_ratio(&self) -> f64 {
        self.0[1]
    }

    pub fn days_since_last_tx(&self) -> f64 {
        self.0[2]
    }

    pub fn merchant_frequency(&self) -> f64 {
        self.0[3]
    }

    pub fn category_risk(&self) -> f64 {
        self.0[4]
    }

    pub fn velocity_1h(&self) -> f64 {
        self.0[5]
    }

    pub fn velocity_24h(&self) -> f64 {
        self.0[6]
    }

    pub fn velocity_7d(&self) -> f64 {
        self.0[7]
    }

    pub fn is_card_not_present(&self) -> f64 {
        self.0[8]
    }

    pub fn is_new_merchant(&self) -> f64 {
        self.0[9]
    }
}

impl From<[f64; FEATURE_COUNT]> for FeatureVector {
    fn from(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }
}

/// Feature extractor that transforms a transaction-in-context into the
/// model input vector. Total: never fails, for any transaction and any
/// (possibly empty, possibly unsorted) history.
pub struct FeatureExtractor {
    category_risk: HashMap<String, f64>,
    default_category_risk: f64,
    /// Trailing windows in hours, shortest first
    velocity_windows: [i64; 3],
}

impl FeatureExtractor {
    /// Create an extractor with the built-in category risk table and the
    /// standard 1h/24h/7d velocity windows.
    pub fn new() -> Self {
        Self::from_config(&ScoringConfig::default())
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self {
            category_risk: config.category_risk.clone(),
            default_category_risk: config.default_category_risk,
            velocity_windows: [
                config.velocity_windows.hour as i64,
                config.velocity_windows.day as i64,
                config.velocity_windows.week as i64,
            ],
        }
    }

    /// Extract the feature vector for a transaction given its history.
    ///
    /// History records missing a timestamp are treated as coincident with
    /// the transaction itself, so they contribute to every velocity window
    /// and set days-since-last to zero.
    pub fn extract(&self, tx: &Transaction, history: &[HistoryRecord]) -> FeatureVector {
        let now = tx.timestamp;

        let mut dated: Vec<(DateTime<Utc>, &HistoryRecord)> = history
            .iter()
            .map(|record| (record.timestamp.unwrap_or(now), record))
            .collect();
        dated.sort_by_key(|(timestamp, _)| *timestamp);

        let amount = tx.amount;
        let merchant = tx.merchant_name.as_deref();

        let avg_amount = if dated.is_empty() {
            EMPTY_HISTORY_AVG_AMOUNT
        } else {
            dated.iter().map(|(_, record)| record.amount).sum::<f64>() / dated.len() as f64
        };
        let amount_vs_avg_ratio = amount / (avg_amount + EPSILON);

        let days_since_last = dated
            .last()
            .map(|(last, _)| (now - *last).num_days() as f64)
            .unwrap_or(EMPTY_HISTORY_DAYS_SINCE_LAST);

        let merchant_matches = match merchant {
            Some(name) => dated
                .iter()
                .filter(|(_, record)| record.merchant_name.as_deref() == Some(name))
                .count(),
            None => 0,
        };
        let merchant_frequency = merchant_matches as f64 / dated.len().max(1) as f64;

        let category_risk = tx
            .category
            .first()
            .map(|primary| {
                self.category_risk
                    .get(primary)
                    .copied()
                    .unwrap_or(self.default_category_risk)
            })
            .unwrap_or(self.default_category_risk);

        // Trailing counts, inclusive on the window's lower bound
        let count_within = |hours: i64| {
            let cutoff = now - Duration::hours(hours);
            dated
                .iter()
                .filter(|(timestamp, _)| *timestamp >= cutoff)
                .count() as f64
        };
        let velocity_1h = count_within(self.velocity_windows[0]);
        let velocity_24h = count_within(self.velocity_windows[1]);
        let velocity_7d = count_within(self.velocity_windows[2]);

        let is_card_not_present = if tx.payment_channel == PaymentChannel::Online {
            1.0
        } else {
            0.0
        };
        let is_new_merchant = if merchant_matches == 0 { 1.0 } else { 0.0 };

        FeatureVector([
            amount,
            amount_vs_avg_ratio,
            days_since_last,
            merchant_frequency,
            category_risk,
            velocity_1h,
            velocity_24h,
            velocity_7d,
            is_card_not_present,
            is_new_merchant,
        ])
    }

    /// Number of features produced.
    pub fn feature_count(&self) -> usize {
        FEATURE_COUNT
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn tx_at(amount: f64, merchant: &str, timestamp: DateTime<Utc>) -> Transaction {
        let mut tx = Transaction::new(amount, merchant, vec!["Shops".to_string()]);
        tx.timestamp = timestamp;
        tx
    }

    #[test]
    fn test_empty_history_defaults() {
        let extractor = FeatureExtractor::new();
        let tx = tx_at(120.0, "Test Shop", base_time());

        let features = extractor.extract(&tx, &[]);

        assert!((features.amount_vs_avg_ratio() - 120.0 / (50.0 + 1e-6)).abs() < 1e-9);
        assert_eq!(features.days_since_last_tx(), 30.0);
        assert_eq!(features.merchant_frequency(), 0.0);
        assert_eq!(features.velocity_1h(), 0.0);
        assert_eq!(features.velocity_24h(), 0.0);
        assert_eq!(features.velocity_7d(), 0.0);
        assert_eq!(features.is_new_merchant(), 1.0);
    }

    #[test]
    fn test_velocity_windows_nest_and_include_lower_bound() {
        let extractor = FeatureExtractor::new();
        let now = base_time();
        let tx = tx_at(10.0, "Shop", now);

        let history = vec![
            HistoryRecord::new(5.0, "Shop", now - Duration::minutes(30)),
            HistoryRecord::new(5.0, "Shop", now - Duration::hours(1)), // exactly on the 1h bound
            HistoryRecord::new(5.0, "Shop", now - Duration::hours(12)),
            HistoryRecord::new(5.0, "Shop", now - Duration::days(3)),
            HistoryRecord::new(5.0, "Shop", now - Duration::days(10)), // outside all windows
        ];

        let features = extractor.extract(&tx, &history);

        assert_eq!(features.velocity_1h(), 2.0);
        assert_eq!(features.velocity_24h(), 3.0);
        assert_eq!(features.velocity_7d(), 4.0);
        assert!(features.velocity_1h() <= features.velocity_24h());
        assert!(features.velocity_24h() <= features.velocity_7d());
    }

    #[test]
    fn test_unsorted_history_is_sorted_before_days_since_last() {
        let extractor = FeatureExtractor::new();
        let now = base_time();
        let tx = tx_at(10.0, "Shop", now);

        // Most recent record deliberately listed first
        let history = vec![
            HistoryRecord::new(5.0, "Shop", now - Duration::days(2)),
            HistoryRecord::new(5.0, "Shop", now - Duration::days(9)),
        ];

        let features = extractor.extract(&tx, &history);
        assert_eq!(features.days_since_last_tx(), 2.0);
    }

    #[test]
    fn test_missing_history_timestamps_count_everywhere() {
        let extractor = FeatureExtractor::new();
        let tx = tx_at(10.0, "Shop", base_time());

        let history = vec![HistoryRecord {
            amount: 5.0,
            merchant_name: Some("Shop".to_string()),
            category: Vec::new(),
            payment_channel: PaymentChannel::Other,
            timestamp: None,
        }];

        let features = extractor.extract(&tx, &history);

        assert_eq!(features.days_since_last_tx(), 0.0);
        assert_eq!(features.velocity_1h(), 1.0);
        assert_eq!(features.velocity_24h(), 1.0);
        assert_eq!(features.velocity_7d(), 1.0);
    }

    #[test]
    fn test_merchant_frequency_and_new_merchant() {
        let extractor = FeatureExtractor::new();
        let now = base_time();
        let tx = tx_at(120.0, "Test Shop", now);

        let history = vec![
            HistoryRecord::new(20.0, "Test Shop", now - Duration::days(2)),
            HistoryRecord::new(25.0, "Coffee Hut", now - Duration::days(7)),
        ];

        let features = extractor.extract(&tx, &history);

        assert_eq!(features.merchant_frequency(), 0.5);
        assert_eq!(features.is_new_merchant(), 0.0);
        // avg = 22.5, ratio just over 5.33
        assert!((features.amount_vs_avg_ratio() - 120.0 / (22.5 + 1e-6)).abs() < 1e-9);
    }

    #[test]
    fn test_missing_merchant_matches_nothing() {
        let extractor = FeatureExtractor::new();
        let now = base_time();
        let mut tx = tx_at(10.0, "x", now);
        tx.merchant_name = None;

        let history = vec![HistoryRecord::new(5.0, "Shop", now - Duration::days(1))];
        let features = extractor.extract(&tx, &history);

        assert_eq!(features.merchant_frequency(), 0.0);
        assert_eq!(features.is_new_merchant(), 1.0);
    }

    #[test]
    fn test_category_risk_lookup() {
        let extractor = FeatureExtractor::new();
        let now = base_time();

        let mut tx = tx_at(10.0, "Shop", now);
        tx.category = vec!["Travel".to_string()];
        assert_eq!(extractor.extract(&tx, &[]).category_risk(), 0.6);

        tx.category = vec!["Restaurants".to_string()];
        assert_eq!(extractor.extract(&tx, &[]).category_risk(), 0.2);

        tx.category = vec!["Cryptocurrency".to_string()];
        assert_eq!(extractor.extract(&tx, &[]).category_risk(), 0.3);

        tx.category = Vec::new();
        assert_eq!(extractor.extract(&tx, &[]).category_risk(), 0.3);
    }

    #[test]
    fn test_card_not_present() {
        let extractor = FeatureExtractor::new();
        let mut tx = tx_at(10.0, "Shop", base_time());

        tx.payment_channel = PaymentChannel::Online;
        assert_eq!(extractor.extract(&tx, &[]).is_card_not_present(), 1.0);

        tx.payment_channel = PaymentChannel::InStore;
        assert_eq!(extractor.extract(&tx, &[]).is_card_not_present(), 0.0);
    }

    #[test]
    fn test_velocity_nesting_over_random_histories() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let extractor = FeatureExtractor::new();
        let now = base_time();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            let tx = tx_at(rng.gen_range(0.0..500.0), "Shop", now);
            let history: Vec<HistoryRecord> = (0..rng.gen_range(0..30))
                .map(|_| {
                    HistoryRecord::new(
                        rng.gen_range(0.0..500.0),
                        "Shop",
                        now - Duration::minutes(rng.gen_range(-1_000..20_000)),
                    )
                })
                .collect();

            let features = extractor.extract(&tx, &history);
            assert!(features.velocity_1h() <= features.velocity_24h());
            assert!(features.velocity_24h() <= features.velocity_7d());
        }
    }
}
