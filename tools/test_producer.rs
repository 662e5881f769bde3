//! Test Score Request Producer
//!
//! Generates and publishes synthetic score requests to NATS for pipeline
//! testing. Each request carries a transaction plus a plausible slice of
//! account history.

use chrono::{Duration, Utc};
use rand::Rng;
use risk_scoring_pipeline::types::{
    transaction::PaymentChannel, HistoryRecord, ScoreRequest, Transaction,
};
use tracing::{info, warn};

const MERCHANTS: &[&str] = &[
    "Coffee Hut",
    "Test Shop",
    "Corner Grocery",
    "City Transit",
    "Pizza Palace",
    "Book Nook",
];

const CATEGORIES: &[&str] = &["Shops", "Restaurants", "Travel", "Entertainment", "Service"];

/// Score request generator for testing
struct RequestGenerator {
    rng: rand::rngs::ThreadRng,
    request_counter: u64,
}

impl RequestGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            request_counter: 0,
        }
    }

    /// Generate a request with an ordinary-looking transaction: a known
    /// merchant, an amount near the history average, in-store.
    fn generate_legitimate(&mut self) -> ScoreRequest {
        self.request_counter += 1;
        let now = Utc::now();

        let merchant = self.random_choice(MERCHANTS);
        let history = self.generate_history(merchant, 8);
        let avg: f64 =
            history.iter().map(|h| h.amount).sum::<f64>() / history.len().max(1) as f64;

        let mut tx = Transaction::new(
            avg * self.rng.gen_range(0.5..1.8),
            merchant,
            vec![self.random_choice(CATEGORIES).to_string()],
        );
        tx.transaction_id = Some(format!("tx_{:012}", self.request_counter));
        tx.payment_channel = if self.rng.gen_bool(0.4) {
            PaymentChannel::Online
        } else {
            PaymentChannel::InStore
        };
        tx.timestamp = now;

        ScoreRequest {
            user_id: format!("user_{}", self.rng.gen_range(1..500)),
            transaction: tx,
            history,
        }
    }

    /// Generate a suspicious request: new merchant, amount far above the
    /// history average, online, risky category, rapid recent activity.
    fn generate_suspicious(&mut self) -> ScoreRequest {
        self.request_counter += 1;
        let now = Utc::now();

        let history_merchant = self.random_choice(MERCHANTS);
        let mut history = self.generate_history(history_merchant, 5);
        // Burst of recent activity to push the velocity features up
        for minutes in [5, 20, 45] {
            history.push(HistoryRecord::new(
                self.rng.gen_range(10.0..60.0),
                history_merchant,
                now - Duration::minutes(minutes),
            ));
        }

        let mut tx = Transaction::new(
            self.rng.gen_range(800.0..5000.0),
            "Unseen Vendor Ltd",
            vec!["Travel".to_string()],
        );
        tx.transaction_id = Some(format!("tx_{:012}", self.request_counter));
        tx.payment_channel = PaymentChannel::Online;
        tx.timestamp = now;

        ScoreRequest {
            user_id: format!("user_{}", self.rng.gen_range(1..500)),
            transaction: tx,
            history,
        }
    }

    fn generate_history(&mut self, merchant: &str, count: usize) -> Vec<HistoryRecord> {
        (0..count)
            .map(|_| {
                let name = if self.rng.gen_bool(0.5) {
                    merchant
                } else {
                    self.random_choice(MERCHANTS)
                };
                let mut record = HistoryRecord::new(
                    self.rng.gen_range(5.0..150.0),
                    name,
                    Utc::now() - Duration::hours(self.rng.gen_range(1..24 * 30)),
                );
                record.category = vec![self.random_choice(CATEGORIES).to_string()];
                record
            })
            .collect()
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_producer=info".parse()?),
        )
        .init();

    info!("Starting Test Score Request Producer");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("score.requests");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let fraud_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.1);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        fraud_rate = fraud_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    // Connect to NATS
    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, fraud_rate, delay_ms).await;
        }
    };

    // Generate and publish requests
    let mut generator = RequestGenerator::new();
    let mut rng = rand::thread_rng();

    info!("Starting to publish {} score requests...", count);

    let mut legitimate_count = 0;
    let mut suspicious_count = 0;

    for i in 0..count {
        let request = if rng.gen_bool(fraud_rate) {
            suspicious_count += 1;
            generator.generate_suspicious()
        } else {
            legitimate_count += 1;
            generator.generate_legitimate()
        };

        let payload = serde_json::to_vec(&request)?;

        client.publish(subject.to_string(), payload.into()).await?;

        if (i + 1) % 10 == 0 {
            info!(
                "Published {}/{} requests ({} legitimate, {} suspicious)",
                i + 1,
                count,
                legitimate_count,
                suspicious_count
            );
        }

        tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Published {} requests ({} legitimate, {} suspicious)",
        count, legitimate_count, suspicious_count
    );

    Ok(())
}

async fn run_dry_mode(count: u64, fraud_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = RequestGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let request = if rng.gen_bool(fraud_rate) {
            generator.generate_suspicious()
        } else {
            generator.generate_legitimate()
        };

        let json = serde_json::to_string_pretty(&request)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample request {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
