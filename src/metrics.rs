//! Performance metrics and statistics tracking for the scoring pipeline.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for pipeline performance
pub struct PipelineMetrics {
    /// Total requests scored
    pub requests_scored: AtomicU64,
    /// Requests rejected as malformed
    pub requests_malformed: AtomicU64,
    /// Scored requests by recommended action
    actions_by_tier: RwLock<HashMap<String, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Score distribution buckets over [0, 100], 10 wide
    score_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

/// Processing time statistics in microseconds
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

impl PipelineMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            requests_scored: AtomicU64::new(0),
            requests_malformed: AtomicU64::new(0),
            actions_by_tier: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a scored request
    pub fn record_scored(&self, processing_time: Duration, score: u8, action: &str) {
        self.requests_scored.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only the most recent samples for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        let bucket = (score as usize / 10).min(9);
        if let Ok(mut buckets) = self.score_buckets.write() {
            buckets[bucket] += 1;
        }

        if let Ok(mut by_tier) = self.actions_by_tier.write() {
            *by_tier.entry(action.to_string()).or_insert(0) += 1;
        }
    }

    /// Record a payload that failed to decode
    pub fn record_malformed(&self) {
        self.requests_malformed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let times = match self.processing_times.read() {
            Ok(times) => times,
            Err(_) => return ProcessingStats::default(),
        };
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Get current throughput (requests per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.requests_scored.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get score distribution
    pub fn get_score_distribution(&self) -> [u64; 10] {
        self.score_buckets.read().map(|b| *b).unwrap_or([0; 10])
    }

    /// Get scored requests by action tier
    pub fn get_actions_by_tier(&self) -> HashMap<String, u64> {
        self.actions_by_tier
            .read()
            .map(|t| t.clone())
            .unwrap_or_default()
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let scored = self.requests_scored.load(Ordering::Relaxed);
        let malformed = self.requests_malformed.load(Ordering::Relaxed);
        let processing = self.get_processing_stats();
        let throughput = self.get_throughput();
        let by_tier = self.get_actions_by_tier();
        let score_dist = self.get_score_distribution();

        info!(
            scored = scored,
            malformed = malformed,
            throughput = format!("{:.1} req/s", throughput),
            "Pipeline metrics summary"
        );
        info!(
            mean_us = processing.mean_us,
            p50_us = processing.p50_us,
            p95_us = processing.p95_us,
            p99_us = processing.p99_us,
            "Processing time (us)"
        );

        for (tier, count) in &by_tier {
            let pct = if scored > 0 {
                (*count as f64 / scored as f64) * 100.0
            } else {
                0.0
            };
            info!(tier = %tier, count = count, pct = format!("{:.1}%", pct), "Actions by tier");
        }

        let total: u64 = score_dist.iter().sum();
        for (i, &count) in score_dist.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let pct = if total > 0 {
                (count as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            info!(
                bucket = format!("{}-{}", i * 10, i * 10 + 9),
                count = count,
                pct = format!("{:.1}%", pct),
                "Score distribution"
            );
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodically prints a metrics summary
pub struct MetricsReporter {
    metrics: Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    pub async fn start(&self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // First tick completes immediately; skip it
        interval.tick().await;

        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_scored_updates_buckets_and_tiers() {
        let metrics = PipelineMetrics::new();

        metrics.record_scored(Duration::from_micros(120), 67, "challenge");
        metrics.record_scored(Duration::from_micros(80), 12, "allow");
        metrics.record_scored(Duration::from_micros(95), 100, "flag");

        assert_eq!(metrics.requests_scored.load(Ordering::Relaxed), 3);

        let dist = metrics.get_score_distribution();
        assert_eq!(dist[6], 1);
        assert_eq!(dist[1], 1);
        // score 100 lands in the top bucket
        assert_eq!(dist[9], 1);

        let tiers = metrics.get_actions_by_tier();
        assert_eq!(tiers.get("challenge"), Some(&1));
        assert_eq!(tiers.get("allow"), Some(&1));
        assert_eq!(tiers.get("flag"), Some(&1));
    }

    #[test]
    fn test_processing_stats() {
        let metrics = PipelineMetrics::new();
        for us in [100u64, 200, 300, 400, 500] {
            metrics.record_scored(Duration::from_micros(us), 10, "allow");
        }

        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 5);
        assert_eq!(stats.mean_us, 300);
        assert_eq!(stats.max_us, 500);
    }
}
