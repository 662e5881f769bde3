//! Risk Scoring Pipeline - Main Entry Point
//!
//! Consumes score requests from NATS, runs the scoring pipeline against the
//! loaded model bundle, and publishes score results. Supports parallel
//! request processing for high throughput.

use anyhow::Result;
use futures::StreamExt;
use risk_scoring_pipeline::{
    config::AppConfig,
    consumer::ScoreRequestConsumer,
    error::ScoreError,
    metrics::{MetricsReporter, PipelineMetrics},
    models::{ModelLoader, ModelStore},
    producer::ScoreResultProducer,
    scoring::ScoringEngine,
    types::ScoreRequest,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("risk_scoring_pipeline=info".parse()?),
        )
        .init();

    info!("Starting Risk Scoring Pipeline");

    // Load configuration
    let config = AppConfig::load()?;
    info!("Configuration loaded successfully");
    info!(
        "Action thresholds: challenge>={}, flag>={}",
        config.scoring.action_thresholds.challenge, config.scoring.action_thresholds.flag
    );

    // Initialize metrics
    let metrics = Arc::new(PipelineMetrics::new());

    // Load the model bundle eagerly, before accepting traffic. The store
    // is install-once; requests arriving before this point would see
    // ModelUnavailable.
    let store = Arc::new(ModelStore::new());
    let loader = ModelLoader::with_threads(config.model.onnx_threads)?;
    let bundle = loader.load_bundle(&config.model.bundle_dir)?;
    store.install(Arc::new(bundle))?;
    info!(bundle_dir = %config.model.bundle_dir, "Model bundle installed");

    // Initialize the scoring engine
    let engine = Arc::new(ScoringEngine::new(&config.scoring, store));

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    // Initialize consumer and producer
    let consumer = ScoreRequestConsumer::new(client.clone(), &config.nats.request_subject);
    let producer = Arc::new(ScoreResultProducer::new(
        client.clone(),
        &config.nats.result_subject,
    ));

    let num_workers = config.pipeline.workers;
    info!(
        "Starting request processing loop with {} parallel workers",
        num_workers
    );
    info!("Listening on subject: {}", config.nats.request_subject);
    info!("Publishing results to: {}", config.nats.result_subject);

    // Semaphore to limit concurrent processing
    let semaphore = Arc::new(Semaphore::new(num_workers));
    let processed_count = Arc::new(AtomicU64::new(0));

    // Start metrics reporter (prints summary every 30 seconds)
    let metrics_clone = metrics.clone();
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, 30);
        reporter.start().await;
    });

    // Process requests in parallel
    let mut subscription = consumer.subscribe().await?;

    while let Some(message) = subscription.next().await {
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };

        let engine = engine.clone();
        let producer = producer.clone();
        let metrics = metrics.clone();
        let processed_count = processed_count.clone();

        tokio::spawn(async move {
            let start_time = Instant::now();

            let request = match serde_json::from_slice::<ScoreRequest>(&message.payload) {
                Ok(request) => request,
                Err(e) => {
                    let err = ScoreError::MalformedInput(e.to_string());
                    metrics.record_malformed();
                    warn!(error = %err, "Rejected score request");
                    drop(permit);
                    return;
                }
            };

            match engine.score_transaction(
                &request.user_id,
                &request.transaction,
                &request.history,
            ) {
                Ok(result) => {
                    let processing_time = start_time.elapsed();
                    let action = format!("{:?}", result.recommended_action).to_lowercase();
                    metrics.record_scored(processing_time, result.score, &action);

                    // Request/reply scoring when the message carries a
                    // reply subject
                    let publish_result = match message.reply {
                        Some(reply) => producer.publish_to(reply, &result).await,
                        None => producer.publish(&result).await,
                    };

                    if let Err(e) = publish_result {
                        error!(
                            user_id = %result.user_id,
                            error = %e,
                            "Failed to publish score result"
                        );
                    } else {
                        debug!(
                            user_id = %result.user_id,
                            score = result.score,
                            action = %action,
                            processing_time_us = processing_time.as_micros(),
                            "Score result published"
                        );
                    }

                    let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
                    if count % 100 == 0 {
                        let throughput = metrics.get_throughput();
                        let processing_stats = metrics.get_processing_stats();
                        info!(
                            processed = count,
                            throughput = format!("{:.1} req/s", throughput),
                            avg_latency_us = processing_stats.mean_us,
                            "Processing milestone"
                        );
                    }
                }
                Err(e) => {
                    error!(
                        user_id = %request.user_id,
                        error = %e,
                        "Scoring failed"
                    );
                }
            }

            drop(permit);
        });
    }

    info!("Pipeline shutting down...");
    metrics.print_summary();

    Ok(())
}
