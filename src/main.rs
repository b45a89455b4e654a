//! Attendance PoC - headless capture service
//!
//! Runs the recognizer-driven capture loop against the configured store and
//! reports daily attendance statistics periodically.
//!
//! Module structure:
//! - `domain/` - Core business types (AttendanceEvent, Subject, CameraSettings)
//! - `io/` - File interfaces (JSONL egress, CSV export)
//! - `services/` - Business logic (Aggregator, CaptureWorker, Recognizer, Access)
//! - `infra/` - Infrastructure (Config, Store, Metrics)

use attendance_poc::infra::{Config, Metrics, Store};
use attendance_poc::io::Egress;
use attendance_poc::services::{aggregator, CaptureWorker, SimulatedRecognizer};
use chrono::Local;
use clap::Parser;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Attendance PoC - face recognition attendance capture service
#[derive(Parser, Debug)]
#[command(name = "attendance-poc", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    // Default: INFO, use RUST_LOG=debug for full frame visibility
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), git = env!("GIT_HASH"), "attendance-poc starting");

    // Parse command line arguments using clap
    let args = Args::parse();

    // Load configuration from TOML file
    let config = Config::load_from_path(&args.config);

    info!(
        config_file = %config.config_file(),
        site = %config.site_id(),
        store_file = %config.store_file(),
        egress_file = %config.egress_file(),
        capture_interval_ms = %config.capture_interval_ms(),
        detection_rate = %config.detection_rate(),
        confidence_threshold = %config.camera().confidence_threshold,
        "config_loaded"
    );

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Create shared components
    let store = Arc::new(Store::load(config.store_file()));
    store.set_camera_if_default(config.camera());
    let metrics = Arc::new(Metrics::new());

    // Start stats reporter: today's summary plus counter snapshot
    let stats_store = store.clone();
    let stats_metrics = metrics.clone();
    let stats_interval = config.metrics_interval_secs();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(stats_interval));
        loop {
            interval.tick().await;
            let events = stats_store.events_snapshot();
            let now = Local::now();
            let summary = aggregator::summarize(&events, &now);
            info!(
                entries = %summary.entry_count,
                exits = %summary.exit_count,
                avg_confidence = %format!("{:.2}", summary.average_confidence),
                total_events = %events.len(),
                "daily_summary"
            );
            stats_metrics.report().log();
        }
    });

    // Handle shutdown on Ctrl+C
    let shutdown_signal = shutdown_tx;
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_signal.send(true);
    });

    // Run capture worker - processes frames until shutdown
    let recognizer = Box::new(SimulatedRecognizer::new(config.detection_rate()));
    let egress = Egress::new(config.egress_file());
    let worker = CaptureWorker::new(
        store,
        recognizer,
        Some(egress),
        metrics,
        config.capture_interval_ms(),
    );
    info!("capture_worker_started");

    worker.run(shutdown_rx).await;

    info!("attendance-poc shutdown complete");
    Ok(())
}
