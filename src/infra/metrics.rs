//! Lock-free metrics collection and periodic reporting
//!
//! Uses atomics for hot-path operations to avoid mutex contention.
//!
//! NOTE: All atomics use Relaxed ordering intentionally—these are statistical
//! counters only. Do NOT use these atomics for coordination or logic decisions.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Lock-free metrics collector
///
/// All counters are monotonic; `report()` reads a consistent-enough snapshot
/// for logging and egress.
pub struct Metrics {
    /// Frames handed to the recognizer
    frames: AtomicU64,
    /// Frames that produced a recognition
    detections: AtomicU64,
    /// Recognitions discarded below the confidence threshold
    below_threshold: AtomicU64,
    /// Attendance events appended to the store
    events_recorded: AtomicU64,
    /// CSV reports written
    exports_written: AtomicU64,
    started_at: Instant,
}

/// Snapshot of the counters for logging
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub uptime_secs: u64,
    pub frames: u64,
    pub detections: u64,
    pub below_threshold: u64,
    pub events_recorded: u64,
    pub exports_written: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            uptime_secs = %self.uptime_secs,
            frames = %self.frames,
            detections = %self.detections,
            below_threshold = %self.below_threshold,
            events_recorded = %self.events_recorded,
            exports_written = %self.exports_written,
            "metrics_summary"
        );
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            frames: AtomicU64::new(0),
            detections: AtomicU64::new(0),
            below_threshold: AtomicU64::new(0),
            events_recorded: AtomicU64::new(0),
            exports_written: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    #[inline]
    pub fn inc_frames(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_detections(&self) {
        self.detections.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_below_threshold(&self) {
        self.below_threshold.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_events(&self) {
        self.events_recorded.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_exports(&self) {
        self.exports_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn report(&self) -> MetricsSummary {
        MetricsSummary {
            uptime_secs: self.started_at.elapsed().as_secs(),
            frames: self.frames.load(Ordering::Relaxed),
            detections: self.detections.load(Ordering::Relaxed),
            below_threshold: self.below_threshold.load(Ordering::Relaxed),
            events_recorded: self.events_recorded.load(Ordering::Relaxed),
            exports_written: self.exports_written.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let report = Metrics::new().report();
        assert_eq!(report.frames, 0);
        assert_eq!(report.detections, 0);
        assert_eq!(report.below_threshold, 0);
        assert_eq!(report.events_recorded, 0);
        assert_eq!(report.exports_written, 0);
    }

    #[test]
    fn test_increments_visible_in_report() {
        let metrics = Metrics::new();

        metrics.inc_frames();
        metrics.inc_frames();
        metrics.inc_detections();
        metrics.inc_below_threshold();
        metrics.inc_events();
        metrics.inc_exports();

        let report = metrics.report();
        assert_eq!(report.frames, 2);
        assert_eq!(report.detections, 1);
        assert_eq!(report.below_threshold, 1);
        assert_eq!(report.events_recorded, 1);
        assert_eq!(report.exports_written, 1);
    }

    #[test]
    fn test_summary_serializes() {
        let metrics = Metrics::new();
        metrics.inc_frames();

        let json = serde_json::to_value(metrics.report()).unwrap();
        assert_eq!(json["frames"], 1);
    }
}
