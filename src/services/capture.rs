//! Capture worker - drives the recognizer and records attendance
//!
//! Polls the recognizer at the configured frame interval. Recognitions at
//! or above the camera's confidence threshold become attendance events:
//! appended to the store, written to egress, counted in metrics. The event
//! kind alternates per subject (first sighting is an entry, the next an
//! exit) instead of being guessed per frame.

use crate::domain::event::{epoch_ms, AttendanceEvent, EventKind};
use crate::infra::{Metrics, Store};
use crate::io::Egress;
use crate::services::recognizer::{FaceRecognizer, Frame};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Kind for a subject's next event given their last recorded one
#[inline]
fn next_kind(last: Option<EventKind>) -> EventKind {
    match last {
        Some(kind) => kind.toggled(),
        None => EventKind::Entry,
    }
}

/// Timer-driven capture loop
pub struct CaptureWorker {
    store: Arc<Store>,
    recognizer: Box<dyn FaceRecognizer>,
    egress: Option<Egress>,
    metrics: Arc<Metrics>,
    interval_ms: u64,
    frame_seq: u64,
    last_kind: FxHashMap<String, EventKind>,
}

impl CaptureWorker {
    pub fn new(
        store: Arc<Store>,
        recognizer: Box<dyn FaceRecognizer>,
        egress: Option<Egress>,
        metrics: Arc<Metrics>,
        interval_ms: u64,
    ) -> Self {
        Self {
            store,
            recognizer,
            egress,
            metrics,
            interval_ms: interval_ms.max(1),
            frame_seq: 0,
            last_kind: FxHashMap::default(),
        }
    }

    /// Run until the shutdown signal flips
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_ms = %self.interval_ms, "capture_started");
        let mut interval = tokio::time::interval(Duration::from_millis(self.interval_ms));

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick();
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!(frames = %self.frame_seq, "capture_stopped");
                        return;
                    }
                }
            }
        }
    }

    /// Process a single frame
    fn tick(&mut self) {
        self.frame_seq += 1;
        self.metrics.inc_frames();

        let subjects = self.store.subjects_snapshot();
        if subjects.is_empty() {
            return;
        }

        self.recognizer.sync_roster(&subjects);
        let frame = Frame { sequence: self.frame_seq, captured_at_ms: epoch_ms() };

        let Some(recognition) = self.recognizer.recognize(&frame) else {
            return;
        };
        self.metrics.inc_detections();

        let threshold = self.store.camera_settings().confidence_threshold;
        if recognition.confidence < threshold {
            self.metrics.inc_below_threshold();
            debug!(
                subject_id = %recognition.subject_id,
                confidence = %format!("{:.3}", recognition.confidence),
                threshold = %format!("{:.3}", threshold),
                "recognition_below_threshold"
            );
            return;
        }

        let Some(subject) = subjects.iter().find(|s| s.id == recognition.subject_id) else {
            warn!(subject_id = %recognition.subject_id, "recognition_unknown_subject");
            return;
        };

        let kind = next_kind(self.last_kind.get(&subject.id).copied());
        self.last_kind.insert(subject.id.clone(), kind);

        let event = AttendanceEvent::new(
            &subject.id,
            &subject.name,
            frame.captured_at_ms,
            kind,
            recognition.confidence,
        );

        if let Some(egress) = &self.egress {
            egress.write_event(&event);
        }

        info!(
            subject = %subject.name,
            kind = %kind.as_str(),
            confidence = %format!("{:.2}", event.confidence),
            "attendance_recorded"
        );

        self.store.append_event(event);
        self.metrics.inc_events();
    }
}
