//! Face recognizer capability seam
//!
//! The capture worker talks to a [`FaceRecognizer`], not to a model. The
//! shipped implementation is a simulator that stands in for a real
//! recognition backend: it picks an enrolled subject at random with a
//! configurable detection rate and emits confidences in the range a real
//! matcher would. A real implementation can be substituted without touching
//! the aggregator or the capture loop.

use crate::domain::types::Subject;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One captured frame handed to the recognizer
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    pub sequence: u64,
    pub captured_at_ms: u64,
}

/// A successful recognition
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub subject_id: String,
    /// Score in [0, 1]
    pub confidence: f64,
}

/// Capability interface for face recognition backends
pub trait FaceRecognizer: Send {
    /// Inform the backend about the current enrollment roster.
    ///
    /// Called before each frame so late enrollments are recognizable
    /// immediately. Backends with their own gallery may ignore this.
    fn sync_roster(&mut self, _subjects: &[Subject]) {}

    /// Attempt to recognize a face in the frame.
    fn recognize(&mut self, frame: &Frame) -> Option<Recognition>;
}

/// Probability that any given frame produces a detection
const DEFAULT_DETECTION_RATE: f64 = 0.3;

/// Simulated confidences are uniform in [floor, floor + span)
const CONFIDENCE_FLOOR: f64 = 0.80;
const CONFIDENCE_SPAN: f64 = 0.15;

/// Randomized stand-in for a recognition model
pub struct SimulatedRecognizer {
    subject_ids: Vec<String>,
    detection_rate: f64,
    rng: StdRng,
}

impl SimulatedRecognizer {
    pub fn new(detection_rate: f64) -> Self {
        Self::with_rng(detection_rate, StdRng::from_entropy())
    }

    /// Deterministic instance for tests
    pub fn with_seed(detection_rate: f64, seed: u64) -> Self {
        Self::with_rng(detection_rate, StdRng::seed_from_u64(seed))
    }

    fn with_rng(detection_rate: f64, rng: StdRng) -> Self {
        Self { subject_ids: Vec::new(), detection_rate: detection_rate.clamp(0.0, 1.0), rng }
    }
}

impl Default for SimulatedRecognizer {
    fn default() -> Self {
        Self::new(DEFAULT_DETECTION_RATE)
    }
}

impl FaceRecognizer for SimulatedRecognizer {
    fn sync_roster(&mut self, subjects: &[Subject]) {
        self.subject_ids = subjects.iter().map(|s| s.id.clone()).collect();
    }

    fn recognize(&mut self, _frame: &Frame) -> Option<Recognition> {
        if self.subject_ids.is_empty() {
            return None;
        }
        if self.rng.gen::<f64>() >= self.detection_rate {
            return None;
        }

        let index = self.rng.gen_range(0..self.subject_ids.len());
        let confidence = CONFIDENCE_FLOOR + self.rng.gen::<f64>() * CONFIDENCE_SPAN;

        Some(Recognition { subject_id: self.subject_ids[index].clone(), confidence })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subjects(n: usize) -> Vec<Subject> {
        (0..n).map(|i| Subject::new(&format!("Subject {}", i), "EMP", "staff", &[])).collect()
    }

    fn frame(sequence: u64) -> Frame {
        Frame { sequence, captured_at_ms: 1736012345678 }
    }

    #[test]
    fn test_empty_roster_never_detects() {
        let mut recognizer = SimulatedRecognizer::with_seed(1.0, 7);

        for i in 0..20 {
            assert!(recognizer.recognize(&frame(i)).is_none());
        }
    }

    #[test]
    fn test_zero_rate_never_detects() {
        let mut recognizer = SimulatedRecognizer::with_seed(0.0, 7);
        recognizer.sync_roster(&subjects(3));

        for i in 0..20 {
            assert!(recognizer.recognize(&frame(i)).is_none());
        }
    }

    #[test]
    fn test_full_rate_always_detects_known_subject() {
        let roster = subjects(3);
        let ids: Vec<&str> = roster.iter().map(|s| s.id.as_str()).collect();

        let mut recognizer = SimulatedRecognizer::with_seed(1.0, 7);
        recognizer.sync_roster(&roster);

        for i in 0..20 {
            let recognition = recognizer.recognize(&frame(i)).unwrap();
            assert!(ids.contains(&recognition.subject_id.as_str()));
            assert!(recognition.confidence >= CONFIDENCE_FLOOR);
            assert!(recognition.confidence < CONFIDENCE_FLOOR + CONFIDENCE_SPAN);
        }
    }

    #[test]
    fn test_seeded_runs_are_deterministic() {
        let roster = subjects(5);

        let run = |seed: u64| {
            let mut recognizer = SimulatedRecognizer::with_seed(0.5, seed);
            recognizer.sync_roster(&roster);
            (0..50).map(|i| recognizer.recognize(&frame(i))).collect::<Vec<_>>()
        };

        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_rate_clamped() {
        let recognizer = SimulatedRecognizer::with_seed(7.5, 1);
        assert_eq!(recognizer.detection_rate, 1.0);

        let recognizer = SimulatedRecognizer::with_seed(-0.5, 1);
        assert_eq!(recognizer.detection_rate, 0.0);
    }

    #[test]
    fn test_roster_resync_replaces_ids() {
        let mut recognizer = SimulatedRecognizer::with_seed(1.0, 7);
        recognizer.sync_roster(&subjects(2));

        let replacement = subjects(1);
        recognizer.sync_roster(&replacement);

        let recognition = recognizer.recognize(&frame(0)).unwrap();
        assert_eq!(recognition.subject_id, replacement[0].id);
    }
}
