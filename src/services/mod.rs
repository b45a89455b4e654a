//! Services - business logic
//!
//! This module contains the core business logic:
//! - `aggregator` - attendance aggregation and reporting engine
//! - `capture` - timer-driven capture loop recording attendance events
//! - `recognizer` - face recognizer capability seam and simulated backend
//! - `access` - role-based access checks and session authentication

pub mod access;
pub mod aggregator;
pub mod capture;
pub mod recognizer;

// Re-export commonly used types
pub use capture::CaptureWorker;
pub use recognizer::{FaceRecognizer, SimulatedRecognizer};
