//! Attendance event data model
//!
//! An event is a single recognized entry or exit occurrence. Events are
//! created once by the capture worker and never mutated afterwards; the
//! aggregator only derives views from them.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Generate a new UUIDv7 (time-sortable)
pub fn new_uuid_v7() -> String {
    Uuid::now_v7().to_string()
}

/// Get current epoch milliseconds
#[inline]
pub fn epoch_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Direction of an attendance event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Entry,
    Exit,
}

impl EventKind {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Entry => "entry",
            EventKind::Exit => "exit",
        }
    }

    /// The kind that follows this one for the same subject
    #[inline]
    pub fn toggled(&self) -> Self {
        match self {
            EventKind::Entry => EventKind::Exit,
            EventKind::Exit => EventKind::Entry,
        }
    }
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entry" => Ok(EventKind::Entry),
            "exit" => Ok(EventKind::Exit),
            other => Err(format!("unknown event kind: {}", other)),
        }
    }
}

/// A single recognized entry/exit occurrence
///
/// Immutable after creation. The collection is kept in insertion order;
/// newest-first is a display convention applied by callers, not a storage
/// invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceEvent {
    /// UUIDv7, unique for the lifetime of the collection
    pub id: String,
    pub subject_id: String,
    pub subject_name: String,
    /// Epoch milliseconds at which the recognition occurred
    pub timestamp_ms: u64,
    pub kind: EventKind,
    /// Recognition score in [0, 1]
    pub confidence: f64,
}

impl AttendanceEvent {
    /// Create a new event with a fresh UUIDv7 id.
    ///
    /// Confidence is clamped into [0, 1] so the invariant holds regardless
    /// of what the recognizer produced.
    pub fn new(
        subject_id: &str,
        subject_name: &str,
        timestamp_ms: u64,
        kind: EventKind,
        confidence: f64,
    ) -> Self {
        Self {
            id: new_uuid_v7(),
            subject_id: subject_id.to_string(),
            subject_name: subject_name.to_string(),
            timestamp_ms,
            kind,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Serialize to a single JSON line for egress
    pub fn to_json(&self) -> String {
        serde_json::json!({
            "id": self.id,
            "sid": self.subject_id,
            "name": self.subject_name,
            "ts": self.timestamp_ms,
            "kind": self.kind.as_str(),
            "conf": self.confidence,
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_event() {
        let event = AttendanceEvent::new("sid-1", "Ali", 1736012345678, EventKind::Entry, 0.91);

        assert!(!event.id.is_empty());
        assert_eq!(event.id.len(), 36);
        assert_eq!(event.subject_id, "sid-1");
        assert_eq!(event.subject_name, "Ali");
        assert_eq!(event.timestamp_ms, 1736012345678);
        assert_eq!(event.kind, EventKind::Entry);
        assert!((event.confidence - 0.91).abs() < f64::EPSILON);
    }

    #[test]
    fn test_confidence_clamped() {
        let high = AttendanceEvent::new("s", "n", 0, EventKind::Entry, 1.7);
        let low = AttendanceEvent::new("s", "n", 0, EventKind::Exit, -0.3);

        assert_eq!(high.confidence, 1.0);
        assert_eq!(low.confidence, 0.0);
    }

    #[test]
    fn test_event_ids_unique() {
        let a = AttendanceEvent::new("s", "n", 0, EventKind::Entry, 0.9);
        let b = AttendanceEvent::new("s", "n", 0, EventKind::Entry, 0.9);

        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_kind_round_trip() {
        assert_eq!("entry".parse::<EventKind>().unwrap(), EventKind::Entry);
        assert_eq!("exit".parse::<EventKind>().unwrap(), EventKind::Exit);
        assert!("lunch".parse::<EventKind>().is_err());
        assert_eq!(EventKind::Entry.as_str(), "entry");
        assert_eq!(EventKind::Exit.as_str(), "exit");
    }

    #[test]
    fn test_kind_toggled() {
        assert_eq!(EventKind::Entry.toggled(), EventKind::Exit);
        assert_eq!(EventKind::Exit.toggled(), EventKind::Entry);
    }

    #[test]
    fn test_to_json() {
        let event = AttendanceEvent::new("sid-7", "Sara", 1736012345678, EventKind::Exit, 0.85);
        let parsed: serde_json::Value = serde_json::from_str(&event.to_json()).unwrap();

        assert_eq!(parsed["id"], event.id);
        assert_eq!(parsed["sid"], "sid-7");
        assert_eq!(parsed["name"], "Sara");
        assert_eq!(parsed["ts"], 1736012345678_u64);
        assert_eq!(parsed["kind"], "exit");
        assert_eq!(parsed["conf"], 0.85);
    }

    #[test]
    fn test_serde_round_trip() {
        let event = AttendanceEvent::new("sid-1", "Ali", 42, EventKind::Entry, 0.9);
        let encoded = serde_json::to_string(&event).unwrap();
        let decoded: AttendanceEvent = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded, event);
    }
}
