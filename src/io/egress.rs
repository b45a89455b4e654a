//! Event egress - writes recorded attendance events to file
//!
//! Events are written in JSONL format (one JSON object per line)
//! to the file specified in config.

use crate::domain::event::AttendanceEvent;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::{debug, error, info};

/// Egress writer for attendance events
pub struct Egress {
    file_path: String,
}

impl Egress {
    pub fn new(file_path: &str) -> Self {
        info!(file_path = %file_path, "egress_initialized");
        Self { file_path: file_path.to_string() }
    }

    /// Write an event to the egress file
    /// Returns true if successful, false otherwise
    pub fn write_event(&self, event: &AttendanceEvent) -> bool {
        let json = event.to_json();

        match self.append_line(&json) {
            Ok(()) => {
                debug!(
                    id = %event.id,
                    subject = %event.subject_name,
                    kind = %event.kind.as_str(),
                    "event_egressed"
                );
                true
            }
            Err(e) => {
                error!(
                    id = %event.id,
                    error = %e,
                    "event_egress_failed"
                );
                false
            }
        }
    }

    /// Append a line to the egress file
    fn append_line(&self, line: &str) -> std::io::Result<()> {
        let path = Path::new(&self.file_path);

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        writeln!(file, "{}", line)?;

        Ok(())
    }

    /// Write multiple events
    pub fn write_events(&self, events: &[AttendanceEvent]) -> usize {
        let mut success_count = 0;
        for event in events {
            if self.write_event(event) {
                success_count += 1;
            }
        }
        success_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::EventKind;
    use std::fs;
    use tempfile::tempdir;

    fn sample_event() -> AttendanceEvent {
        AttendanceEvent::new("sid-1", "Ali", 1736012345678, EventKind::Entry, 0.9)
    }

    #[test]
    fn test_egress_new() {
        let egress = Egress::new("test.jsonl");
        assert_eq!(egress.file_path, "test.jsonl");
    }

    #[test]
    fn test_write_event() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("events.jsonl");
        let file_str = file_path.to_str().unwrap();

        let egress = Egress::new(file_str);
        let event = sample_event();

        assert!(egress.write_event(&event));

        let content = fs::read_to_string(&file_path).unwrap();
        assert!(!content.is_empty());
        assert!(content.contains(&event.id));
        assert!(content.ends_with('\n'));

        let parsed: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(parsed["id"], event.id);
        assert_eq!(parsed["name"], "Ali");
        assert_eq!(parsed["kind"], "entry");
    }

    #[test]
    fn test_write_events_batch() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("events.jsonl");
        let file_str = file_path.to_str().unwrap();

        let egress = Egress::new(file_str);
        let events: Vec<AttendanceEvent> = (0..5).map(|_| sample_event()).collect();

        let count = egress.write_events(&events);
        assert_eq!(count, 5);

        let content = fs::read_to_string(&file_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 5);

        for line in lines {
            let _parsed: serde_json::Value = serde_json::from_str(line).unwrap();
        }
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let nested_path = dir.path().join("nested").join("dir").join("events.jsonl");
        let file_str = nested_path.to_str().unwrap();

        let egress = Egress::new(file_str);

        assert!(egress.write_event(&sample_event()));
        assert!(nested_path.exists());
    }

    #[test]
    fn test_append_mode() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("events.jsonl");
        let file_str = file_path.to_str().unwrap();

        fs::write(&file_path, "{\"existing\":\"data\"}\n").unwrap();

        let egress = Egress::new(file_str);
        let event = sample_event();
        egress.write_event(&event);

        let content = fs::read_to_string(&file_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("existing"));
        assert!(lines[1].contains(&event.id));
    }
}
