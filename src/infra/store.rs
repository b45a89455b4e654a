//! Application state store with JSON file persistence
//!
//! Single owner of mutable state: the enrollment roster, the attendance
//! event log, and the camera settings. Readers take snapshots (clones) and
//! pass them to the aggregator; the aggregator never reaches into the
//! store. Every mutation is persisted to the configured file when one is
//! set, so a restart resumes from the last write.

use crate::domain::event::AttendanceEvent;
use crate::domain::types::{
    CameraSettings, CameraSettingsUpdate, Subject, MAX_SUBJECT_PHOTOS,
};
use anyhow::Context;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Persisted state document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreState {
    #[serde(default)]
    pub subjects: Vec<Subject>,
    /// Insertion order, oldest first
    #[serde(default)]
    pub events: Vec<AttendanceEvent>,
    #[serde(default)]
    pub camera: CameraSettings,
}

/// Partial subject update for roster edits
#[derive(Debug, Clone, Default)]
pub struct SubjectUpdate {
    pub name: Option<String>,
    pub employee_id: Option<String>,
    pub role: Option<String>,
    pub photos: Option<Vec<String>>,
}

/// Thread-safe state store
pub struct Store {
    state: RwLock<StoreState>,
    path: Option<PathBuf>,
}

impl Store {
    /// Store without persistence, for tests and ephemeral runs
    pub fn in_memory() -> Self {
        Self { state: RwLock::new(StoreState::default()), path: None }
    }

    /// Read the state document from a file
    fn read_state(path: &Path) -> anyhow::Result<StoreState> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read store file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse store file {}", path.display()))
    }

    /// Open a persisted store, starting empty when the file is missing or
    /// unreadable
    pub fn load(path: &str) -> Self {
        let path_buf = PathBuf::from(path);
        let state = match Self::read_state(&path_buf) {
            Ok(state) => {
                info!(
                    path = %path,
                    subjects = %state.subjects.len(),
                    events = %state.events.len(),
                    "store_loaded"
                );
                state
            }
            Err(e) => {
                warn!(path = %path, error = %e, "store_starting_empty");
                StoreState::default()
            }
        };

        Self { state: RwLock::new(state), path: Some(path_buf) }
    }

    /// Write the current state to the configured file, if any.
    ///
    /// Persistence failures are logged, not propagated; the in-memory state
    /// stays authoritative for the rest of the run.
    fn persist(&self, state: &StoreState) {
        let Some(path) = &self.path else {
            return;
        };

        let result = (|| -> anyhow::Result<()> {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create store directory {}", parent.display())
                    })?;
                }
            }
            let json = serde_json::to_string_pretty(state).context("Failed to encode store")?;
            fs::write(path, json)
                .with_context(|| format!("Failed to write store file {}", path.display()))
        })();

        if let Err(e) = result {
            error!(path = %path.display(), error = %e, "store_persist_failed");
        }
    }

    // Snapshots

    /// Point-in-time copy of the event log, insertion order
    pub fn events_snapshot(&self) -> Vec<AttendanceEvent> {
        self.state.read().events.clone()
    }

    /// Point-in-time copy of the enrollment roster
    pub fn subjects_snapshot(&self) -> Vec<Subject> {
        self.state.read().subjects.clone()
    }

    pub fn camera_settings(&self) -> CameraSettings {
        self.state.read().camera.clone()
    }

    // Event log

    /// Append an event. The only event mutation besides [`Self::clear_events`].
    pub fn append_event(&self, event: AttendanceEvent) {
        let mut state = self.state.write();
        state.events.push(event);
        self.persist(&state);
    }

    /// Bulk data-clearing; returns how many events were dropped
    pub fn clear_events(&self) -> usize {
        let mut state = self.state.write();
        let dropped = state.events.len();
        state.events.clear();
        self.persist(&state);
        info!(dropped = %dropped, "events_cleared");
        dropped
    }

    // Roster

    /// Enroll a subject and return the stored record
    pub fn add_subject(
        &self,
        name: &str,
        employee_id: &str,
        role: &str,
        photos: &[String],
    ) -> Subject {
        let subject = Subject::new(name, employee_id, role, photos);
        let mut state = self.state.write();
        state.subjects.push(subject.clone());
        self.persist(&state);
        info!(subject = %subject.name, id = %subject.id, "subject_enrolled");
        subject
    }

    /// Merge field updates into a subject; false when the id is unknown
    pub fn update_subject(&self, id: &str, update: SubjectUpdate) -> bool {
        let mut state = self.state.write();
        let Some(subject) = state.subjects.iter_mut().find(|s| s.id == id) else {
            return false;
        };

        if let Some(name) = update.name {
            subject.name = name;
        }
        if let Some(employee_id) = update.employee_id {
            subject.employee_id = employee_id;
        }
        if let Some(role) = update.role {
            subject.role = role;
        }
        if let Some(photos) = update.photos {
            subject.photos = photos.into_iter().take(MAX_SUBJECT_PHOTOS).collect();
        }

        self.persist(&state);
        true
    }

    /// Remove a subject by id; false when the id is unknown
    pub fn remove_subject(&self, id: &str) -> bool {
        let mut state = self.state.write();
        let before = state.subjects.len();
        state.subjects.retain(|s| s.id != id);
        let removed = state.subjects.len() < before;
        if removed {
            self.persist(&state);
            info!(id = %id, "subject_removed");
        }
        removed
    }

    // Camera

    pub fn update_camera(&self, update: CameraSettingsUpdate) {
        let mut state = self.state.write();
        state.camera.merge(update);
        self.persist(&state);
    }

    /// Seed camera settings from config without persisting defaults over a
    /// loaded file
    pub fn set_camera_if_default(&self, camera: &CameraSettings) {
        let mut state = self.state.write();
        if state.camera == CameraSettings::default() {
            state.camera = camera.clone();
        }
    }
}
