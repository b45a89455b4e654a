//! Shared types for the attendance PoC

use crate::domain::event::{epoch_ms, new_uuid_v7};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Maximum number of enrollment photos kept per subject
pub const MAX_SUBJECT_PHOTOS: usize = 5;

/// Session role for access checks
///
/// Distinct from [`Subject::role`], which is a free-text job title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessRole {
    Admin,
    Operator,
}

impl AccessRole {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessRole::Admin => "admin",
            AccessRole::Operator => "operator",
        }
    }
}

impl std::str::FromStr for AccessRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(AccessRole::Admin),
            "operator" => Ok(AccessRole::Operator),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// An authenticated dashboard session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub name: String,
    pub role: AccessRole,
}

/// An enrolled person the recognizer can match against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    /// UUIDv7, assigned at enrollment
    pub id: String,
    pub name: String,
    pub employee_id: String,
    /// Free-text job title (e.g. "accountant")
    pub role: String,
    /// Enrollment photo paths, capped at [`MAX_SUBJECT_PHOTOS`]
    pub photos: SmallVec<[String; MAX_SUBJECT_PHOTOS]>,
    pub created_at_ms: u64,
}

impl Subject {
    /// Create a new subject with a fresh id and creation timestamp.
    ///
    /// Photos beyond the cap are discarded, oldest kept first.
    pub fn new(name: &str, employee_id: &str, role: &str, photos: &[String]) -> Self {
        let kept: SmallVec<[String; MAX_SUBJECT_PHOTOS]> =
            photos.iter().take(MAX_SUBJECT_PHOTOS).cloned().collect();
        Self {
            id: new_uuid_v7(),
            name: name.to_string(),
            employee_id: employee_id.to_string(),
            role: role.to_string(),
            photos: kept,
            created_at_ms: epoch_ms(),
        }
    }
}

/// Camera input selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraSource {
    Usb,
    Ip,
}

impl CameraSource {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraSource::Usb => "usb",
            CameraSource::Ip => "ip",
        }
    }
}

/// Capture resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
}

impl Resolution {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::P720 => "720p",
            Resolution::P1080 => "1080p",
        }
    }

    /// Pixel dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Resolution::P720 => (1280, 720),
            Resolution::P1080 => (1920, 1080),
        }
    }
}

/// Camera configuration, adjustable from the settings view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSettings {
    pub source: CameraSource,
    #[serde(default)]
    pub ip_address: Option<String>,
    pub resolution: Resolution,
    pub frame_rate: u32,
    /// Recognitions scoring below this are discarded
    pub confidence_threshold: f64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            source: CameraSource::Usb,
            ip_address: None,
            resolution: Resolution::P720,
            frame_rate: 30,
            confidence_threshold: 0.8,
        }
    }
}

impl CameraSettings {
    /// Apply partial updates, clamping the threshold into [0, 1]
    pub fn merge(&mut self, update: CameraSettingsUpdate) {
        if let Some(source) = update.source {
            self.source = source;
        }
        if let Some(ip_address) = update.ip_address {
            self.ip_address = Some(ip_address);
        }
        if let Some(resolution) = update.resolution {
            self.resolution = resolution;
        }
        if let Some(frame_rate) = update.frame_rate {
            self.frame_rate = frame_rate;
        }
        if let Some(threshold) = update.confidence_threshold {
            self.confidence_threshold = threshold.clamp(0.0, 1.0);
        }
    }
}

/// Partial camera settings update
#[derive(Debug, Clone, Default)]
pub struct CameraSettingsUpdate {
    pub source: Option<CameraSource>,
    pub ip_address: Option<String>,
    pub resolution: Option<Resolution>,
    pub frame_rate: Option<u32>,
    pub confidence_threshold: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_role_from_str() {
        assert_eq!("admin".parse::<AccessRole>().unwrap(), AccessRole::Admin);
        assert_eq!("operator".parse::<AccessRole>().unwrap(), AccessRole::Operator);
        assert!("root".parse::<AccessRole>().is_err());
    }

    #[test]
    fn test_subject_new() {
        let subject = Subject::new("Ali", "EMP-001", "accountant", &[]);

        assert_eq!(subject.id.len(), 36);
        assert_eq!(subject.name, "Ali");
        assert_eq!(subject.employee_id, "EMP-001");
        assert_eq!(subject.role, "accountant");
        assert!(subject.photos.is_empty());
        assert!(subject.created_at_ms > 0);
    }

    #[test]
    fn test_subject_photo_cap() {
        let photos: Vec<String> = (0..8).map(|i| format!("photo-{}.jpg", i)).collect();
        let subject = Subject::new("Ali", "EMP-001", "accountant", &photos);

        assert_eq!(subject.photos.len(), MAX_SUBJECT_PHOTOS);
        assert_eq!(subject.photos[0], "photo-0.jpg");
        assert_eq!(subject.photos[4], "photo-4.jpg");
    }

    #[test]
    fn test_camera_settings_defaults() {
        let settings = CameraSettings::default();

        assert_eq!(settings.source, CameraSource::Usb);
        assert!(settings.ip_address.is_none());
        assert_eq!(settings.resolution, Resolution::P720);
        assert_eq!(settings.frame_rate, 30);
        assert_eq!(settings.confidence_threshold, 0.8);
    }

    #[test]
    fn test_camera_settings_merge() {
        let mut settings = CameraSettings::default();
        settings.merge(CameraSettingsUpdate {
            source: Some(CameraSource::Ip),
            ip_address: Some("192.168.1.20".to_string()),
            resolution: Some(Resolution::P1080),
            frame_rate: None,
            confidence_threshold: Some(0.9),
        });

        assert_eq!(settings.source, CameraSource::Ip);
        assert_eq!(settings.ip_address.as_deref(), Some("192.168.1.20"));
        assert_eq!(settings.resolution, Resolution::P1080);
        assert_eq!(settings.frame_rate, 30);
        assert_eq!(settings.confidence_threshold, 0.9);
    }

    #[test]
    fn test_camera_settings_merge_clamps_threshold() {
        let mut settings = CameraSettings::default();
        settings.merge(CameraSettingsUpdate {
            confidence_threshold: Some(1.4),
            ..Default::default()
        });
        assert_eq!(settings.confidence_threshold, 1.0);
    }

    #[test]
    fn test_resolution_dimensions() {
        assert_eq!(Resolution::P720.dimensions(), (1280, 720));
        assert_eq!(Resolution::P1080.dimensions(), (1920, 1080));
    }
}
