//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml

use crate::domain::types::{AccessRole, CameraSettings};
use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

/// Dashboard login account
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub role: AccessRole,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Unique site identifier (e.g., "hq", "warehouse")
    #[serde(default = "default_site_id")]
    pub id: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self { id: default_site_id() }
    }
}

fn default_site_id() -> String {
    "attendance".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    /// Milliseconds between capture frames
    #[serde(default = "default_capture_interval_ms")]
    pub interval_ms: u64,
    /// Probability a frame produces a detection (simulated backend)
    #[serde(default = "default_detection_rate")]
    pub detection_rate: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { interval_ms: default_capture_interval_ms(), detection_rate: default_detection_rate() }
    }
}

fn default_capture_interval_ms() -> u64 {
    2000
}

fn default_detection_rate() -> f64 {
    0.3
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// File path for the persisted state (JSON)
    #[serde(default = "default_store_file")]
    pub file: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { file: default_store_file() }
    }
}

fn default_store_file() -> String {
    "data/store.json".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct EgressConfig {
    /// File path for event egress (JSONL format)
    #[serde(default = "default_egress_file")]
    pub file: String,
}

impl Default for EgressConfig {
    fn default() -> Self {
        Self { file: default_egress_file() }
    }
}

fn default_egress_file() -> String {
    "events.jsonl".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Directory for CSV report output
    #[serde(default = "default_export_dir")]
    pub dir: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { dir: default_export_dir() }
    }
}

fn default_export_dir() -> String {
    "reports".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_interval_secs")]
    pub interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval_secs() }
    }
}

fn default_metrics_interval_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub camera: CameraSettings,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub egress: EgressConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub accounts: Vec<Account>,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    site_id: String,
    camera: CameraSettings,
    capture_interval_ms: u64,
    detection_rate: f64,
    store_file: String,
    egress_file: String,
    export_dir: String,
    metrics_interval_secs: u64,
    accounts: Vec<Account>,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_id: default_site_id(),
            camera: CameraSettings::default(),
            capture_interval_ms: default_capture_interval_ms(),
            detection_rate: default_detection_rate(),
            store_file: default_store_file(),
            egress_file: default_egress_file(),
            export_dir: default_export_dir(),
            metrics_interval_secs: default_metrics_interval_secs(),
            accounts: Self::default_accounts(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    fn default_accounts() -> Vec<Account> {
        vec![
            Account {
                username: "admin".to_string(),
                password: "admin123".to_string(),
                display_name: "System Manager".to_string(),
                role: AccessRole::Admin,
            },
            Account {
                username: "operator".to_string(),
                password: "op123".to_string(),
                display_name: "Operator".to_string(),
                role: AccessRole::Operator,
            },
        ]
    }

    /// Determine config file path from args or environment
    pub fn resolve_config_path(args: &[String]) -> String {
        // Check for --config argument
        for (i, arg) in args.iter().enumerate() {
            if arg == "--config" {
                if let Some(path) = args.get(i + 1) {
                    return path.clone();
                }
            }
            if let Some(path) = arg.strip_prefix("--config=") {
                return path.to_string();
            }
        }

        // Check CONFIG_FILE environment variable
        if let Ok(path) = env::var("CONFIG_FILE") {
            return path;
        }

        // Default to dev.toml
        "config/dev.toml".to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        let accounts = if toml_config.accounts.is_empty() {
            Self::default_accounts()
        } else {
            toml_config.accounts
        };

        let mut camera = toml_config.camera;
        camera.confidence_threshold = camera.confidence_threshold.clamp(0.0, 1.0);

        Ok(Self {
            site_id: toml_config.site.id,
            camera,
            capture_interval_ms: toml_config.capture.interval_ms.max(1),
            detection_rate: toml_config.capture.detection_rate.clamp(0.0, 1.0),
            store_file: toml_config.store.file,
            egress_file: toml_config.egress.file,
            export_dir: toml_config.export.dir,
            metrics_interval_secs: toml_config.metrics.interval_secs.max(1),
            accounts,
            config_file: path.display().to_string(),
        })
    }

    /// Load configuration - tries TOML file first, falls back to defaults
    pub fn load(args: &[String]) -> Self {
        Self::load_from_path(&Self::resolve_config_path(args))
    }

    /// Load configuration from an explicit path, falling back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {}. Using defaults.", e);
                Self::default()
            }
        }
    }

    // Getters for all config fields
    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn camera(&self) -> &CameraSettings {
        &self.camera
    }

    pub fn capture_interval_ms(&self) -> u64 {
        self.capture_interval_ms
    }

    pub fn detection_rate(&self) -> f64 {
        self.detection_rate
    }

    pub fn store_file(&self) -> &str {
        &self.store_file
    }

    pub fn egress_file(&self) -> &str {
        &self.egress_file
    }

    pub fn export_dir(&self) -> &str {
        &self.export_dir
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }
}
