//! Infrastructure - configuration, state store, and metrics
//!
//! This module contains infrastructure concerns:
//! - `config` - application configuration (TOML loading, defaults)
//! - `store` - persisted application state (roster, events, camera)
//! - `metrics` - lock-free metrics collection

pub mod config;
pub mod metrics;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use metrics::Metrics;
pub use store::Store;
