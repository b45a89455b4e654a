//! IO modules - file interfaces
//!
//! This module contains all external IO operations:
//! - `egress` - event output to file (JSONL format)
//! - `export` - CSV attendance report rendering

pub mod egress;
pub mod export;

// Re-export commonly used types
pub use egress::Egress;
pub use export::{report_file_name, CsvReport, ReportRow};
