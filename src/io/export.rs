//! CSV attendance report rendering
//!
//! Consumes an ordered event listing (the aggregator's output) and
//! serializes it to a spreadsheet-friendly CSV file. All display
//! formatting - timestamps, kind labels, confidence percentages - happens
//! here; the aggregator hands over plain data only.

use crate::domain::event::AttendanceEvent;
use anyhow::Context;
use chrono::{DateTime, NaiveDate, TimeZone};
use std::fs;
use std::path::Path;
use tracing::info;

/// One formatted report line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub name: String,
    pub subject_id: String,
    /// `YYYY/MM/DD HH:MM:SS` in the reporting time zone
    pub timestamp: String,
    pub kind: String,
    /// Rounded percentage, e.g. "93%"
    pub confidence: String,
}

impl ReportRow {
    /// Format an event for the report. The reporting time zone comes from
    /// `reference`, matching the aggregator's convention.
    pub fn from_event<Tz: TimeZone>(event: &AttendanceEvent, reference: &DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        let timestamp = i64::try_from(event.timestamp_ms)
            .ok()
            .and_then(|ts| reference.timezone().timestamp_millis_opt(ts).single())
            .map(|dt| dt.format("%Y/%m/%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());

        Self {
            name: event.subject_name.clone(),
            subject_id: event.subject_id.clone(),
            timestamp,
            kind: event.kind.as_str().to_string(),
            confidence: format!("{}%", (event.confidence * 100.0).round() as u32),
        }
    }
}

/// CSV report builder
#[derive(Debug, Default)]
pub struct CsvReport {
    rows: Vec<ReportRow>,
}

impl CsvReport {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Build a report from an ordered listing, preserving its order
    pub fn from_events<Tz: TimeZone>(events: &[&AttendanceEvent], reference: &DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self { rows: events.iter().map(|e| ReportRow::from_event(e, reference)).collect() }
    }

    pub fn add_row(&mut self, row: ReportRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn header() -> &'static str {
        "name,subject_id,timestamp,kind,confidence"
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    /// Render the full CSV document
    pub fn render(&self) -> String {
        let mut out = String::from(Self::header());
        out.push('\n');

        for row in &self.rows {
            let fields = [
                Self::escape_field(&row.name),
                Self::escape_field(&row.subject_id),
                Self::escape_field(&row.timestamp),
                Self::escape_field(&row.kind),
                Self::escape_field(&row.confidence),
            ];
            out.push_str(&fields.join(","));
            out.push('\n');
        }

        out
    }

    /// Write the report to a file, creating parent directories as needed
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create report directory {}", parent.display())
                })?;
            }
        }

        fs::write(path, self.render())
            .with_context(|| format!("Failed to write report {}", path.display()))?;

        info!(path = %path.display(), rows = %self.rows.len(), "report_written");
        Ok(())
    }
}

/// Conventional report file name for a given date
pub fn report_file_name(date: NaiveDate) -> String {
    format!("attendance-report-{}.csv", date.format("%Y-%m-%d"))
}
