//! Attendance Report - offline reporting tool
//!
//! Loads the persisted store, runs the aggregation engine over a snapshot,
//! prints the daily summary and traffic tables, and writes the filtered
//! listing as a CSV export. Designed to run alongside or instead of the
//! capture service.
//!
//! Usage:
//!   attendance-report --config config/dev.toml
//!   attendance-report --search ali --sort-field name --sort-order asc
//!   attendance-report --days 14 --out-dir /tmp/reports

use anyhow::Context;
use attendance_poc::infra::{Config, Store};
use attendance_poc::io::{report_file_name, CsvReport};
use attendance_poc::services::aggregator::{
    self, ListQuery, SortField, SortOrder,
};
use chrono::Local;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Attendance Report - offline reporting for attendance-poc
#[derive(Parser, Debug)]
#[command(name = "attendance-report", version, about, long_about = None)]
struct Args {
    /// Path to TOML configuration file
    ///
    /// Uses the same format as attendance-poc config. Only the store and
    /// export sections are used.
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,

    /// Filter term: case-insensitive against names, raw against subject ids
    #[arg(short, long, default_value = "")]
    search: String,

    /// Sort field: timestamp | name
    #[arg(long, default_value = "timestamp")]
    sort_field: String,

    /// Sort order: asc | desc
    #[arg(long, default_value = "desc")]
    sort_order: String,

    /// Days of history in the per-day traffic table
    #[arg(short, long, default_value = "7")]
    days: u32,

    /// Output directory for the CSV report
    ///
    /// Defaults to the export dir from config.
    #[arg(short, long)]
    out_dir: Option<String>,

    /// Print tables only, skip writing the CSV file
    #[arg(long)]
    no_csv: bool,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    let sort_field: SortField =
        args.sort_field.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let sort_order: SortOrder =
        args.sort_order.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let store = Store::load(config.store_file());
    let events = store.events_snapshot();
    let now = Local::now();

    info!(
        store_file = %config.store_file(),
        events = %events.len(),
        search = %args.search,
        "report_input_loaded"
    );

    // Daily summary
    let summary = aggregator::summarize(&events, &now);
    println!("Attendance report for {} ({} events on file)", now.format("%Y-%m-%d"), events.len());
    println!();
    println!(
        "Today: {} entries, {} exits, avg confidence {}%",
        summary.entry_count,
        summary.exit_count,
        (summary.average_confidence * 100.0).round() as u32
    );

    // Per-day traffic table
    println!();
    println!("{:<12} {:>8} {:>8}", "Date", "Entries", "Exits");
    for bucket in aggregator::bucket_by_day(&events, &now, args.days) {
        println!(
            "{:<12} {:>8} {:>8}",
            bucket.date.format("%Y-%m-%d"),
            bucket.entry_count,
            bucket.exit_count
        );
    }

    // Busy hours
    let hourly = aggregator::bucket_by_hour_of_day(&events, &now);
    if !hourly.is_empty() {
        println!();
        println!("Busy hours today:");
        for bucket in hourly {
            println!("  {:>2}:00  {}", bucket.hour, bucket.count);
        }
    }

    // Filtered listing -> CSV export
    let query = ListQuery { search_term: args.search.clone(), sort_field, sort_order };
    let listing = aggregator::filter_and_sort(&events, &query);

    println!();
    println!("{} records match the filter", listing.len());

    if !args.no_csv {
        let out_dir = args.out_dir.unwrap_or_else(|| config.export_dir().to_string());
        let path = PathBuf::from(out_dir).join(report_file_name(now.date_naive()));

        CsvReport::from_events(&listing, &now)
            .write_to(&path)
            .with_context(|| format!("Failed to export report to {}", path.display()))?;

        println!("Report written to {}", path.display());
    }

    Ok(())
}
