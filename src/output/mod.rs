//! Output formatting module.
//!
//! Renders a finished `ScanReport` as a plain table, JSON or CSV, and styles
//! the live per-target lines printed while the scan runs.

mod csv_format;
mod json_format;
mod plain;

pub use csv_format::write_csv;
pub use json_format::write_json;
pub use plain::{
    print_error, print_info, print_scan_header, print_success, print_warning, write_plain,
};

use crate::cli::OutputFormat;
use crate::scanner::{ProbeOutcome, ScanReport, TargetResult};
use console::style;
use std::io::{self, Write};

/// Write a report to `out` in the requested format.
pub fn write_report<W: Write>(out: &mut W, report: &ScanReport, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Plain => plain::write_plain(out, report),
        OutputFormat::Json => json_format::write_json(out, report),
        OutputFormat::Csv => csv_format::write_csv(out, report),
    }
}

/// Print a report to stdout.
pub fn print_report(report: &ScanReport, format: OutputFormat) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, report, format)
}

/// `host:port -> STATUS | detail`, colored by outcome.
pub fn live_line(result: &TargetResult) -> String {
    let label = match &result.outcome {
        ProbeOutcome::Open(_) => style(result.outcome.label()).green().bold(),
        ProbeOutcome::Closed(_) => style(result.outcome.label()).red(),
        ProbeOutcome::Error(_) => style(result.outcome.label()).yellow().bold(),
    };
    format!("{} -> {} | {}", result.target, label, result.outcome.detail_text())
}
