//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use crate::scanner::{ProbeOutcome, ScanReport, ToolArtifacts};
use console::{style, Style};
use std::io::{self, Write};
use std::path::Path;

const RULE: &str = "═══════════════════════════════════════════════════════════════════════";
const THIN_RULE: &str = "───────────────────────────────────────────────────────────────────────";

/// Write the summary table.
pub fn write_plain<W: Write>(out: &mut W, report: &ScanReport) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out, "                      {} Results", style("portrecon").cyan().bold())?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;

    writeln!(out, "  {} {}", style("Run ID:").bold(), style(report.run.short()).dim())?;
    writeln!(out, "  {} {}", style("Output:").bold(), report.output_dir.display())?;
    writeln!(
        out,
        "  {} {} targets in {:.2}s",
        style("Statistics:").bold(),
        report.total,
        report.duration_ms as f64 / 1000.0
    )?;
    writeln!(
        out,
        "              {} open, {} closed, {} errors",
        style(report.open).green().bold(),
        style(report.closed).red(),
        style(report.errors).yellow()
    )?;
    writeln!(out)?;

    if report.results.is_empty() {
        writeln!(out, "  {}", style("No targets to display.").dim())?;
        return Ok(());
    }

    writeln!(out, "  {}", style(THIN_RULE).dim())?;
    writeln!(
        out,
        "  {:<28}  {:<6}  {}",
        style("TARGET").bold(),
        style("STATE").bold(),
        style("DETAIL").bold()
    )?;
    writeln!(out, "  {}", style(THIN_RULE).dim())?;

    for result in &report.results {
        let state_style = match result.outcome {
            ProbeOutcome::Open(_) => Style::new().green().bold(),
            ProbeOutcome::Closed(_) => Style::new().red(),
            ProbeOutcome::Error(_) => Style::new().yellow(),
        };

        writeln!(
            out,
            "  {:<28}  {:<6}  {}",
            truncate_string(&result.target.to_string(), 28),
            state_style.apply_to(result.outcome.label()),
            truncate_string(&result.outcome.detail_text(), 60)
        )?;

        let extra = result.outcome.extra();
        if !extra.is_empty() {
            writeln!(out, "  {:<28}  {:<6}  {}", "", "", style(truncate_string(extra, 60)).dim())?;
        }
        if !result.artifacts.is_empty() {
            writeln!(out, "  {:<28}  {:<6}  {}", "", "", style(artifact_list(&result.artifacts)).dim())?;
        }
        if let Some(error) = &result.error {
            writeln!(out, "  {:<28}  {:<6}  {}", "", "", style(error).yellow())?;
        }
    }

    writeln!(out, "  {}", style(THIN_RULE).dim())?;
    writeln!(out)?;
    Ok(())
}

/// Print a header before scanning begins.
pub fn print_scan_header(targets: usize, concurrency: usize, output_dir: &Path) {
    println!();
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("portrecon").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(
        "{} Targets: {} (concurrency {})",
        style("•").dim(),
        style(targets).white().bold(),
        concurrency
    );
    println!("{} Output: {}", style("•").dim(), output_dir.display());
    println!();
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

fn artifact_list(artifacts: &ToolArtifacts) -> String {
    let mut names: Vec<String> = [&artifacts.nmap, &artifacts.httpx, &artifacts.ffuf]
        .into_iter()
        .filter_map(|path| path.as_deref())
        .map(|path| ToolArtifacts::file_name(Some(path)))
        .collect();
    if !artifacts.sqlmap.is_empty() {
        names.push(artifacts.sqlmap_names());
    }
    names.join(", ")
}

/// Truncate to `max_len` characters, adding an ellipsis if truncated.
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
