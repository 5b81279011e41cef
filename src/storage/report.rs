//! TSV, CSV and JSON report files for one run.

use crate::error::{StorageError, StorageResult};
use crate::scanner::{ClassificationDetail, ProbeOutcome, ScanReport, TargetResult, ToolArtifacts};
use crate::types::RunId;
use csv::WriterBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const DEFAULT_BASE: &str = "recon_results";

const TSV_HEADER: [&str; 5] = ["host", "port", "outcome", "detail", "extra"];

const SUMMARY_HEADER: [&str; 9] = [
    "host",
    "port",
    "open",
    "banner",
    "nmap_ref",
    "httpx_ref",
    "ffuf_ref",
    "sqlmap_ref",
    "error",
];

/// `<base>_<stamp>` for a run.
pub fn run_directory(base: &Path, run: &RunId) -> PathBuf {
    match base.file_name() {
        Some(name) => base.with_file_name(format!("{}_{}", name.to_string_lossy(), run.stamp())),
        None => base.join(format!("{}_{}", DEFAULT_BASE, run.stamp())),
    }
}

/// Paths of the files written for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFiles {
    pub tsv: PathBuf,
    pub summary: PathBuf,
    pub json: PathBuf,
}

impl ReportFiles {
    /// All paths, in write order.
    pub fn paths(&self) -> [&Path; 3] {
        [&self.tsv, &self.summary, &self.json]
    }
}

/// Writes report files into a run directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
    stamp: String,
}

impl ReportWriter {
    /// Create the run directory.
    pub fn create(base: &Path, run: &RunId) -> StorageResult<Self> {
        let dir = run_directory(base, run);
        fs::create_dir_all(&dir).map_err(|e| StorageError::DirectoryError {
            path: dir.clone(),
            reason: e.to_string(),
        })?;
        info!(dir = %dir.display(), "created output directory");

        Ok(Self {
            dir,
            stamp: run.stamp(),
        })
    }

    /// The run directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write all report files.
    pub fn write(&self, report: &ScanReport) -> StorageResult<ReportFiles> {
        let files = ReportFiles {
            tsv: self.dir.join(format!("results_{}.tsv", self.stamp)),
            summary: self.dir.join(format!("results_summary_{}.csv", self.stamp)),
            json: self.dir.join(format!("report_{}.json", self.stamp)),
        };

        write_tsv(&files.tsv, &report.results)?;
        write_summary(&files.summary, &report.results)?;
        write_json(&files.json, report)?;

        info!(dir = %self.dir.display(), rows = report.results.len(), "reports written");
        Ok(files)
    }
}

/// Load a JSON report written by `ReportWriter`.
pub fn read_report(path: &Path) -> StorageResult<ScanReport> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn write_tsv(path: &Path, results: &[TargetResult]) -> StorageResult<()> {
    let mut writer = WriterBuilder::new().delimiter(b'\t').from_path(path)?;
    writer.write_record(TSV_HEADER)?;

    for result in results {
        writer.write_record([
            result.target.host.clone(),
            result.target.port.to_string(),
            result.outcome.label().to_string(),
            result.outcome.detail_text(),
            result.outcome.extra().to_string(),
        ])?;
    }

    writer.flush().map_err(|e| StorageError::WriteFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn write_summary(path: &Path, results: &[TargetResult]) -> StorageResult<()> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record(SUMMARY_HEADER)?;

    for result in results {
        let banner = match &result.outcome {
            ProbeOutcome::Open(ClassificationDetail::Banner { preview }) => preview.as_str(),
            _ => "",
        };
        let error = match (&result.error, &result.outcome) {
            (Some(error), _) => error.clone(),
            (None, ProbeOutcome::Error(reason)) => reason.clone(),
            _ => String::new(),
        };
        let artifacts = &result.artifacts;

        writer.write_record([
            result.target.host.clone(),
            result.target.port.to_string(),
            result.is_open().to_string(),
            banner.to_string(),
            ToolArtifacts::file_name(artifacts.nmap.as_deref()),
            ToolArtifacts::file_name(artifacts.httpx.as_deref()),
            ToolArtifacts::file_name(artifacts.ffuf.as_deref()),
            artifacts.sqlmap_names(),
            error,
        ])?;
    }

    writer.flush().map_err(|e| StorageError::WriteFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn write_json(path: &Path, report: &ScanReport) -> StorageResult<()> {
    let content = serde_json::to_string_pretty(report)?;
    fs::write(path, content).map_err(|e| StorageError::WriteFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
