//! Scanner trait abstraction and result types.
//!
//! `TargetScanner` is the seam between the orchestrator and the probing
//! pipeline: production code connects and classifies over the network,
//! tests substitute scripted scanners.

use crate::types::Target;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// What the classifier learned about an open port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassificationDetail {
    /// An HTTP response was received.
    Http {
        status_code: u16,
        reason_phrase: String,
        final_url: String,
    },
    /// The port is on the HTTP list but the exchange failed.
    HttpError { category: String },
    /// TLS handshake succeeded.
    Tls { subject: String },
    /// The service sent bytes on its own (or after a nudge).
    Banner { preview: String },
    /// Nothing was received.
    NoBanner,
}

impl ClassificationDetail {
    /// Human-readable summary for reports.
    pub fn detail_text(&self) -> String {
        match self {
            Self::Http {
                status_code,
                reason_phrase,
                ..
            } => {
                if reason_phrase.is_empty() {
                    format!("HTTP {}", status_code)
                } else {
                    format!("HTTP {} {}", status_code, reason_phrase)
                }
            }
            Self::HttpError { category } => format!("HTTP Fail: {}", category),
            Self::Tls { .. } => "HTTPS".to_string(),
            Self::Banner { preview } => format!("Banner: {}", preview),
            Self::NoBanner => "No banner".to_string(),
        }
    }

    /// Secondary column: final URL for HTTP, certificate subject for TLS.
    pub fn extra(&self) -> &str {
        match self {
            Self::Http { final_url, .. } => final_url,
            Self::Tls { subject } => subject,
            _ => "",
        }
    }

    /// Whether the service speaks HTTP(S).
    pub fn is_web(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::HttpError { .. } | Self::Tls { .. })
    }
}

/// Result of probing and classifying one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// Connected; carries the classification.
    Open(ClassificationDetail),
    /// Could not connect (or the TLS handshake was rejected).
    Closed(String),
    /// The pipeline itself failed.
    Error(String),
}

impl ProbeOutcome {
    /// Check if the target is open.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open(_))
    }

    /// Uppercase label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Open(_) => "OPEN",
            Self::Closed(_) => "CLOSED",
            Self::Error(_) => "ERROR",
        }
    }

    /// Detail column.
    pub fn detail_text(&self) -> String {
        match self {
            Self::Open(detail) => detail.detail_text(),
            Self::Closed(reason) | Self::Error(reason) => reason.clone(),
        }
    }

    /// Extra column.
    pub fn extra(&self) -> &str {
        match self {
            Self::Open(detail) => detail.extra(),
            _ => "",
        }
    }

    /// Classification, if open.
    pub fn detail(&self) -> Option<&ClassificationDetail> {
        match self {
            Self::Open(detail) => Some(detail),
            _ => None,
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.label(), self.detail_text())
    }
}

/// Files produced by external tools for one target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolArtifacts {
    pub nmap: Option<PathBuf>,
    pub httpx: Option<PathBuf>,
    pub ffuf: Option<PathBuf>,
    pub sqlmap: Vec<PathBuf>,
}

impl ToolArtifacts {
    /// Whether any tool produced output.
    pub fn is_empty(&self) -> bool {
        self.nmap.is_none() && self.httpx.is_none() && self.ffuf.is_none() && self.sqlmap.is_empty()
    }

    /// Base name of an artifact, for summary columns.
    pub fn file_name(path: Option<&Path>) -> String {
        path.and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// sqlmap artifact base names joined with `;`.
    pub fn sqlmap_names(&self) -> String {
        self.sqlmap
            .iter()
            .map(|p| Self::file_name(Some(p)))
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// Final record for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetResult {
    pub target: Target,
    pub outcome: ProbeOutcome,
    #[serde(default, skip_serializing_if = "ToolArtifacts::is_empty")]
    pub artifacts: ToolArtifacts,
    /// Unexpected failure during deep scanning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TargetResult {
    /// Create a result without tool output.
    pub fn new(target: Target, outcome: ProbeOutcome) -> Self {
        Self {
            target,
            outcome,
            artifacts: ToolArtifacts::default(),
            error: None,
        }
    }

    /// Check if the target is open.
    pub fn is_open(&self) -> bool {
        self.outcome.is_open()
    }
}

/// Lifecycle of a target inside the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    Pending,
    Connecting,
    Connected,
    Classifying,
    Classified,
    DeepScanning,
    Closed,
    Done,
    Error,
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Classifying => "classifying",
            Self::Classified => "classified",
            Self::DeepScanning => "deep-scanning",
            Self::Closed => "closed",
            Self::Done => "done",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Probe-and-classify pipeline for a single target.
///
/// Implementations must return exactly one outcome and must not panic on
/// network errors; a panic is still contained by the orchestrator.
#[async_trait]
pub trait TargetScanner: Send + Sync {
    /// Connect to the target and classify the service.
    async fn scan_target(&self, target: &Target) -> ProbeOutcome;
}
