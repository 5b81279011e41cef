//! Error types for portrecon.
//!
//! Uses `thiserror` for ergonomic error definitions. Per-target failures
//! never surface through these types past the orchestrator; they are folded
//! into report rows. The enums below cover connection attempts, external
//! tools and the edges of the program (configuration, storage, CLI).

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure to establish a TCP connection to a target.
///
/// The `Display` form is used verbatim as the CLOSED reason in reports.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("DNS resolution failed for '{host}': {reason}")]
    Resolution { host: String, reason: String },

    #[error("no addresses found for '{0}'")]
    NoAddresses(String),

    #[error("connection refused")]
    ConnectionRefused,

    #[error("timed out after {0} ms")]
    Timeout(u64),

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("host unreachable")]
    HostUnreachable,

    #[error("connection failed: {0}")]
    ConnectionFailed(String),
}

impl ProbeError {
    /// Map an I/O error from `connect()` onto a probe error.
    ///
    /// `timeout` is the attempt budget, reported when the OS gives up first.
    pub fn from_io(err: &std::io::Error, timeout: Duration) -> Self {
        use std::io::ErrorKind;

        match err.kind() {
            ErrorKind::ConnectionRefused => Self::ConnectionRefused,
            ErrorKind::TimedOut => Self::Timeout(timeout.as_millis() as u64),
            _ => {
                let text = err.to_string();
                let lower = text.to_lowercase();
                if lower.contains("refused") {
                    Self::ConnectionRefused
                } else if lower.contains("unreachable") {
                    if lower.contains("host") {
                        Self::HostUnreachable
                    } else {
                        Self::NetworkUnreachable(text)
                    }
                } else {
                    Self::ConnectionFailed(text)
                }
            }
        }
    }
}

/// Errors raised while spawning or supervising an external tool.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("failed to spawn '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create host directory {path}: {source}")]
    HostDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to prepare output file {path}: {source}")]
    OutputFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while waiting for '{binary}': {source}")]
    Wait {
        binary: String,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("invalid configuration format: {0}")]
    InvalidFormat(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("content discovery requires a wordlist (pass --wordlist)")]
    MissingWordlist,

    #[error("wordlist not found: {0}")]
    WordlistNotFound(PathBuf),

    #[error("invalid port specification: {0}")]
    Port(#[from] crate::types::PortError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors writing the report and its output directory.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to create output directory {path}: {reason}")]
    DirectoryError { path: PathBuf, reason: String },

    #[error("failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level CLI errors.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
}

/// Result type alias for connection attempts.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Result type alias for tool supervision.
pub type ToolResult<T> = Result<T, ToolError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for report storage.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for CLI commands.
pub type CliResult<T> = Result<T, CliError>;
