//! External tool execution.
//!
//! `ToolRunner` is the only way the rest of the crate touches subprocesses.
//! The production `ProcessRunner` searches `PATH` and shells out through
//! `tokio::process`; tests plug in scripted runners. A missing binary is not
//! an error: the invocation reports `Unavailable` and the caller moves on.

mod gateway;

pub use gateway::{discover_query_urls, ToolGateway};

use crate::error::{ToolError, ToolResult};
use async_trait::async_trait;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::fs::File;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Names of the tools the gateway knows how to drive.
pub const KNOWN_TOOLS: &[&str] = &["nmap", "httpx", "ffuf", "sqlmap"];

/// One subprocess call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Binary name, looked up on `PATH`.
    pub binary: String,
    pub args: Vec<String>,
    /// When set, stdout and stderr are written to this file.
    pub output_path: Option<PathBuf>,
    pub timeout: Duration,
}

impl ToolInvocation {
    /// Create an invocation with no arguments.
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            args: Vec::new(),
            output_path: None,
            timeout,
        }
    }

    /// Append arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Capture output into a file.
    pub fn capture_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }
}

/// Where a finished tool's output went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedOutput {
    File(PathBuf),
    Text(String),
}

/// Result of running a tool. Never an error: failures are values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    /// The process exited on its own.
    Completed {
        exit_code: Option<i32>,
        captured: CapturedOutput,
    },
    /// The binary is not on `PATH`.
    Unavailable,
    /// The process exceeded its timeout and was killed.
    TimedOut,
    /// The process could not be started or supervised.
    Failed(String),
}

impl ToolOutcome {
    /// Output file of a run that exited with status 0.
    pub fn success_file(&self) -> Option<&Path> {
        match self {
            Self::Completed {
                exit_code: Some(0),
                captured: CapturedOutput::File(path),
            } => Some(path),
            _ => None,
        }
    }
}

/// Capability to run external tools.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Whether the named binary can be run.
    fn is_available(&self, binary: &str) -> bool;

    /// Run a tool under its timeout.
    async fn run(&self, invocation: ToolInvocation) -> ToolOutcome;
}

/// Locate an executable on `PATH`.
pub fn find_in_path(binary: &str) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var)
        .map(|dir| dir.join(binary))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}

/// Runs tools as child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Create a process runner.
    pub fn new() -> Self {
        Self
    }

    async fn spawn_and_wait(&self, program: &Path, invocation: &ToolInvocation) -> ToolResult<ToolOutcome> {
        let mut command = Command::new(program);
        command.args(&invocation.args).stdin(Stdio::null()).kill_on_drop(true);

        if let Some(path) = &invocation.output_path {
            let file = File::create(path)
                .await
                .map_err(|source| ToolError::OutputFile {
                    path: path.clone(),
                    source,
                })?
                .into_std()
                .await;
            let stderr = file.try_clone().map_err(|source| ToolError::OutputFile {
                path: path.clone(),
                source,
            })?;
            command.stdout(Stdio::from(file)).stderr(Stdio::from(stderr));
        } else {
            command.stdout(Stdio::piped()).stderr(Stdio::piped());
        }

        let child = command.spawn().map_err(|source| ToolError::Spawn {
            binary: invocation.binary.clone(),
            source,
        })?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = match timeout(invocation.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| ToolError::Wait {
                binary: invocation.binary.clone(),
                source,
            })?,
            Err(_) => return Ok(ToolOutcome::TimedOut),
        };

        let captured = match &invocation.output_path {
            Some(path) => CapturedOutput::File(path.clone()),
            None => {
                let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
                text.push_str(&String::from_utf8_lossy(&output.stderr));
                CapturedOutput::Text(text)
            }
        };

        Ok(ToolOutcome::Completed {
            exit_code: output.status.code(),
            captured,
        })
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    fn is_available(&self, binary: &str) -> bool {
        find_in_path(binary).is_some()
    }

    async fn run(&self, invocation: ToolInvocation) -> ToolOutcome {
        let Some(program) = find_in_path(&invocation.binary) else {
            debug!(tool = %invocation.binary, "not on PATH, skipping");
            return ToolOutcome::Unavailable;
        };

        debug!(tool = %invocation.binary, args = ?invocation.args, "running tool");
        match self.spawn_and_wait(&program, &invocation).await {
            Ok(ToolOutcome::TimedOut) => {
                warn!(tool = %invocation.binary, timeout_secs = invocation.timeout.as_secs(), "tool timed out");
                ToolOutcome::TimedOut
            }
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(tool = %invocation.binary, error = %e, "tool failed");
                ToolOutcome::Failed(e.to_string())
            }
        }
    }
}
