//! Deep-scan tool wiring for open targets.

use super::{ToolInvocation, ToolOutcome, ToolRunner};
use crate::config::{DeepScanOptions, ScanOptions, ToolTimeouts};
use crate::error::{ToolError, ToolResult};
use crate::scanner::{ClassificationDetail, ToolArtifacts};
use crate::types::Target;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tokio::fs;
use tracing::{debug, info};

/// Status codes ffuf reports as hits.
const FFUF_MATCH_CODES: &str = "200,301,302,401,403";

/// Longest sanitized URL used in a sqlmap artifact name.
const MAX_URL_STEM: usize = 120;

/// Runs the enabled external tools against one open target.
pub struct ToolGateway {
    runner: Arc<dyn ToolRunner>,
    deep: DeepScanOptions,
    timeouts: ToolTimeouts,
    http_ports: BTreeSet<u16>,
}

impl ToolGateway {
    /// Create a gateway for the deep-scan settings in `options`.
    pub fn new(runner: Arc<dyn ToolRunner>, options: &ScanOptions) -> Self {
        Self {
            runner,
            deep: options.deep.clone(),
            timeouts: options.tool_timeouts,
            http_ports: options.http_ports.clone(),
        }
    }

    /// Whether any tool would run.
    pub fn is_enabled(&self) -> bool {
        self.deep.any_enabled()
    }

    /// Whether web tooling applies to this target.
    pub fn is_http_like(&self, target: &Target, detail: &ClassificationDetail) -> bool {
        let port = target.port.as_u16();
        self.http_ports.contains(&port) || port == 443 || detail.is_web()
    }

    /// Base URL (no trailing slash) for web tooling.
    pub fn base_url(target: &Target, detail: &ClassificationDetail) -> String {
        let port = target.port.as_u16();
        let tls = matches!(detail, ClassificationDetail::Tls { .. });
        let scheme = if tls || port == 443 || port == 8443 {
            "https"
        } else {
            "http"
        };
        format!("{}://{}", scheme, target.authority())
    }

    /// Run every enabled tool and collect the files they produced.
    ///
    /// Only host directory creation is fatal; every tool failure leaves its
    /// artifact empty and the next tool runs.
    pub async fn deep_scan(
        &self,
        target: &Target,
        detail: &ClassificationDetail,
        output_dir: &Path,
    ) -> ToolResult<ToolArtifacts> {
        let host_dir = output_dir.join(sanitize_component(&target.host));
        fs::create_dir_all(&host_dir)
            .await
            .map_err(|source| ToolError::HostDirectory {
                path: host_dir.clone(),
                source,
            })?;

        let stem = format!("{}_{}", sanitize_component(&target.host), target.port);
        let web = self.is_http_like(target, detail);
        let base_url = Self::base_url(target, detail);
        let mut artifacts = ToolArtifacts::default();

        if web && self.deep.wants_http_probe() {
            let file = host_dir.join(format!("httpx_{}.txt", stem));
            let invocation = ToolInvocation::new("httpx", self.timeouts.httpx)
                .args(["-silent", "-no-color", "-url", base_url.as_str()])
                .args(["-status-code", "-title", "-location", "-o"])
                .args([path_arg(&file)]);
            artifacts.httpx = self.run_for_file(target, invocation, &file).await;
        }

        if self.deep.version_scan {
            let file = host_dir.join(format!("nmap_{}.txt", stem));
            let invocation = ToolInvocation::new("nmap", self.timeouts.nmap)
                .args(["-sV".to_string(), "-p".to_string(), target.port.to_string()])
                .args(["-oN"])
                .args([path_arg(&file), target.host.clone()]);
            artifacts.nmap = self.run_for_file(target, invocation, &file).await;
        }

        if let Some(wordlist) = self.deep.content_discovery.as_ref().filter(|_| web) {
            let file = host_dir.join(format!("ffuf_{}.txt", stem));
            let invocation = ToolInvocation::new("ffuf", self.timeouts.ffuf)
                .args(["-u".to_string(), format!("{}/FUZZ", base_url)])
                .args(["-w".to_string(), path_arg(wordlist)])
                .args(["-t".to_string(), self.deep.ffuf_threads.to_string()])
                .args(["-o".to_string(), path_arg(&file)])
                .args(["-mc", FFUF_MATCH_CODES]);
            artifacts.ffuf = self.run_for_file(target, invocation, &file).await;
        }

        if self.deep.injection_testing {
            if let Some(httpx_file) = &artifacts.httpx {
                let text = fs::read(httpx_file)
                    .await
                    .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                    .unwrap_or_default();
                artifacts.sqlmap = self.run_sqlmap(target, &discover_query_urls(&text), &host_dir).await;
            }
        }

        Ok(artifacts)
    }

    /// Run a tool that writes its own output file; keep the path on success.
    async fn run_for_file(&self, target: &Target, invocation: ToolInvocation, file: &Path) -> Option<PathBuf> {
        let tool = invocation.binary.clone();
        match self.runner.run(invocation).await {
            ToolOutcome::Completed { exit_code: Some(0), .. } => {
                info!(%target, %tool, file = %file.display(), "tool finished");
                Some(file.to_path_buf())
            }
            other => {
                debug!(%target, %tool, outcome = ?other, "no artifact");
                None
            }
        }
    }

    async fn run_sqlmap(&self, target: &Target, urls: &[String], host_dir: &Path) -> Vec<PathBuf> {
        let mut produced = Vec::new();
        for url in urls {
            let file = host_dir.join(format!("sqlmap_{}.txt", sanitize_url(url)));
            let invocation = ToolInvocation::new("sqlmap", self.timeouts.sqlmap)
                .args(["-u", url.as_str(), "--batch", "--output-dir"])
                .args([path_arg(host_dir)])
                .capture_to(&file);
            let outcome = self.runner.run(invocation).await;
            match outcome.success_file() {
                Some(path) => {
                    info!(%target, tool = "sqlmap", %url, "tool finished");
                    produced.push(path.to_path_buf());
                }
                None => debug!(%target, tool = "sqlmap", %url, outcome = ?outcome, "no artifact"),
            }
        }
        produced
    }
}

/// URLs with a query string found in httpx output, in order, deduplicated.
pub fn discover_query_urls(text: &str) -> Vec<String> {
    static URL: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    let Ok(pattern) = URL.get_or_init(|| Regex::new(r"https?://\S+")).as_ref() else {
        return Vec::new();
    };

    let mut urls: Vec<String> = Vec::new();
    for found in pattern.find_iter(text) {
        let url = found.as_str();
        if url.contains('?') && !urls.iter().any(|seen| seen == url) {
            urls.push(url.to_string());
        }
    }
    urls
}

/// Make a host usable as a single path component.
fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .map(|c| if matches!(c, ':' | '/' | '\\') { '_' } else { c })
        .collect()
}

/// Flatten a URL into a file-name stem.
fn sanitize_url(url: &str) -> String {
    url.chars()
        .map(|c| if matches!(c, ':' | '/' | '\\' | '?' | '&' | '=') { '_' } else { c })
        .take(MAX_URL_STEM)
        .collect()
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
