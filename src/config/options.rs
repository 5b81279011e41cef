//! Immutable scan configuration handed to the orchestrator.

use crate::error::{ConfigError, ConfigResult};
use crate::types::PortSpec;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

/// Per-tool wall-clock limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolTimeouts {
    pub nmap: Duration,
    pub httpx: Duration,
    pub ffuf: Duration,
    pub sqlmap: Duration,
}

impl Default for ToolTimeouts {
    fn default() -> Self {
        Self {
            nmap: Duration::from_secs(180),
            httpx: Duration::from_secs(45),
            ffuf: Duration::from_secs(300),
            sqlmap: Duration::from_secs(600),
        }
    }
}

/// Which external tools run against open targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeepScanOptions {
    /// `nmap -sV` on every open target.
    pub version_scan: bool,
    /// `httpx` on HTTP-like targets.
    pub http_probe: bool,
    /// `ffuf` wordlist for content discovery on HTTP-like targets.
    pub content_discovery: Option<PathBuf>,
    /// `sqlmap` on query URLs found by httpx.
    pub injection_testing: bool,
    /// ffuf worker threads.
    pub ffuf_threads: usize,
}

impl DeepScanOptions {
    /// Default ffuf thread count.
    pub const DEFAULT_FFUF_THREADS: usize = 40;

    /// Whether any tool is enabled.
    pub fn any_enabled(&self) -> bool {
        self.version_scan
            || self.http_probe
            || self.content_discovery.is_some()
            || self.injection_testing
    }

    /// sqlmap consumes httpx output, so injection testing implies HTTP probing.
    pub fn wants_http_probe(&self) -> bool {
        self.http_probe || self.injection_testing
    }
}

/// Configuration for one scan run.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Timeout for each individual connect attempt.
    pub connect_timeout: Duration,
    /// Budget for the HTTP request or TLS handshake.
    pub classify_timeout: Duration,
    /// Read timeout for banner grabbing.
    pub banner_timeout: Duration,
    /// Maximum number of concurrently running target pipelines.
    pub concurrency: usize,
    /// Ports classified with an HTTP GET.
    pub http_ports: BTreeSet<u16>,
    /// Ports classified with a TLS handshake.
    pub tls_ports: BTreeSet<u16>,
    /// Send `\r\n` when a service stays silent.
    pub banner_nudge: bool,
    /// Connection attempts per second, 0 for unlimited.
    pub rate_limit: u32,
    /// Directory base name; the run stamp is appended.
    pub output_base: PathBuf,
    /// External tooling.
    pub deep: DeepScanOptions,
    /// Limits for external tools.
    pub tool_timeouts: ToolTimeouts,
    /// Draw a progress bar and live result lines.
    pub show_progress: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(3),
            classify_timeout: Duration::from_secs(3),
            banner_timeout: Duration::from_secs(1),
            concurrency: 30,
            http_ports: PortSpec::default_http().to_set(),
            tls_ports: BTreeSet::from([443]),
            banner_nudge: true,
            rate_limit: 0,
            output_base: PathBuf::from("recon_results"),
            deep: DeepScanOptions {
                ffuf_threads: DeepScanOptions::DEFAULT_FFUF_THREADS,
                ..DeepScanOptions::default()
            },
            tool_timeouts: ToolTimeouts::default(),
            show_progress: false,
        }
    }
}

impl ScanOptions {
    /// Longest banner read allowed.
    pub const MAX_BANNER_TIMEOUT: Duration = Duration::from_secs(1);

    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-attempt connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the classification timeout.
    pub fn with_classify_timeout(mut self, timeout: Duration) -> Self {
        self.classify_timeout = timeout;
        self
    }

    /// Set the banner read timeout, capped at one second.
    pub fn with_banner_timeout(mut self, timeout: Duration) -> Self {
        self.banner_timeout = timeout.min(Self::MAX_BANNER_TIMEOUT);
        self
    }

    /// Set the concurrency limit.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Replace the HTTP port set.
    pub fn with_http_ports(mut self, spec: &PortSpec) -> Self {
        self.http_ports = spec.to_set();
        self
    }

    /// Enable or disable the `\r\n` banner nudge.
    pub fn with_banner_nudge(mut self, nudge: bool) -> Self {
        self.banner_nudge = nudge;
        self
    }

    /// Limit connection attempts per second.
    pub fn with_rate_limit(mut self, rate: u32) -> Self {
        self.rate_limit = rate;
        self
    }

    /// Set the output directory base.
    pub fn with_output_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.output_base = base.into();
        self
    }

    /// Configure deep-scan tooling.
    pub fn with_deep_scan(mut self, deep: DeepScanOptions) -> Self {
        self.deep = deep;
        self
    }

    /// Configure tool timeouts.
    pub fn with_tool_timeouts(mut self, timeouts: ToolTimeouts) -> Self {
        self.tool_timeouts = timeouts;
        self
    }

    /// Show progress while scanning.
    pub fn with_progress(mut self) -> Self {
        self.show_progress = true;
        self
    }

    /// Whether a port is probed with HTTP.
    pub fn is_http_port(&self, port: u16) -> bool {
        self.http_ports.contains(&port)
    }

    /// Whether a port is probed with TLS.
    pub fn is_tls_port(&self, port: u16) -> bool {
        self.tls_ports.contains(&port)
    }

    /// Reject configurations that cannot run.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be at least 1".into()));
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::Invalid("connect timeout must be positive".into()));
        }
        if let Some(wordlist) = &self.deep.content_discovery {
            if !wordlist.is_file() {
                return Err(ConfigError::WordlistNotFound(wordlist.clone()));
            }
            if self.deep.ffuf_threads == 0 {
                return Err(ConfigError::Invalid("ffuf threads must be at least 1".into()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ScanOptions::default();
        assert_eq!(options.concurrency, 30);
        assert!(options.is_http_port(8080));
        assert!(!options.is_http_port(443));
        assert!(options.is_tls_port(443));
        assert!(!options.deep.any_enabled());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_banner_timeout_is_capped() {
        let options = ScanOptions::new().with_banner_timeout(Duration::from_secs(5));
        assert_eq!(options.banner_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let options = ScanOptions::new().with_concurrency(0);
        assert!(matches!(options.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_wordlist_rejected() {
        let options = ScanOptions::new().with_deep_scan(DeepScanOptions {
            content_discovery: Some(PathBuf::from("/definitely/not/here.txt")),
            ffuf_threads: 10,
            ..DeepScanOptions::default()
        });
        assert!(matches!(options.validate(), Err(ConfigError::WordlistNotFound(_))));
    }

    #[test]
    fn test_injection_implies_http_probe() {
        let deep = DeepScanOptions {
            injection_testing: true,
            ..DeepScanOptions::default()
        };
        assert!(deep.wants_http_probe());
        assert!(deep.any_enabled());
    }
}
