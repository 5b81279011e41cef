//! Persistent application settings.
//!
//! Settings live in the XDG config directory (`~/.config/portrecon/settings.json`
//! on Linux) and provide defaults that command-line flags override.

use super::options::{ScanOptions, ToolTimeouts};
use crate::error::{ConfigError, ConfigResult};
use crate::types::PortSpec;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/portrecon)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Resolve the platform paths.
    pub fn new() -> ConfigResult<Self> {
        let project = ProjectDirs::from("com", "portrecon", "portrecon")
            .ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Default concurrency level.
    pub concurrency: usize,
    /// Per-attempt connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// HTTP request / TLS handshake timeout in milliseconds.
    pub classify_timeout_ms: u64,
    /// Banner read timeout in milliseconds (capped at 1000).
    pub banner_timeout_ms: u64,
    /// Ports classified with HTTP, as a port spec.
    pub http_ports: String,
    /// Send `\r\n` to silent services.
    pub banner_nudge: bool,
    /// Output directory base name.
    pub output_base: PathBuf,
    /// Tool timeouts in seconds.
    pub nmap_timeout_secs: u64,
    pub httpx_timeout_secs: u64,
    pub ffuf_timeout_secs: u64,
    pub sqlmap_timeout_secs: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        let tools = ToolTimeouts::default();
        Self {
            concurrency: 30,
            connect_timeout_ms: 3000,
            classify_timeout_ms: 3000,
            banner_timeout_ms: 1000,
            http_ports: PortSpec::default_http().to_string(),
            banner_nudge: true,
            output_base: PathBuf::from("recon_results"),
            nmap_timeout_secs: tools.nmap.as_secs(),
            httpx_timeout_secs: tools.httpx.as_secs(),
            ffuf_timeout_secs: tools.ffuf.as_secs(),
            sqlmap_timeout_secs: tools.sqlmap.as_secs(),
        }
    }
}

impl AppSettings {
    /// Load settings from the default location, falling back to defaults.
    pub fn load() -> ConfigResult<Self> {
        let file = match Paths::new() {
            Ok(paths) => paths.settings_file(),
            Err(_) => return Ok(Self::default()),
        };

        if !file.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }

    /// Save settings to a specific file.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Scan options seeded from these settings.
    pub fn scan_options(&self) -> ConfigResult<ScanOptions> {
        let http_ports: PortSpec = self.http_ports.parse()?;

        Ok(ScanOptions::new()
            .with_concurrency(self.concurrency)
            .with_connect_timeout(Duration::from_millis(self.connect_timeout_ms))
            .with_classify_timeout(Duration::from_millis(self.classify_timeout_ms))
            .with_banner_timeout(Duration::from_millis(self.banner_timeout_ms))
            .with_http_ports(&http_ports)
            .with_banner_nudge(self.banner_nudge)
            .with_output_base(self.output_base.clone())
            .with_tool_timeouts(ToolTimeouts {
                nmap: Duration::from_secs(self.nmap_timeout_secs),
                httpx: Duration::from_secs(self.httpx_timeout_secs),
                ffuf: Duration::from_secs(self.ffuf_timeout_secs),
                sqlmap: Duration::from_secs(self.sqlmap_timeout_secs),
            }))
    }
}
