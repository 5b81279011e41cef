//! Scan subcommand implementation.
//!
//! Handles `portrecon scan -i <file>`: builds options from settings and
//! flags, probes every target, then writes and prints the report.

use crate::classifier::Classifier;
use crate::cli::OutputFormat;
use crate::config::{AppSettings, DeepScanOptions, ScanOptions};
use crate::error::{CliResult, ConfigError};
use crate::output;
use crate::scanner::{NetworkScanner, Orchestrator, TcpProber};
use crate::storage::ReportWriter;
use crate::tools::{ProcessRunner, ToolGateway, ToolRunner};
use crate::types::{parse_targets_file, PortSpec, RunId};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Probe and classify targets listed in a file.
#[derive(Parser, Debug)]
pub struct ScanCommand {
    /// File with one target per line
    ///
    /// Accepted forms:
    ///   host:port            example.com:443
    ///   host:port/service    10.0.0.5:22/ssh
    ///   host,port            10.0.0.5,8080
    ///   host port            10.0.0.5 25
    ///   [v6]:port            [2001:db8::1]:80
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Output directory base name; a timestamp is appended
    #[arg(short, long, value_name = "BASE")]
    pub output: Option<PathBuf>,

    /// Maximum number of targets probed at once
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Connect timeout per attempt in milliseconds
    #[arg(short = 't', long, value_name = "MS")]
    pub timeout: Option<u64>,

    /// HTTP request / TLS handshake timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub classify_timeout: Option<u64>,

    /// Banner read timeout in milliseconds (capped at 1000)
    #[arg(long, value_name = "MS")]
    pub banner_timeout: Option<u64>,

    /// Ports classified with an HTTP GET (e.g. "80,8000-8010")
    #[arg(long, value_name = "SPEC")]
    pub http_ports: Option<String>,

    /// Connection attempts per second (0 = unlimited)
    #[arg(short = 'r', long = "rate")]
    pub rate_limit: Option<u32>,

    /// Run nmap -sV and httpx against open ports
    #[arg(long)]
    pub deep: bool,

    /// Run ffuf content discovery on HTTP ports (active testing)
    #[arg(long, requires = "wordlist")]
    pub fuzz: bool,

    /// Wordlist for --fuzz
    #[arg(short = 'w', long, value_name = "PATH")]
    pub wordlist: Option<PathBuf>,

    /// ffuf worker threads
    #[arg(long, default_value_t = DeepScanOptions::DEFAULT_FFUF_THREADS)]
    pub ffuf_threads: usize,

    /// Run sqlmap on query URLs reported by httpx (active testing)
    #[arg(long)]
    pub sqlmap: bool,

    /// Do not send a line break to silent services
    #[arg(long)]
    pub no_nudge: bool,

    /// Output format for the final report
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

impl ScanCommand {
    /// Execute the scan command.
    pub async fn execute(&self, quiet: bool, config: Option<&Path>) -> CliResult<()> {
        let settings = match config {
            Some(path) => AppSettings::load_from(path)?,
            None => AppSettings::load()?,
        };
        let options = self.scan_options(&settings, !quiet)?;
        options.validate()?;

        let targets = parse_targets_file(&self.input).map_err(|e| ConfigError::ReadFailed {
            path: self.input.clone(),
            reason: e.to_string(),
        })?;
        if targets.is_empty() {
            output::print_info(&format!("No valid targets found in {}", self.input.display()));
            return Ok(());
        }

        if self.fuzz || self.sqlmap {
            output::print_warning("active testing enabled; only scan systems you are authorized to test");
        }

        let runner = Arc::new(ProcessRunner::new());
        if !quiet {
            warn_missing_tools(runner.as_ref(), &options.deep);
        }

        let run = RunId::new();
        let writer = ReportWriter::create(&options.output_base, &run)?;

        let prober = TcpProber::new(options.connect_timeout);
        let classifier = Classifier::new(&options)?;
        let scanner = Arc::new(NetworkScanner::new(prober, classifier));
        let gateway = ToolGateway::new(runner, &options);

        if !quiet && self.format == OutputFormat::Plain {
            output::print_scan_header(targets.len(), options.concurrency, writer.dir());
        }
        info!(input = %self.input.display(), targets = targets.len(), "loaded targets");

        let report = Orchestrator::new(options, scanner, run, writer.dir())
            .with_gateway(gateway)
            .run(targets)
            .await;

        let files = writer.write(&report)?;
        output::print_report(&report, self.format)?;

        if self.format == OutputFormat::Plain {
            for path in files.paths() {
                output::print_success(&format!("Saved {}", path.display()));
            }
        }

        Ok(())
    }

    /// Merge settings and flags into scan options. Flags win.
    pub fn scan_options(&self, settings: &AppSettings, show_progress: bool) -> CliResult<ScanOptions> {
        let mut options = settings.scan_options()?;

        if let Some(base) = &self.output {
            options = options.with_output_base(base.clone());
        }
        if let Some(concurrency) = self.concurrency {
            options = options.with_concurrency(concurrency);
        }
        if let Some(ms) = self.timeout {
            options = options.with_connect_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.classify_timeout {
            options = options.with_classify_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.banner_timeout {
            options = options.with_banner_timeout(Duration::from_millis(ms));
        }
        if let Some(spec) = &self.http_ports {
            let spec: PortSpec = spec.parse().map_err(ConfigError::from)?;
            options = options.with_http_ports(&spec);
        }
        if let Some(rate) = self.rate_limit {
            options = options.with_rate_limit(rate);
        }
        if self.no_nudge {
            options = options.with_banner_nudge(false);
        }
        if self.fuzz && self.wordlist.is_none() {
            return Err(ConfigError::MissingWordlist.into());
        }

        options = options.with_deep_scan(DeepScanOptions {
            version_scan: self.deep,
            http_probe: self.deep,
            content_discovery: if self.fuzz { self.wordlist.clone() } else { None },
            injection_testing: self.sqlmap,
            ffuf_threads: self.ffuf_threads,
        });

        if show_progress {
            options = options.with_progress();
        }
        Ok(options)
    }
}

/// Warn about enabled tools that are not installed.
fn warn_missing_tools(runner: &dyn ToolRunner, deep: &DeepScanOptions) {
    let wanted = [
        ("nmap", deep.version_scan),
        ("httpx", deep.wants_http_probe()),
        ("ffuf", deep.content_discovery.is_some()),
        ("sqlmap", deep.injection_testing),
    ];
    for (tool, enabled) in wanted {
        if enabled && !runner.is_available(tool) {
            output::print_warning(&format!("{} not found on PATH; skipping it", tool));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::error::CliError;

    fn scan_command(args: &[&str]) -> ScanCommand {
        let mut argv = vec!["portrecon", "scan", "-i", "targets.txt"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Scan(scan) => scan,
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_flags_override_settings() {
        let settings = AppSettings {
            concurrency: 8,
            ..AppSettings::default()
        };
        let command = scan_command(&["-c", "4", "--timeout", "250", "--no-nudge", "--rate", "20"]);
        let options = command.scan_options(&settings, false).unwrap();

        assert_eq!(options.concurrency, 4);
        assert_eq!(options.connect_timeout, Duration::from_millis(250));
        assert!(!options.banner_nudge);
        assert_eq!(options.rate_limit, 20);
        assert!(!options.show_progress);
    }

    #[test]
    fn test_settings_apply_without_flags() {
        let settings = AppSettings {
            concurrency: 8,
            ..AppSettings::default()
        };
        let options = scan_command(&[]).scan_options(&settings, true).unwrap();
        assert_eq!(options.concurrency, 8);
        assert!(options.show_progress);
        assert!(!options.deep.any_enabled());
    }

    #[test]
    fn test_sqlmap_implies_http_probe() {
        let options = scan_command(&["--sqlmap"])
            .scan_options(&AppSettings::default(), false)
            .unwrap();
        assert!(options.deep.wants_http_probe());
        assert!(!options.deep.version_scan);
    }

    #[test]
    fn test_bad_http_ports_rejected() {
        let result = scan_command(&["--http-ports", "80,abc"]).scan_options(&AppSettings::default(), false);
        assert!(matches!(result, Err(CliError::Config(ConfigError::Port(_)))));
    }

    #[test]
    fn test_fuzz_without_wordlist_is_rejected_by_parser() {
        assert!(Cli::try_parse_from(["portrecon", "scan", "-i", "t.txt", "--fuzz"]).is_err());
    }

    #[tokio::test]
    async fn test_empty_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("targets.txt");
        std::fs::write(&input, "# nothing here\n\nnot a target\n").unwrap();
        let settings_file = dir.path().join("settings.json");
        AppSettings::default().save_to(&settings_file).unwrap();

        let base = dir.path().join("out");
        let argv = [
            "portrecon", "scan", "-i", input.to_str().unwrap(), "-o", base.to_str().unwrap(),
        ];
        let Commands::Scan(command) = Cli::try_parse_from(argv).unwrap().command else {
            panic!("expected scan command");
        };

        command.execute(true, Some(&settings_file)).await.unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn test_unreadable_input_is_config_error() {
        let command = scan_command(&[]);
        let dir = tempfile::tempdir().unwrap();
        let settings_file = dir.path().join("settings.json");
        AppSettings::default().save_to(&settings_file).unwrap();

        let err = ScanCommand {
            input: dir.path().join("missing.txt"),
            ..command
        }
        .execute(true, Some(&settings_file))
        .await
        .unwrap_err();
        assert!(matches!(err, CliError::Config(ConfigError::ReadFailed { .. })));
    }
}
