//! Scanner module - runs the per-target pipelines.
//!
//! Every target gets its own task: connect, classify, and (when enabled and
//! the port is open) hand off to the external tool gateway. A semaphore
//! bounds how many pipelines run at once; an optional token bucket paces
//! connection attempts. Results are printed as they complete but the report
//! keeps input order.

pub mod rate_limiter;
pub mod tcp;
pub mod traits;

pub use rate_limiter::RateLimiter;
pub use tcp::{NetworkScanner, TcpProber};
pub use traits::{
    ClassificationDetail, ProbeOutcome, TargetResult, TargetScanner, TargetState, ToolArtifacts,
};

use crate::config::ScanOptions;
use crate::output::live_line;
use crate::tools::ToolGateway;
use crate::types::{RunId, Target};
use chrono::{DateTime, Local};
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Complete results of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub run: RunId,
    pub completed_at: DateTime<Local>,
    pub duration_ms: u64,
    pub output_dir: PathBuf,
    pub total: usize,
    pub open: usize,
    pub closed: usize,
    pub errors: usize,
    /// One entry per target, in input order.
    pub results: Vec<TargetResult>,
}

impl ScanReport {
    /// Summarize a finished run.
    pub fn new(run: RunId, output_dir: PathBuf, duration_ms: u64, results: Vec<TargetResult>) -> Self {
        let count = |label: &str| results.iter().filter(|r| r.outcome.label() == label).count();
        Self {
            run,
            completed_at: Local::now(),
            duration_ms,
            output_dir,
            total: results.len(),
            open: count("OPEN"),
            closed: count("CLOSED"),
            errors: count("ERROR"),
            results,
        }
    }
}

/// Drives all targets of a run through their pipelines.
pub struct Orchestrator {
    options: ScanOptions,
    scanner: Arc<dyn TargetScanner>,
    gateway: Option<Arc<ToolGateway>>,
    limiter: Option<RateLimiter>,
    run: RunId,
    output_dir: PathBuf,
}

impl Orchestrator {
    /// Create an orchestrator for `run`, writing tool artifacts under `output_dir`.
    pub fn new(
        options: ScanOptions,
        scanner: Arc<dyn TargetScanner>,
        run: RunId,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        let limiter = RateLimiter::new(options.rate_limit);
        Self {
            options,
            scanner,
            gateway: None,
            limiter,
            run,
            output_dir: output_dir.into(),
        }
    }

    /// Run external tools against open targets.
    pub fn with_gateway(mut self, gateway: ToolGateway) -> Self {
        self.gateway = gateway.is_enabled().then(|| Arc::new(gateway));
        self
    }

    /// Scan every target and collect the report.
    pub async fn run(&self, targets: Vec<Target>) -> ScanReport {
        let start = Instant::now();
        let total = targets.len();
        info!(targets = total, concurrency = self.options.concurrency, "starting scan");

        let progress = self.options.show_progress.then(|| progress_bar(total as u64));
        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let output_dir = Arc::new(self.output_dir.clone());

        let mut pending = FuturesUnordered::new();
        for (index, target) in targets.iter().cloned().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let scanner = Arc::clone(&self.scanner);
            let gateway = self.gateway.clone();
            let limiter = self.limiter.clone();
            let output_dir = Arc::clone(&output_dir);

            let handle = tokio::spawn(async move {
                debug!(%target, state = %TargetState::Pending, "queued");
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return TargetResult::new(target, ProbeOutcome::Error("scan aborted".into()));
                };
                if let Some(limiter) = limiter {
                    limiter.wait().await;
                }
                run_pipeline(scanner.as_ref(), gateway.as_deref(), target, &output_dir).await
            });
            pending.push(handle.map(move |joined| (index, joined)));
        }

        let mut slots: Vec<Option<TargetResult>> = vec![None; total];
        while let Some((index, joined)) = pending.next().await {
            let result = joined.unwrap_or_else(|e| {
                let target = targets[index].clone();
                warn!(%target, state = %TargetState::Error, error = %e, "pipeline failed");
                TargetResult::new(target, ProbeOutcome::Error(format!("worker failed: {}", e)))
            });

            if let Some(pb) = &progress {
                pb.println(live_line(&result));
                pb.inc(1);
            }
            slots[index] = Some(result);
        }

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        let results: Vec<TargetResult> = slots
            .into_iter()
            .zip(targets)
            .map(|(slot, target)| {
                slot.unwrap_or_else(|| TargetResult::new(target, ProbeOutcome::Error("no result".into())))
            })
            .collect();

        let report = ScanReport::new(
            self.run,
            self.output_dir.clone(),
            start.elapsed().as_millis() as u64,
            results,
        );
        info!(
            open = report.open,
            closed = report.closed,
            errors = report.errors,
            duration_ms = report.duration_ms,
            "scan complete"
        );
        report
    }
}

/// Probe, classify and optionally deep-scan one target.
async fn run_pipeline(
    scanner: &dyn TargetScanner,
    gateway: Option<&ToolGateway>,
    target: Target,
    output_dir: &Path,
) -> TargetResult {
    let outcome = scanner.scan_target(&target).await;
    let mut result = TargetResult::new(target, outcome);

    let detail = match &result.outcome {
        ProbeOutcome::Open(detail) => detail.clone(),
        ProbeOutcome::Closed(reason) => {
            debug!(target = %result.target, state = %TargetState::Closed, %reason, "closed");
            return result;
        }
        ProbeOutcome::Error(reason) => {
            debug!(target = %result.target, state = %TargetState::Error, %reason, "error");
            return result;
        }
    };

    if let Some(gateway) = gateway {
        debug!(target = %result.target, state = %TargetState::DeepScanning, "running tools");
        match gateway.deep_scan(&result.target, &detail, output_dir).await {
            Ok(artifacts) => result.artifacts = artifacts,
            Err(e) => {
                warn!(target = %result.target, error = %e, "deep scan failed");
                result.error = Some(e.to_string());
            }
        }
    }

    debug!(target = %result.target, state = %TargetState::Done, "done");
    result
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)")
        .map(|style| style.progress_chars("=>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeepScanOptions;
    use crate::tools::{CapturedOutput, ToolInvocation, ToolOutcome, ToolRunner};
    use crate::types::Port;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn target(port: u16) -> Target {
        Target::new("10.0.0.1", Port::new(port).unwrap()).unwrap()
    }

    fn orchestrator(concurrency: usize, scanner: Arc<dyn TargetScanner>, dir: &Path) -> Orchestrator {
        let options = ScanOptions::default().with_concurrency(concurrency);
        Orchestrator::new(options, scanner, RunId::new(), dir)
    }

    /// Tracks how many scans are in flight.
    #[derive(Default)]
    struct CountingScanner {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl TargetScanner for CountingScanner {
        async fn scan_target(&self, _target: &Target) -> ProbeOutcome {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            ProbeOutcome::Closed("connection refused".into())
        }
    }

    /// Finishes later targets first and panics on port 13.
    struct ScriptedScanner;

    #[async_trait]
    impl TargetScanner for ScriptedScanner {
        async fn scan_target(&self, target: &Target) -> ProbeOutcome {
            let port = target.port.as_u16();
            if port == 13 {
                panic!("scripted failure");
            }
            tokio::time::sleep(Duration::from_millis(100 - port as u64 * 5)).await;
            ProbeOutcome::Open(ClassificationDetail::NoBanner)
        }
    }

    /// Succeeds for every tool and records what ran.
    #[derive(Default)]
    struct RecordingRunner {
        calls: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ToolRunner for RecordingRunner {
        fn is_available(&self, _binary: &str) -> bool {
            true
        }

        async fn run(&self, invocation: ToolInvocation) -> ToolOutcome {
            self.calls.lock().unwrap().push(invocation.binary.clone());
            ToolOutcome::Completed {
                exit_code: Some(0),
                captured: CapturedOutput::Text(String::new()),
            }
        }
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let scanner = Arc::new(CountingScanner::default());
        let targets: Vec<Target> = (1..=12).map(target).collect();

        let report = orchestrator(3, scanner.clone(), dir.path()).run(targets).await;

        assert_eq!(report.total, 12);
        assert_eq!(report.closed, 12);
        let peak = scanner.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak concurrency {} exceeded limit", peak);
        assert!(peak >= 1);
    }

    #[tokio::test]
    async fn test_panic_is_isolated_and_order_kept() {
        let dir = tempfile::tempdir().unwrap();
        let targets: Vec<Target> = (10..=16).map(target).collect();

        let report = orchestrator(7, Arc::new(ScriptedScanner), dir.path())
            .run(targets.clone())
            .await;

        let ports: Vec<u16> = report.results.iter().map(|r| r.target.port.as_u16()).collect();
        assert_eq!(ports, vec![10, 11, 12, 13, 14, 15, 16]);
        assert_eq!(report.open, 6);
        assert_eq!(report.errors, 1);
        match &report.results[3].outcome {
            ProbeOutcome::Error(reason) => assert!(reason.starts_with("worker failed")),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_open_targets_are_deep_scanned() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner::default());
        let options = ScanOptions::default().with_deep_scan(DeepScanOptions {
            version_scan: true,
            ..DeepScanOptions::default()
        });
        let gateway = ToolGateway::new(runner.clone(), &options);

        let report = Orchestrator::new(options, Arc::new(ScriptedScanner), RunId::new(), dir.path())
            .with_gateway(gateway)
            .run(vec![target(11), target(12)])
            .await;

        assert_eq!(runner.calls.lock().unwrap().as_slice(), ["nmap", "nmap"]);
        let expected = dir.path().join("10.0.0.1").join("nmap_10.0.0.1_11.txt");
        assert_eq!(report.results[0].artifacts.nmap.as_deref(), Some(expected.as_path()));
    }

    #[tokio::test]
    async fn test_deep_scan_failure_is_recorded_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the output directory should be.
        let blocked = dir.path().join("not-a-dir");
        std::fs::write(&blocked, b"").unwrap();

        let options = ScanOptions::default().with_deep_scan(DeepScanOptions {
            version_scan: true,
            ..DeepScanOptions::default()
        });
        let gateway = ToolGateway::new(Arc::new(RecordingRunner::default()), &options);

        let report = Orchestrator::new(options, Arc::new(ScriptedScanner), RunId::new(), &blocked)
            .with_gateway(gateway)
            .run(vec![target(11)])
            .await;

        let result = &report.results[0];
        assert!(result.is_open());
        assert!(result.error.as_deref().unwrap_or_default().contains("host directory"));
        assert!(result.artifacts.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_gateway_is_dropped() {
        let options = ScanOptions::default();
        let gateway = ToolGateway::new(Arc::new(RecordingRunner::default()), &options);
        let orchestrator = Orchestrator::new(options, Arc::new(ScriptedScanner), RunId::new(), "out")
            .with_gateway(gateway);
        assert!(orchestrator.gateway.is_none());
    }

    #[tokio::test]
    async fn test_report_uses_given_run() {
        let run = RunId::new();
        let report = Orchestrator::new(ScanOptions::default(), Arc::new(ScriptedScanner), run, "recon_out")
            .run(vec![target(11)])
            .await;
        assert_eq!(report.run, run);
        assert_eq!(report.output_dir, PathBuf::from("recon_out"));
    }

    #[test]
    fn test_report_counts() {
        let results = vec![
            TargetResult::new(target(1), ProbeOutcome::Open(ClassificationDetail::NoBanner)),
            TargetResult::new(target(2), ProbeOutcome::Closed("refused".into())),
            TargetResult::new(target(3), ProbeOutcome::Error("boom".into())),
        ];
        let report = ScanReport::new(RunId::new(), PathBuf::from("out"), 5, results);
        assert_eq!((report.total, report.open, report.closed, report.errors), (3, 1, 1, 1));
    }
}
