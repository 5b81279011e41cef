//! # portrecon - Concurrent Port Reconnaissance
//!
//! portrecon reads a list of `host:port` targets, checks each one with a
//! full TCP connect, works out what kind of service answered and records
//! the results as TSV, CSV and JSON reports.
//!
//! ## Features
//!
//! - **Forgiving input**: `host:port`, `host:port/service`, `host,port`,
//!   `host port` and `[v6]:port` lines, with comments and duplicates skipped
//! - **Service classification**: HTTP status and final URL, TLS certificate
//!   subject, or a banner preview
//! - **Bounded concurrency**: semaphore-limited pipelines with optional rate
//!   limiting; one failing target never affects the others
//! - **Deep scanning**: optional nmap, httpx, ffuf and sqlmap runs per open
//!   port, each with its own timeout
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use portrecon::classifier::Classifier;
//! use portrecon::config::ScanOptions;
//! use portrecon::scanner::{NetworkScanner, Orchestrator, TcpProber};
//! use portrecon::types::{parse_targets, RunId};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let options = ScanOptions::default().with_concurrency(10);
//!     let scanner = NetworkScanner::new(
//!         TcpProber::new(options.connect_timeout),
//!         Classifier::new(&options)?,
//!     );
//!
//!     let targets = parse_targets(["example.com:443", "10.0.0.5 22"]);
//!     let report = Orchestrator::new(options, Arc::new(scanner), RunId::new(), "recon_results")
//!         .run(targets)
//!         .await;
//!
//!     for result in &report.results {
//!         println!("{} -> {}", result.target, result.outcome);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Targets, ports and run identity
//! - [`scanner`] - Connection prober and the scan orchestrator
//! - [`classifier`] - HTTP, TLS and banner classification
//! - [`tools`] - External tool execution
//! - [`config`] - Scan options and persisted settings
//! - [`storage`] - Report files
//! - [`output`] - Console formatting
//! - [`error`] - Error types

pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod scanner;
pub mod storage;
pub mod tools;
pub mod types;

// Re-export commonly used types
pub use config::ScanOptions;
pub use error::{CliError, ConfigError, ProbeError};
pub use scanner::{Orchestrator, ProbeOutcome, ScanReport, TargetResult, TargetScanner};
pub use types::{parse_targets, Port, PortSpec, RunId, Target};
