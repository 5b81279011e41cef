//! CLI subcommand definitions and handlers.
//!
//! - `portrecon scan -i targets.txt` - Probe and classify every target
//! - `portrecon tools` - Show which external tools are on PATH

mod scan;
mod tools;

pub use scan::ScanCommand;
pub use tools::ToolsCommand;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// portrecon - concurrent port reconnaissance.
///
/// Reads `host:port` targets from a file, checks each for an open TCP port,
/// identifies the service behind it and optionally hands open ports to
/// nmap, httpx, ffuf and sqlmap.
#[derive(Parser, Debug)]
#[command(name = "portrecon")]
#[command(author = "HueCodes <huecodes@proton.me>")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Concurrent port reconnaissance with service classification", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress progress and live result lines
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a settings file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan targets listed in a file
    #[command(alias = "s")]
    Scan(ScanCommand),

    /// List external tools and whether they are installed
    #[command(alias = "t")]
    Tools(ToolsCommand),
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// JSON structured output
    Json,
    /// CSV format for data analysis
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}
