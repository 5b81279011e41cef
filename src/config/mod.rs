//! Configuration management.
//!
//! `AppSettings` is the on-disk layer, `ScanOptions` the immutable value a
//! scan run is built from.

mod options;
mod settings;

pub use options::{DeepScanOptions, ScanOptions, ToolTimeouts};
pub use settings::{AppSettings, Paths};
