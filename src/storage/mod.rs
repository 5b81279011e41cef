//! Report persistence.
//!
//! Every run writes into its own `<base>_<stamp>` directory: a tab-separated
//! results table, a CSV summary with tool references, and the full JSON
//! report.

mod report;

pub use report::{read_report, run_directory, ReportFiles, ReportWriter};
