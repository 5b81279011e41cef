//! Core value types.
//!
//! Newtypes keep invalid ports and unparsed target strings out of the
//! probing pipeline.

mod port;
mod run_id;
mod target;

pub use port::{Port, PortError, PortSpec};
pub use run_id::{RunId, STAMP_FORMAT};
pub use target::{parse_line, parse_targets, parse_targets_file, Target};
