//! Identity of a single scan run.
//!
//! A run is named twice: a UUID for the JSON report and a local timestamp
//! stamp (`20240131_235959`) used in directory and file names so that
//! consecutive runs never overwrite each other.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Filename-safe timestamp layout.
pub const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Unique identifier and start time of a scan run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunId {
    id: Uuid,
    started_at: DateTime<Local>,
}

impl RunId {
    /// Start a new run now.
    pub fn new() -> Self {
        Self::at(Local::now())
    }

    /// Start a run at a fixed time.
    pub fn at(started_at: DateTime<Local>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at,
        }
    }

    /// Timestamp stamp for file and directory names.
    pub fn stamp(&self) -> String {
        self.started_at.format(STAMP_FORMAT).to_string()
    }

    /// First 8 characters of the UUID.
    pub fn short(&self) -> String {
        self.id.to_string()[..8].to_string()
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}
