pub mod actors;
pub mod cache;
pub mod cluster;
pub mod config;
pub mod error;
pub mod labels;
pub mod monitor;
pub mod reporter;
pub mod uploader;
pub mod util;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single failed task execution as reported by the cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// Stable identifier of the failed execution
    pub id: String,

    /// Task name (for display only)
    #[serde(default)]
    pub name: String,

    /// Terminal state, e.g. `TASK_FAILED`
    #[serde(default)]
    pub state: String,

    /// When the task ended
    pub finished: DateTime<Utc>,

    /// Annotations attached to the task, in cluster order
    #[serde(default)]
    pub labels: Vec<Label>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub key: String,
    pub value: String,
}

impl Label {
    pub fn new(key: impl ToString, value: impl ToString) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{} (finished {})", self.id, self.finished.to_rfc3339())
        } else {
            write!(
                f,
                "{} [{}] (finished {})",
                self.name,
                self.id,
                self.finished.to_rfc3339()
            )
        }
    }
}

/// Locations of a failure's log artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogUrls {
    pub stdout: String,
    pub stderr: String,
}

impl LogUrls {
    pub fn new(stdout: impl ToString, stderr: impl ToString) -> Self {
        Self {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }
}
