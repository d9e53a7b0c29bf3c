//! Logger configuration.
//!
//! Configuration can be built in code or loaded from a JSON file:
//!
//! ```json
//! {
//!   "file_name": "trace.log",
//!   "root_folder": "/var/log/app",
//!   "time_pattern": "yyyy-MM-dd/HH",
//!   "flush_after": 50
//! }
//! ```
//!
//! Only `file_name` and `root_folder` are required.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{TraceLogError, TraceLogResult};
use crate::pattern::DEFAULT_TIMESTAMP_PATTERN;

/// Default number of `log` calls between flushes.
pub const DEFAULT_FLUSH_AFTER: usize = 100;

/// Settings for a [`TraceLogger`](crate::TraceLogger).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceLogConfig {
    /// Leaf file name written inside the root or each bucket
    pub file_name: String,

    /// Directory holding all log files; created when missing
    pub root_folder: PathBuf,

    /// Bucket pattern; empty writes a single flat file
    #[serde(default)]
    pub time_pattern: String,

    /// Flush every N `log` calls; must be positive
    #[serde(default = "default_flush_after")]
    pub flush_after: usize,

    /// Layout of the timestamp field
    #[serde(default = "default_timestamp_pattern")]
    pub timestamp_pattern: String,
}

fn default_flush_after() -> usize {
    DEFAULT_FLUSH_AFTER
}

fn default_timestamp_pattern() -> String {
    DEFAULT_TIMESTAMP_PATTERN.to_string()
}

impl TraceLogConfig {
    /// Create a configuration with default pattern and flush threshold.
    pub fn new(file_name: impl Into<String>, root_folder: impl Into<PathBuf>) -> Self {
        Self {
            file_name: file_name.into(),
            root_folder: root_folder.into(),
            time_pattern: String::new(),
            flush_after: DEFAULT_FLUSH_AFTER,
            timestamp_pattern: default_timestamp_pattern(),
        }
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> TraceLogResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| TraceLogError::io(path, e))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> TraceLogResult<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| TraceLogError::io(path, e))
    }

    pub fn with_time_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.time_pattern = pattern.into();
        self
    }

    pub fn with_flush_after(mut self, flush_after: usize) -> Self {
        self.flush_after = flush_after;
        self
    }

    pub fn with_timestamp_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.timestamp_pattern = pattern.into();
        self
    }
}
