//! Error types for the trace-log writer

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for trace-log operations
#[derive(Error, Debug)]
pub enum TraceLogError {
    /// Invalid construction argument or date pattern
    #[error("Configuration error: {0}")]
    Config(String),

    /// The logger was already closed
    #[error("Trace logger is already closed")]
    AlreadyClosed,

    /// File system failure, tagged with the path it concerns
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A log line or type name could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Malformed JSON configuration file
    #[error("Config file error: {0}")]
    ConfigFile(#[from] serde_json::Error),
}

impl TraceLogError {
    /// Wrap an I/O error together with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias using TraceLogError
pub type TraceLogResult<T> = Result<T, TraceLogError>;
