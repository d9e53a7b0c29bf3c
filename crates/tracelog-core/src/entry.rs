//! Log entry types.
//!
//! A [`LogEntry`] is built once at the call site and only read afterwards:
//! the resolver looks at its timestamp, the formatter at every field.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TraceLogError;

/// Severity of a diagnostic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntryType {
    Verbose,
    Informational,
    Warning,
    Error,
    Critical,
}

impl EntryType {
    /// All variants, in ascending severity.
    pub const ALL: [EntryType; 5] = [
        EntryType::Verbose,
        EntryType::Informational,
        EntryType::Warning,
        EntryType::Error,
        EntryType::Critical,
    ];

    /// Name as written to the log file.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Verbose => "Verbose",
            EntryType::Informational => "Informational",
            EntryType::Warning => "Warning",
            EntryType::Error => "Error",
            EntryType::Critical => "Critical",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = TraceLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "verbose" | "debug" | "trace" => Ok(EntryType::Verbose),
            "informational" | "information" | "info" => Ok(EntryType::Informational),
            "warning" | "warn" => Ok(EntryType::Warning),
            "error" => Ok(EntryType::Error),
            "critical" | "crit" | "fatal" => Ok(EntryType::Critical),
            _ => Err(TraceLogError::Parse(format!("unknown entry type: {s}"))),
        }
    }
}

/// A single diagnostic record.
///
/// Fields are private so an entry cannot change once handed to a logger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    timestamp: DateTime<Utc>,
    entry_type: EntryType,
    server_name: String,
    thread_id: u64,
    operation: String,
    message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    extra: String,
}

impl LogEntry {
    /// Create a new entry with an empty extension field.
    pub fn new(
        timestamp: DateTime<Utc>,
        entry_type: EntryType,
        server_name: impl Into<String>,
        thread_id: u64,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            entry_type,
            server_name: server_name.into(),
            thread_id,
            operation: operation.into(),
            message: message.into(),
            extra: String::new(),
        }
    }

    /// Attach extension text (typically a rendered exception).
    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = extra.into();
        self
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub fn thread_id(&self) -> u64 {
        self.thread_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Extension text; empty when none was attached.
    pub fn extra(&self) -> &str {
        &self.extra
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_entry_type_display() {
        assert_eq!(EntryType::Informational.to_string(), "Informational");
        assert_eq!(EntryType::Warning.to_string(), "Warning");
    }

    #[test]
    fn test_entry_type_parse() {
        assert_eq!("Informational".parse::<EntryType>().unwrap(), EntryType::Informational);
        assert_eq!("info".parse::<EntryType>().unwrap(), EntryType::Informational);
        assert_eq!("WARN".parse::<EntryType>().unwrap(), EntryType::Warning);
        assert_eq!("fatal".parse::<EntryType>().unwrap(), EntryType::Critical);
        assert!(matches!(
            "loud".parse::<EntryType>(),
            Err(TraceLogError::Parse(_))
        ));
    }

    #[test]
    fn test_every_type_parses_from_its_name() {
        for ty in EntryType::ALL {
            assert_eq!(ty.as_str().parse::<EntryType>().unwrap(), ty);
        }
    }

    #[test]
    fn test_entry_with_extra() {
        let ts = Utc.with_ymd_and_hms(2012, 1, 1, 8, 0, 0).unwrap();
        let entry = LogEntry::new(ts, EntryType::Error, "Server", 7, "Op", "failed");
        assert_eq!(entry.extra(), "");

        let entry = entry.with_extra("NullReference at Foo.Bar()");
        assert_eq!(entry.extra(), "NullReference at Foo.Bar()");
        assert_eq!(entry.thread_id(), 7);
        assert_eq!(entry.timestamp(), ts);
    }
}
