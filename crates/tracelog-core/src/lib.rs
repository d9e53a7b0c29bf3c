//! Time-partitioned, buffered trace-log writer.
//!
//! Structured diagnostic entries are formatted as tab-separated lines,
//! routed to a file chosen by an optional time bucket, buffered, and
//! appended to disk every `flush_after` calls and on close.
//!
//! ## Layout
//!
//! ```text
//! root/                   # time_pattern = ""
//! └── trace.log
//!
//! root/                   # time_pattern = "HH"
//! ├── 08/
//! │   └── trace.log
//! └── 09/
//!     └── trace.log
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use chrono::Utc;
//! use tracelog_core::{EntryType, LogEntry, TraceLogger};
//!
//! # fn main() -> Result<(), tracelog_core::TraceLogError> {
//! let logger = TraceLogger::new("trace.log", "./logs", "yyyy-MM-dd", 100)?;
//!
//! logger.log(&LogEntry::new(
//!     Utc::now(),
//!     EntryType::Informational,
//!     "web01",
//!     1,
//!     "Checkout",
//!     "Order placed",
//! ))?;
//!
//! // Close writes out everything still buffered.
//! logger.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! Only [`TraceLogger::close`] guarantees durability. Dropping an open logger
//! flushes on a best-effort basis and can only report failure via `tracing`.

pub mod buffer;
pub mod config;
pub mod entry;
pub mod error;
pub mod format;
pub mod layer;
pub mod logger;
pub mod path;
pub mod pattern;
pub mod reader;
pub mod report;

// Re-exports
pub use buffer::BufferedWriter;
pub use config::{TraceLogConfig, DEFAULT_FLUSH_AFTER};
pub use entry::{EntryType, LogEntry};
pub use error::{TraceLogError, TraceLogResult};
pub use format::EntryFormatter;
pub use layer::TraceLogLayer;
pub use logger::{LoggerState, TraceLogger, TraceLoggerBuilder};
pub use path::PathResolver;
pub use pattern::{DatePattern, DEFAULT_TIMESTAMP_PATTERN};
pub use reader::{find_log_files, read_all_entries, read_file, LogFile};
pub use report::{generate_report, write_report, LogStats, ReportOptions};
