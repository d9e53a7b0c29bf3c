//! Custom tracing Layer that writes events through a [`TraceLogger`].
//!
//! Event levels map onto entry types, the enclosing span names (or the
//! event target when there is no span) become the operation, and extra
//! fields are rendered as `key=value` pairs in the extension field.
//!
//! ```ignore
//! use std::sync::Arc;
//! use tracelog_core::{TraceLogLayer, TraceLogger};
//! use tracing_subscriber::prelude::*;
//!
//! let logger = Arc::new(TraceLogger::new("trace.log", "./logs", "yyyy-MM-dd", 100)?);
//! let subscriber = tracing_subscriber::registry()
//!     .with(TraceLogLayer::new(logger.clone(), "web01"))
//!     .with(tracing_subscriber::fmt::layer());
//! tracing::subscriber::set_global_default(subscriber)?;
//!
//! // ... at shutdown
//! logger.close()?;
//! ```

use std::cell::Cell;
use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use crate::entry::{EntryType, LogEntry};
use crate::logger::TraceLogger;

/// Events from this crate are never routed back into the logger: the
/// logger emits them while holding its own lock.
const OWN_TARGET: &str = "tracelog_core";

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID: Cell<u64> = const { Cell::new(0) };
}

/// Small stable integer for the calling thread.
pub fn current_thread_id() -> u64 {
    THREAD_ID.with(|id| {
        if id.get() == 0 {
            id.set(NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed));
        }
        id.get()
    })
}

/// A tracing Layer that records events as trace-log entries.
pub struct TraceLogLayer {
    logger: Arc<TraceLogger>,
    server_name: String,
}

impl TraceLogLayer {
    /// Route events into `logger`, stamping every entry with `server_name`.
    pub fn new(logger: Arc<TraceLogger>, server_name: impl Into<String>) -> Self {
        Self {
            logger,
            server_name: server_name.into(),
        }
    }

    /// The logger events are written to.
    pub fn logger(&self) -> &Arc<TraceLogger> {
        &self.logger
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }
}

impl<S> Layer<S> for TraceLogLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if metadata.target().starts_with(OWN_TARGET) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let operation = ctx
            .event_scope(event)
            .map(|scope| {
                scope
                    .from_root()
                    .map(|span| span.name())
                    .collect::<Vec<_>>()
                    .join(" > ")
            })
            .filter(|spans| !spans.is_empty())
            .unwrap_or_else(|| metadata.target().to_string());

        let entry = LogEntry::new(
            Utc::now(),
            entry_type_for(metadata.level()),
            single_line(&self.server_name),
            current_thread_id(),
            single_line(&operation),
            single_line(&visitor.message.unwrap_or_default()),
        )
        .with_extra(single_line(&visitor.fields));

        // A layer has no caller to hand the error to.
        let _ = self.logger.log(&entry);
    }
}

/// Map a tracing level onto an entry type.
pub fn entry_type_for(level: &Level) -> EntryType {
    match *level {
        Level::ERROR => EntryType::Error,
        Level::WARN => EntryType::Warning,
        Level::INFO => EntryType::Informational,
        _ => EntryType::Verbose,
    }
}

/// Tabs and line breaks would split the line format apart.
fn single_line(value: &str) -> String {
    value.replace(['\t', '\r', '\n'], " ")
}

/// Visitor that splits the message from the remaining fields.
#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: String,
}

impl FieldVisitor {
    fn push_field(&mut self, name: &str, value: &dyn std::fmt::Display) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={}", name, value);
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.push_field(field.name(), &format_args!("{:?}", value));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.push_field(field.name(), &value);
        }
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.push_field(field.name(), &value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tracing_subscriber::prelude::*;

    #[test]
    fn test_layer_captures_events() {
        let temp = TempDir::new().unwrap();
        let logger = Arc::new(TraceLogger::new("trace.log", temp.path(), "", 100).unwrap());

        let subscriber = tracing_subscriber::registry().with(TraceLogLayer::new(logger.clone(), "web01"));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("Test message");
            let span = tracing::info_span!("checkout");
            let _guard = span.enter();
            tracing::warn!(count = 42, "Warning with field");
        });

        logger.close().unwrap();

        let content = std::fs::read_to_string(temp.path().join("trace.log")).unwrap();
        let lines: Vec<Vec<&str>> = content.lines().map(|l| l.split('\t').collect()).collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0][1], "Informational");
        assert_eq!(lines[0][2], "web01");
        assert_eq!(lines[0][5], "Test message");
        assert_eq!(lines[1][1], "Warning");
        assert_eq!(lines[1][4], "checkout");
        assert_eq!(lines[1][5], "Warning with field");
        assert_eq!(lines[1][6], "count=42");
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let temp = TempDir::new().unwrap();
        let logger = Arc::new(TraceLogger::new("trace.log", temp.path(), "", 1).unwrap());
        logger.close().unwrap();

        let subscriber = tracing_subscriber::registry().with(TraceLogLayer::new(logger.clone(), "web01"));

        // The closed logger rejects the entry; the event must not panic.
        tracing::subscriber::with_default(subscriber, || {
            tracing::error!("After close");
        });

        assert!(logger.is_closed());
        assert!(!temp.path().join("trace.log").exists());
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(entry_type_for(&Level::ERROR), EntryType::Error);
        assert_eq!(entry_type_for(&Level::WARN), EntryType::Warning);
        assert_eq!(entry_type_for(&Level::INFO), EntryType::Informational);
        assert_eq!(entry_type_for(&Level::DEBUG), EntryType::Verbose);
        assert_eq!(entry_type_for(&Level::TRACE), EntryType::Verbose);
    }

    #[test]
    fn test_thread_ids_are_stable_per_thread() {
        let here = current_thread_id();
        assert_eq!(here, current_thread_id());

        let there = std::thread::spawn(current_thread_id).join().unwrap();
        assert_ne!(here, there);
    }

    #[test]
    fn test_single_line_strips_separators() {
        assert_eq!(single_line("a\tb\r\nc"), "a b  c");
    }
}
