//! The trace logger facade.
//!
//! [`TraceLogger`] ties the pieces together: every [`log`](TraceLogger::log)
//! call resolves the entry's target file, formats it, buffers the line and
//! flushes when the count threshold is reached. [`close`](TraceLogger::close)
//! writes out whatever is left.
//!
//! All mutable state sits behind one mutex, so a logger can be shared across
//! threads and the append-then-maybe-flush step never interleaves.

use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::buffer::BufferedWriter;
use crate::config::TraceLogConfig;
use crate::entry::LogEntry;
use crate::error::{TraceLogError, TraceLogResult};
use crate::format::EntryFormatter;
use crate::path::PathResolver;
use crate::pattern::DatePattern;

/// Lifecycle of a logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerState {
    /// Accepting entries
    Open,
    /// Final flush in progress
    Closing,
    /// Rejecting everything
    Closed,
}

struct Inner {
    state: LoggerState,
    resolver: PathResolver,
    formatter: EntryFormatter,
    buffer: BufferedWriter,
}

/// Buffered, optionally time-partitioned trace-log writer.
///
/// Lines reach the disk on every `flush_after`-th call, on an explicit
/// [`flush`](Self::flush), and on [`close`](Self::close). Dropping an open
/// logger makes a best-effort final flush, but only `close` reports failure.
pub struct TraceLogger {
    file_name: String,
    root_folder: PathBuf,
    flush_after: NonZeroUsize,
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for TraceLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceLogger")
            .field("file_name", &self.file_name)
            .field("root_folder", &self.root_folder)
            .field("flush_after", &self.flush_after)
            .field("state", &self.state())
            .finish()
    }
}

impl TraceLogger {
    /// Create a logger writing `file_name` under `root_folder`.
    ///
    /// An empty `time_pattern` writes one flat file; otherwise each entry goes
    /// to `root_folder/<bucket>/file_name`. Arguments are validated before the
    /// file system is touched; then `root_folder` is created if missing.
    pub fn new(
        file_name: impl Into<String>,
        root_folder: impl Into<PathBuf>,
        time_pattern: &str,
        flush_after: usize,
    ) -> TraceLogResult<Self> {
        Self::builder(file_name, root_folder)
            .time_pattern(time_pattern)
            .flush_after(flush_after)
            .build()
    }

    /// Start a builder with default pattern and flush threshold.
    pub fn builder(
        file_name: impl Into<String>,
        root_folder: impl Into<PathBuf>,
    ) -> TraceLoggerBuilder {
        TraceLoggerBuilder {
            config: TraceLogConfig::new(file_name, root_folder),
        }
    }

    /// Create a logger from a configuration.
    pub fn from_config(config: &TraceLogConfig) -> TraceLogResult<Self> {
        let flush_after = NonZeroUsize::new(config.flush_after).ok_or_else(|| {
            TraceLogError::Config("flush_after must be greater than zero".to_string())
        })?;
        validate_file_name(&config.file_name)?;
        if config.root_folder.as_os_str().is_empty() {
            return Err(TraceLogError::Config("root_folder must not be empty".to_string()));
        }

        let resolver = PathResolver::new(
            config.root_folder.clone(),
            config.file_name.clone(),
            &config.time_pattern,
        )?;
        let formatter = EntryFormatter::new(DatePattern::parse(&config.timestamp_pattern)?);

        fs::create_dir_all(&config.root_folder)
            .map_err(|e| TraceLogError::io(&config.root_folder, e))?;

        tracing::info!(
            root = %config.root_folder.display(),
            file = %config.file_name,
            pattern = %config.time_pattern,
            flush_after = flush_after.get(),
            "Opened trace logger"
        );

        Ok(Self {
            file_name: config.file_name.clone(),
            root_folder: config.root_folder.clone(),
            flush_after,
            inner: Mutex::new(Inner {
                state: LoggerState::Open,
                resolver,
                formatter,
                buffer: BufferedWriter::new(flush_after),
            }),
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn flush_after(&self) -> NonZeroUsize {
        self.flush_after
    }

    pub fn state(&self) -> LoggerState {
        self.inner.lock().state
    }

    pub fn is_closed(&self) -> bool {
        self.state() == LoggerState::Closed
    }

    /// Number of lines buffered but not yet on disk.
    pub fn pending(&self) -> usize {
        self.inner.lock().buffer.pending()
    }

    /// File an entry stamped `timestamp` would be written to.
    pub fn current_path(&self, timestamp: &DateTime<Utc>) -> TraceLogResult<PathBuf> {
        self.inner.lock().resolver.path_for(timestamp)
    }

    /// Record one entry.
    ///
    /// Returns immediately unless this call reaches the flush threshold, in
    /// which case it blocks until every buffered line has been appended. On a
    /// flush error the entry stays buffered and is written by a later flush.
    pub fn log(&self, entry: &LogEntry) -> TraceLogResult<()> {
        let mut inner = self.inner.lock();
        if inner.state != LoggerState::Open {
            return Err(TraceLogError::AlreadyClosed);
        }

        let path = inner.resolver.resolve(&entry.timestamp())?;
        let line = inner.formatter.format(entry);
        inner.buffer.write(path, line)
    }

    /// Write every buffered line now.
    pub fn flush(&self) -> TraceLogResult<()> {
        let mut inner = self.inner.lock();
        if inner.state != LoggerState::Open {
            return Err(TraceLogError::AlreadyClosed);
        }
        inner.buffer.flush()
    }

    /// Flush everything and stop accepting entries.
    ///
    /// If the final flush fails the logger stays open with its lines intact,
    /// so `close` can be called again once the cause is fixed.
    pub fn close(&self) -> TraceLogResult<()> {
        let mut inner = self.inner.lock();
        match inner.state {
            LoggerState::Open => {}
            LoggerState::Closing | LoggerState::Closed => return Err(TraceLogError::AlreadyClosed),
        }

        inner.state = LoggerState::Closing;
        match inner.buffer.flush() {
            Ok(()) => {
                inner.state = LoggerState::Closed;
                tracing::info!(
                    root = %self.root_folder.display(),
                    file = %self.file_name,
                    "Closed trace logger"
                );
                Ok(())
            }
            Err(e) => {
                inner.state = LoggerState::Open;
                Err(e)
            }
        }
    }
}

impl Drop for TraceLogger {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        if inner.state != LoggerState::Open {
            return;
        }

        inner.state = LoggerState::Closing;
        let pending = inner.buffer.pending();
        if let Err(e) = inner.buffer.flush() {
            tracing::error!(
                root = %self.root_folder.display(),
                file = %self.file_name,
                pending,
                error = %e,
                "Trace logger dropped without close; buffered lines lost"
            );
        }
        inner.state = LoggerState::Closed;
    }
}

/// Builder for [`TraceLogger`].
#[derive(Debug, Clone)]
pub struct TraceLoggerBuilder {
    config: TraceLogConfig,
}

impl TraceLoggerBuilder {
    /// Bucket pattern; empty disables partitioning.
    pub fn time_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.time_pattern = pattern.into();
        self
    }

    pub fn flush_after(mut self, flush_after: usize) -> Self {
        self.config.flush_after = flush_after;
        self
    }

    /// Layout of the timestamp field.
    pub fn timestamp_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.timestamp_pattern = pattern.into();
        self
    }

    pub fn build(self) -> TraceLogResult<TraceLogger> {
        TraceLogger::from_config(&self.config)
    }
}

fn validate_file_name(file_name: &str) -> TraceLogResult<()> {
    if file_name.is_empty() {
        return Err(TraceLogError::Config("file_name must not be empty".to_string()));
    }
    if file_name.contains(['/', '\\']) || file_name == "." || file_name == ".." {
        return Err(TraceLogError::Config(format!(
            "file_name must be a plain file name, got {file_name:?}"
        )));
    }
    Ok(())
}
