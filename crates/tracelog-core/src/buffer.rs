//! Per-file line buffers and the count-based flush policy.
//!
//! One call counter is shared by every target file. Each `flush_after`-th
//! append flushes every file that holds unflushed lines, so a quiet bucket
//! is written out together with a busy one.
//!
//! A flush recreates the file's directory if it went missing, opens the
//! file in append mode, writes that file's lines in
//! arrival order and drops the handle before moving on. Nothing stays open
//! between flushes. When a write fails, the failing file's lines stay
//! buffered, and so do those of any file not reached yet. Retrying can then
//! duplicate a partially written batch but never drops one.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::error::{TraceLogError, TraceLogResult};

/// Buffers formatted lines per target path and writes them out.
#[derive(Debug)]
pub struct BufferedWriter {
    flush_after: NonZeroUsize,
    /// Appends since the last policy flush.
    calls: usize,
    /// Sorted by path so flush order is deterministic.
    pending: BTreeMap<PathBuf, Vec<String>>,
}

impl BufferedWriter {
    pub fn new(flush_after: NonZeroUsize) -> Self {
        Self {
            flush_after,
            calls: 0,
            pending: BTreeMap::new(),
        }
    }

    pub fn flush_after(&self) -> NonZeroUsize {
        self.flush_after
    }

    /// Buffer one line for `path`. Returns true when the policy wants a flush.
    pub fn append(&mut self, path: PathBuf, line: String) -> bool {
        self.pending.entry(path).or_default().push(line);
        self.calls += 1;

        if self.calls >= self.flush_after.get() {
            self.calls = 0;
            true
        } else {
            false
        }
    }

    /// Buffer one line and flush if the policy says so.
    pub fn write(&mut self, path: PathBuf, line: String) -> TraceLogResult<()> {
        if self.append(path, line) {
            self.flush()?;
        }
        Ok(())
    }

    /// Total number of buffered lines.
    pub fn pending(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    /// Number of buffered lines for one path.
    pub fn pending_for(&self, path: &Path) -> usize {
        self.pending.get(path).map_or(0, Vec::len)
    }

    /// Paths that currently hold unflushed lines.
    pub fn pending_paths(&self) -> impl Iterator<Item = &Path> {
        self.pending.keys().map(PathBuf::as_path)
    }

    /// Write every buffered line to disk.
    ///
    /// Stops at the first failing path and returns its error; that path and
    /// any after it keep their lines.
    pub fn flush(&mut self) -> TraceLogResult<()> {
        while let Some(entry) = self.pending.first_entry() {
            if let Err(e) = append_lines(entry.key(), entry.get()) {
                tracing::warn!(
                    path = %entry.key().display(),
                    lines = entry.get().len(),
                    error = %e,
                    "Flush failed, lines kept for retry"
                );
                return Err(e);
            }

            let lines = entry.get().len();
            let (path, _) = entry.remove_entry();
            tracing::debug!(path = %path.display(), lines, "Flushed trace log lines");
        }
        Ok(())
    }
}

/// Append `lines` to `path` in one buffered write. The handle is dropped on
/// return, on both the success and the error path.
fn append_lines(path: &Path, lines: &[String]) -> TraceLogResult<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| TraceLogError::io(dir, e))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| TraceLogError::io(path, e))?;

    let mut writer = BufWriter::new(file);
    for line in lines {
        writer
            .write_all(line.as_bytes())
            .map_err(|e| TraceLogError::io(path, e))?;
    }
    writer.flush().map_err(|e| TraceLogError::io(path, e))?;

    Ok(())
}
