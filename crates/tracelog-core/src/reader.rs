//! Read trace-log files back into entries.
//!
//! Walks a root folder for every file with the logger's file name, flat or
//! inside bucket directories, and parses each line with an
//! [`EntryFormatter`]. Lines that fail to parse are skipped with a warning.

use std::fs;
use std::path::{Path, PathBuf};

use crate::entry::LogEntry;
use crate::error::{TraceLogError, TraceLogResult};
use crate::format::EntryFormatter;

/// One log file found under a root folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    pub path: PathBuf,
    /// Directory between the root and the file, `None` for the flat file
    pub bucket: Option<String>,
}

/// Find every `file_name` under `root`, sorted by path.
pub fn find_log_files(root: impl AsRef<Path>, file_name: &str) -> TraceLogResult<Vec<LogFile>> {
    let root = root.as_ref();
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).map_err(|e| TraceLogError::io(&dir, e))? {
            let entry = entry.map_err(|e| TraceLogError::io(&dir, e))?;
            let path = entry.path();
            // Symlinks are not followed, so a link back up cannot loop.
            let file_type = entry.file_type().map_err(|e| TraceLogError::io(&path, e))?;

            if file_type.is_dir() {
                stack.push(path);
            } else if path.file_name().is_some_and(|name| name == file_name) {
                let bucket = path
                    .parent()
                    .and_then(|parent| parent.strip_prefix(root).ok())
                    .filter(|rel| !rel.as_os_str().is_empty())
                    .map(|rel| {
                        rel.components()
                            .map(|c| c.as_os_str().to_string_lossy())
                            .collect::<Vec<_>>()
                            .join("/")
                    });
                files.push(LogFile { path, bucket });
            }
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// Parse every line of one file, in file order.
pub fn read_file(
    path: impl AsRef<Path>,
    formatter: &EntryFormatter,
) -> TraceLogResult<Vec<LogEntry>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| TraceLogError::io(path, e))?;

    let mut entries = Vec::new();
    for (number, line) in content.split_terminator('\n').enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            continue;
        }
        match formatter.parse(line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    line = number + 1,
                    error = %e,
                    "Skipping unparseable log line"
                );
            }
        }
    }
    Ok(entries)
}

/// Read every entry under `root`, sorted by timestamp.
///
/// The sort is stable, so entries with equal timestamps keep file order.
pub fn read_all_entries(
    root: impl AsRef<Path>,
    file_name: &str,
    formatter: &EntryFormatter,
) -> TraceLogResult<Vec<(LogFile, LogEntry)>> {
    let mut all = Vec::new();
    for file in find_log_files(root, file_name)? {
        for entry in read_file(&file.path, formatter)? {
            all.push((file.clone(), entry));
        }
    }

    all.sort_by_key(|(_, entry)| entry.timestamp());
    Ok(all)
}
