//! Summaries of written trace logs.
//!
//! Produces per-type statistics and a markdown report grouped by bucket.
//! Reports are views over the log files and can be regenerated at any time.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::fs;
use std::path::Path;

use crate::entry::{EntryType, LogEntry};
use crate::error::{TraceLogError, TraceLogResult};
use crate::format::EntryFormatter;
use crate::reader::read_all_entries;

/// Entry counts per type.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LogStats {
    pub total: usize,
    pub by_type: BTreeMap<EntryType, usize>,
}

impl LogStats {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a LogEntry>) -> Self {
        let mut stats = Self::default();
        for entry in entries {
            stats.total += 1;
            *stats.by_type.entry(entry.entry_type()).or_default() += 1;
        }
        stats
    }

    pub fn count(&self, entry_type: EntryType) -> usize {
        self.by_type.get(&entry_type).copied().unwrap_or(0)
    }
}

/// Options for report generation.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Include Verbose entries in the per-bucket listings
    pub include_verbose: bool,

    /// Maximum entries listed per bucket (0 = unlimited)
    pub max_per_bucket: usize,
}

/// Generate a markdown report for every `file_name` under `root`.
pub fn generate_report(
    root: impl AsRef<Path>,
    file_name: &str,
    formatter: &EntryFormatter,
    options: &ReportOptions,
) -> TraceLogResult<String> {
    let root = root.as_ref();
    let entries = read_all_entries(root, file_name, formatter)?;

    let mut report = String::new();
    let _ = writeln!(report, "# Trace Log Report: `{}`", file_name);
    let _ = writeln!(report);

    if entries.is_empty() {
        let _ = writeln!(report, "No log entries found under `{}`.", root.display());
        return Ok(report);
    }

    let stats = LogStats::from_entries(entries.iter().map(|(_, e)| e));

    if let (Some((_, first)), Some((_, last))) = (entries.first(), entries.last()) {
        let pattern = formatter.timestamp_pattern();
        let _ = writeln!(
            report,
            "**Span:** {} to {}",
            pattern.render(&first.timestamp()),
            pattern.render(&last.timestamp())
        );
        let _ = writeln!(report);
    }

    let _ = writeln!(report, "## Statistics");
    let _ = writeln!(report);
    let _ = writeln!(report, "| Type | Count |");
    let _ = writeln!(report, "|------|-------|");
    let _ = writeln!(report, "| Total | {} |", stats.total);
    for ty in EntryType::ALL {
        let _ = writeln!(report, "| {} | {} |", ty, stats.count(ty));
    }
    let _ = writeln!(report);

    let problems: Vec<_> = entries
        .iter()
        .filter(|(_, e)| e.entry_type() >= EntryType::Error)
        .collect();
    if !problems.is_empty() {
        let _ = writeln!(report, "## Errors");
        let _ = writeln!(report);
        for (_, entry) in problems {
            let _ = writeln!(
                report,
                "- **[{}]** `{}` - {}",
                entry.server_name(),
                entry.operation(),
                entry.message()
            );
            if !entry.extra().is_empty() {
                let _ = writeln!(report, "  - Extra: `{}`", entry.extra());
            }
        }
        let _ = writeln!(report);
    }

    let mut by_bucket: BTreeMap<String, Vec<&LogEntry>> = BTreeMap::new();
    for (file, entry) in &entries {
        let bucket = file.bucket.clone().unwrap_or_else(|| "(flat)".to_string());
        by_bucket.entry(bucket).or_default().push(entry);
    }

    for (bucket, bucket_entries) in &by_bucket {
        let bucket_stats = LogStats::from_entries(bucket_entries.iter().copied());
        let _ = writeln!(report, "## Bucket: `{}`", bucket);
        let _ = writeln!(report);
        let _ = writeln!(
            report,
            "Total: {} entries ({} warning, {} error)",
            bucket_stats.total,
            bucket_stats.count(EntryType::Warning),
            bucket_stats.count(EntryType::Error) + bucket_stats.count(EntryType::Critical)
        );
        let _ = writeln!(report);
        let _ = writeln!(report, "```log");

        let shown: Vec<_> = bucket_entries
            .iter()
            .filter(|e| options.include_verbose || e.entry_type() != EntryType::Verbose)
            .collect();
        let limit = if options.max_per_bucket > 0 {
            options.max_per_bucket.min(shown.len())
        } else {
            shown.len()
        };

        for entry in &shown[..limit] {
            let _ = write!(report, "{}", formatter.format(entry).trim_end());
            let _ = writeln!(report);
        }
        if limit < shown.len() {
            let _ = writeln!(report, "... ({} more entries truncated)", shown.len() - limit);
        }

        let _ = writeln!(report, "```");
        let _ = writeln!(report);
    }

    Ok(report)
}

/// Generate the report and write it to `output_path`.
pub fn write_report(
    root: impl AsRef<Path>,
    file_name: &str,
    formatter: &EntryFormatter,
    output_path: impl AsRef<Path>,
    options: &ReportOptions,
) -> TraceLogResult<()> {
    let report = generate_report(root, file_name, formatter, options)?;
    let output_path = output_path.as_ref();
    fs::write(output_path, report).map_err(|e| TraceLogError::io(output_path, e))
}
