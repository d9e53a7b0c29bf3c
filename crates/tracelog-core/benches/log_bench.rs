//! Benchmarks for the trace-log writer
//!
//! Run with: cargo bench -p tracelog-core
//!
//! These benchmarks establish baselines for:
//! - Line formatting
//! - Buffered logging at different flush thresholds
//! - Bucketed logging across several hours

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tempfile::TempDir;
use tracelog_core::{EntryFormatter, EntryType, LogEntry, TraceLogger};

fn sample_entry(hour: u32) -> LogEntry {
    LogEntry::new(
        Utc.with_ymd_and_hms(2012, 1, 1, hour, 0, 0).unwrap(),
        EntryType::Informational,
        "Server",
        123,
        "TestOp",
        "Message",
    )
}

// ============================================================================
// Formatting Benchmarks
// ============================================================================

fn bench_format(c: &mut Criterion) {
    let formatter = EntryFormatter::default();
    let entry = sample_entry(8);

    c.bench_function("format_entry", |b| {
        b.iter(|| black_box(formatter.format(black_box(&entry))))
    });
}

// ============================================================================
// Logging Benchmarks
// ============================================================================

fn bench_log_flush_thresholds(c: &mut Criterion) {
    let mut group = c.benchmark_group("log_1000_entries");
    group.throughput(Throughput::Elements(1000));

    for flush_after in [1usize, 10, 100, 1000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(flush_after),
            &flush_after,
            |b, &flush_after| {
                let entry = sample_entry(8);
                b.iter_batched(
                    || {
                        let root = TempDir::new().unwrap();
                        let logger = TraceLogger::new("log.txt", root.path(), "", flush_after).unwrap();
                        (root, logger)
                    },
                    |(root, logger)| {
                        for _ in 0..1000 {
                            logger.log(&entry).unwrap();
                        }
                        logger.close().unwrap();
                        root
                    },
                    criterion::BatchSize::PerIteration,
                )
            },
        );
    }

    group.finish();
}

fn bench_log_bucketed(c: &mut Criterion) {
    let entries: Vec<_> = (0..24).map(sample_entry).collect();

    c.bench_function("log_1000_entries_24_buckets", |b| {
        b.iter_batched(
            || {
                let root = TempDir::new().unwrap();
                let logger = TraceLogger::new("log.txt", root.path(), "HH", 100).unwrap();
                (root, logger)
            },
            |(root, logger)| {
                for i in 0..1000 {
                    logger.log(&entries[i % entries.len()]).unwrap();
                }
                logger.close().unwrap();
                root
            },
            criterion::BatchSize::PerIteration,
        )
    });
}

criterion_group!(
    benches,
    bench_format,
    bench_log_flush_thresholds,
    bench_log_bucketed
);
criterion_main!(benches);
