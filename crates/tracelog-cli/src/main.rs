//! tracelog CLI
//!
//! Thin wrapper around tracelog-core for command-line usage.
//!
//! ## Usage
//!
//! ```bash
//! # Append one entry to ./logs/trace.log
//! tracelog --root ./logs write "Service started"
//!
//! # Partition by hour, tagging type and operation
//! tracelog --root ./logs --pattern HH write --type warning --operation Sync "Slow peer"
//!
//! # Log every line of stdin
//! tail -f app.out | tracelog --root ./logs --flush-after 20 pipe --operation Tail
//!
//! # Read entries back in time order
//! tracelog --root ./logs cat
//!
//! # Per-type counts and a markdown report
//! tracelog --root ./logs stats
//! tracelog --root ./logs report --output LOGS.md
//!
//! # Write a config file, then use it
//! tracelog --root /var/log/app --pattern yyyy-MM-dd init-config tracelog.json
//! tracelog --config tracelog.json write "From config"
//! ```

use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracelog_core::{
    generate_report, read_all_entries, write_report, DatePattern, EntryFormatter, EntryType,
    LogEntry, LogStats, ReportOptions, TraceLogConfig, TraceLogger,
};

const DEFAULT_FILE_NAME: &str = "trace.log";

/// tracelog - buffered, time-partitioned trace logs
#[derive(Parser)]
#[command(name = "tracelog")]
#[command(version = "0.1.0")]
#[command(about = "Buffered, time-partitioned trace-log writer")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON config file; flags below override its values
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Root folder (default: <local data dir>/tracelog/logs)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Log file name inside the root or each bucket
    #[arg(short, long, global = true)]
    file: Option<String>,

    /// Bucket pattern, e.g. HH or yyyy-MM-dd (empty = one flat file)
    #[arg(short, long, global = true)]
    pattern: Option<String>,

    /// Flush every N entries
    #[arg(long, global = true)]
    flush_after: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a single entry
    Write {
        #[command(flatten)]
        fields: EntryFields,

        /// Message text
        message: String,
    },

    /// Log each non-empty line read from stdin
    Pipe {
        #[command(flatten)]
        fields: EntryFields,
    },

    /// Print every entry under the root in time order
    Cat,

    /// Print entry counts per type
    Stats,

    /// Generate a markdown report
    Report {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Include Verbose entries in bucket listings
        #[arg(long)]
        include_verbose: bool,

        /// Maximum entries listed per bucket (0 = all)
        #[arg(long, default_value_t = 0)]
        max_per_bucket: usize,
    },

    /// Write the effective configuration to a JSON file
    InitConfig {
        /// Destination path
        path: PathBuf,
    },
}

/// Fields shared by the commands that log entries
#[derive(Args)]
struct EntryFields {
    /// Entry type (verbose, info, warning, error, critical)
    #[arg(short = 't', long = "type", default_value = "informational")]
    entry_type: EntryType,

    /// Server name (default: $HOSTNAME)
    #[arg(short, long)]
    server: Option<String>,

    /// Thread identifier (default: process id)
    #[arg(long)]
    thread: Option<u64>,

    /// Operation label
    #[arg(short, long, default_value = "cli")]
    operation: String,

    /// Extension text for the trailing field
    #[arg(short, long, default_value = "")]
    extra: String,
}

impl EntryFields {
    fn entry(&self, message: impl Into<String>) -> LogEntry {
        let server = self.server.clone().unwrap_or_else(default_server_name);
        let thread = self.thread.unwrap_or_else(|| u64::from(std::process::id()));
        LogEntry::new(
            Utc::now(),
            self.entry_type,
            server,
            thread,
            &self.operation,
            message,
        )
        .with_extra(&self.extra)
    }
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();
}

/// Get the default root folder (<local data dir>/tracelog/logs)
fn default_root() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tracelog")
        .join("logs")
}

fn default_server_name() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "localhost".to_string())
}

/// Merge the config file (if any) with command-line overrides.
fn load_config(cli: &Cli) -> Result<TraceLogConfig> {
    let mut config = match &cli.config {
        Some(path) => TraceLogConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => TraceLogConfig::new(DEFAULT_FILE_NAME, default_root()),
    };

    if let Some(root) = &cli.root {
        config.root_folder = root.clone();
    }
    if let Some(file) = &cli.file {
        config.file_name = file.clone();
    }
    if let Some(pattern) = &cli.pattern {
        config.time_pattern = pattern.clone();
    }
    if let Some(flush_after) = cli.flush_after {
        config.flush_after = flush_after;
    }

    Ok(config)
}

fn formatter_for(config: &TraceLogConfig) -> Result<EntryFormatter> {
    let pattern = DatePattern::parse(&config.timestamp_pattern)
        .context("Invalid timestamp pattern in config")?;
    Ok(EntryFormatter::new(pattern))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Write { fields, message } => {
            let logger = TraceLogger::from_config(&config).context("Failed to open trace log")?;
            let entry = fields.entry(message.as_str());
            let path = logger.current_path(&entry.timestamp())?;

            logger.log(&entry)?;
            logger.close().context("Failed to flush trace log")?;

            println!("Wrote 1 entry to {}", path.display());
        }

        Commands::Pipe { fields } => {
            let logger = TraceLogger::from_config(&config).context("Failed to open trace log")?;
            let mut count = 0usize;

            for line in std::io::stdin().lock().lines() {
                let line = line.context("Failed to read stdin")?;
                let line = line.trim_end();
                if line.is_empty() {
                    continue;
                }
                logger.log(&fields.entry(line))?;
                count += 1;
            }
            logger.close().context("Failed to flush trace log")?;

            println!("Wrote {} entries under {}", count, config.root_folder.display());
        }

        Commands::Cat => {
            let formatter = formatter_for(&config)?;
            let entries = read_all_entries(&config.root_folder, &config.file_name, &formatter)?;
            for (_, entry) in entries {
                print!("{}", formatter.format(&entry));
            }
        }

        Commands::Stats => {
            let formatter = formatter_for(&config)?;
            let entries = read_all_entries(&config.root_folder, &config.file_name, &formatter)?;
            let stats = LogStats::from_entries(entries.iter().map(|(_, e)| e));

            println!("Root: {}", config.root_folder.display());
            println!("Total: {}", stats.total);
            for ty in EntryType::ALL {
                println!("  {}: {}", ty, stats.count(ty));
            }
        }

        Commands::Report {
            output,
            include_verbose,
            max_per_bucket,
        } => {
            let formatter = formatter_for(&config)?;
            let options = ReportOptions {
                include_verbose: *include_verbose,
                max_per_bucket: *max_per_bucket,
            };
            match output {
                Some(path) => {
                    write_report(
                        &config.root_folder,
                        &config.file_name,
                        &formatter,
                        path,
                        &options,
                    )
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Report written to {}", path.display());
                }
                None => {
                    let report = generate_report(
                        &config.root_folder,
                        &config.file_name,
                        &formatter,
                        &options,
                    )?;
                    print!("{}", report);
                }
            }
        }

        Commands::InitConfig { path } => {
            config
                .save(path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Config written to {}", path.display());
        }
    }

    Ok(())
}
