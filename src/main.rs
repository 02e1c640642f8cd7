// src/main.rs
//! logbridge command-line tool
//!
//! Reads binary log stores written by the logbridge appenders and prints
//! their entries as text or JSON lines.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use logbridge::entry::EntryReader;
use logbridge::observability::init_tracing;
use logbridge::processor::{EntryProcessor, JsonEntryProcessor, LineEntryProcessor};
use logbridge::store::{MmapTailer, RecordSource};
use logbridge::utils::config::{AppenderConfig, LoggerConfig};
use logbridge::CodecRegistry;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "logbridge", version, about = "Inspect logbridge binary log stores")]
struct Cli {
    /// Configuration file (TOML or YAML) describing the codecs to register
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the entries of a store file
    Tail {
        /// Store file written by an appender
        file: PathBuf,

        /// Emit one JSON object per entry
        #[arg(long)]
        json: bool,

        /// Stop after this many entries
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// List the encodings the configured registry can decode
    Codecs,
}

fn main() -> Result<()> {
    init_tracing("warn")?;

    let cli = Cli::parse();
    let config = LoggerConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let registry = Arc::new(
        CodecRegistry::from_configs(&config.codecs).context("building codec registry")?,
    );

    match cli.command {
        Command::Tail { file, json, limit } => tail(&file, registry, json, limit),
        Command::Codecs => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            for name in registry.names() {
                writeln!(out, "{}", name)?;
            }
            Ok(())
        }
    }
}

/// Warn when the store was written with an encoding this registry lacks
fn check_store_config(file: &Path, registry: &CodecRegistry) {
    match AppenderConfig::read_beside(file) {
        Ok(stored) if !registry.contains(&stored.content_encoding) => warn!(
            "Store was written with encoding '{}' which is not registered",
            stored.content_encoding
        ),
        Ok(stored) => info!(
            "Store written by appender '{}' ({}, {})",
            stored.name, stored.content_type, stored.content_encoding
        ),
        Err(_) => info!(
            "No appender config at {:?}",
            AppenderConfig::sidecar_path(file)
        ),
    }
}

fn tail(file: &Path, registry: Arc<CodecRegistry>, json: bool, limit: Option<usize>) -> Result<()> {
    check_store_config(file, &registry);

    let tailer = MmapTailer::open(file).with_context(|| format!("opening {:?}", file))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = print_entries(tailer, registry, json, limit, &mut out)
        .with_context(|| format!("tailing {:?}", file))?;

    info!(
        "Read {} entries from {:?} ({} skipped)",
        summary.read, file, summary.skipped
    );

    Ok(())
}

/// Outcome of one [`print_entries`] run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct TailSummary {
    read: usize,
    skipped: usize,
}

/// Render up to `limit` entries from `source` into `out`, one per line
///
/// Entries whose content cannot be rendered are logged and skipped; a record
/// that does not decode ends the run with an error.
fn print_entries<R: RecordSource, W: Write>(
    source: R,
    registry: Arc<CodecRegistry>,
    json: bool,
    limit: Option<usize>,
    out: &mut W,
) -> Result<TailSummary> {
    let mut reader = EntryReader::new(source);
    let lines = LineEntryProcessor::new(Arc::clone(&registry));
    let objects = JsonEntryProcessor::new(registry);
    let mut summary = TailSummary::default();

    while limit.map_or(true, |limit| summary.read < limit) {
        let Some(entry) = reader
            .read()
            .with_context(|| format!("reading entry {}", summary.read + 1))?
        else {
            break;
        };
        summary.read += 1;

        let rendered = if json {
            objects.apply(&entry).map(|value| value.to_string())
        } else {
            lines.apply(&entry)
        };

        match rendered {
            Ok(text) => writeln!(out, "{}", text)?,
            Err(e) => {
                warn!("Skipping entry {}: {}", summary.read, e);
                summary.skipped += 1;
            }
        }
    }

    out.flush()?;
    Ok(summary)
}
