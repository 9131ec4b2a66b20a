//! Shared plumbing for the `marc-merge`, `marc-sort` and `marc-diff` executables
//!
//! Stdout is reserved for record data; logs, banners and summaries go to stderr.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Args};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::config::StreamConfig;
use crate::natural_order::OrderKind;
use crate::raw_record::Tag;
use crate::reader::RawRecordReader;

const IO_BUFFER_SIZE: usize = 1024 * 1024;
const RULE_WIDTH: usize = 60;

/// Options every executable understands.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Control field holding the record identifier
    #[arg(long, env = "MARC_ID_TAG", default_value = "001")]
    pub id_tag: Tag,

    /// Fold consecutive records with the same identifier into one
    #[arg(long, env = "MARC_COMBINE", default_value_t = true, action = ArgAction::Set)]
    pub combine: bool,

    /// Identifier order of all inputs (natural or lexical)
    #[arg(long, env = "MARC_ORDER", default_value = "natural")]
    pub order: OrderKind,

    /// Per-record diagnostics
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Warnings and errors only
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the run summary as JSON instead of the banner
    #[arg(long)]
    pub json_summary: bool,
}

impl CommonArgs {
    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig::default()
            .with_id_tag(self.id_tag)
            .with_combine(self.combine)
            .with_order(self.order)
    }

    pub fn init_logging(&self) {
        init_logging(self.quiet, self.verbose);
    }

    /// Report `summary` on stderr, as JSON or as a banner with one line per field.
    pub fn report<T: Serialize>(&self, title: &str, summary: &T, elapsed: Duration) -> Result<()> {
        if self.json_summary {
            let json = serde_json::to_string_pretty(summary).context("serializing summary")?;
            eprintln!("{json}");
            return Ok(());
        }
        if self.quiet {
            return Ok(());
        }
        let value = serde_json::to_value(summary).context("serializing summary")?;
        banner(title);
        print_fields("", &value);
        eprintln!("  Time: {:.2}s", elapsed.as_secs_f64());
        rule();
        Ok(())
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over the flags when set.
pub fn init_logging(quiet: bool, verbose: bool) {
    let default_level = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// One reader over all `paths` read back to back; `-` is stdin.
pub fn open_inputs(paths: &[PathBuf]) -> Result<Box<dyn Read>> {
    let mut input: Box<dyn Read> = Box::new(io::empty());
    for path in paths {
        let next: Box<dyn Read> = if path.as_os_str() == "-" {
            Box::new(io::stdin().lock())
        } else {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input {}", path.display()))?;
            Box::new(BufReader::with_capacity(IO_BUFFER_SIZE, file))
        };
        input = Box::new(input.chain(next));
    }
    Ok(input)
}

/// Record reader over the concatenation of `paths`.
pub fn open_records(
    paths: &[PathBuf],
    config: &StreamConfig,
) -> Result<RawRecordReader<Box<dyn Read>>> {
    let label = paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join("+");
    Ok(RawRecordReader::new(open_inputs(paths)?, config).with_label(label))
}

/// Buffered output file, or stdout for `None` and `-`.
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) if path.as_os_str() != "-" => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output {}", path.display()))?;
            Ok(Box::new(BufWriter::with_capacity(IO_BUFFER_SIZE, file)))
        }
        _ => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

pub fn banner(title: &str) {
    eprintln!("\n{}", "═".repeat(RULE_WIDTH));
    eprintln!("{title}");
    eprintln!("{}", "═".repeat(RULE_WIDTH));
}

pub fn rule() {
    eprintln!("{}", "═".repeat(RULE_WIDTH));
}

fn print_fields(prefix: &str, value: &serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, value) in map {
                let name = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                print_fields(&name, value);
            }
        }
        other => eprintln!("  {prefix}: {other}"),
    }
}
