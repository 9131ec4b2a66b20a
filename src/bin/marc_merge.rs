//! Apply a changeset to a sorted MARC main file
//!
//! Usage:
//!   marc-merge --main main.mrc --mods mods.mrc --deletes deletes.txt --out new-main.mrc
//!   marc-merge --main part1.mrc part2.mrc --mods mods.mrc --min-id 1000 --max-id 2000
//!   marc-merge ... --delete-log deleted.log --delete-log-out deleted.new.log
//!
//! All inputs must be sorted by identifier in the configured order.

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;

use marc_stream::cli::{self, CommonArgs};
use marc_stream::config::load_env_file;
use marc_stream::sort_merge::DeleteLogStats;
use marc_stream::{DeleteLogReader, MergeStats, StreamMerger};

#[derive(Parser)]
#[command(name = "marc-merge")]
#[command(about = "Merge new, modified and deleted records into a sorted MARC file")]
struct Cli {
    /// Main file(s), read as one stream (`-` for stdin)
    #[arg(long, required = true, num_args = 1..)]
    main: Vec<PathBuf>,

    /// New and modified records
    #[arg(long, env = "MARC_MODS")]
    mods: Option<PathBuf>,

    /// Identifiers to delete, one per line (missing file = no deletes)
    #[arg(long, env = "MARC_DELETES")]
    deletes: Option<PathBuf>,

    /// Merged main file (stdout if omitted or `-`)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Also write added records here
    #[arg(long)]
    new_out: Option<PathBuf>,

    /// Lower bound (inclusive) of the main segment
    #[arg(long, env = "MARC_MIN_ID")]
    min_id: Option<String>,

    /// Upper bound (exclusive) of the main segment
    #[arg(long, env = "MARC_MAX_ID")]
    max_id: Option<String>,

    /// Existing delete log to update against the same changeset
    #[arg(long, requires = "delete_log_out")]
    delete_log: Option<PathBuf>,

    /// Updated delete log
    #[arg(long, requires = "delete_log")]
    delete_log_out: Option<PathBuf>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Serialize)]
struct Summary {
    merge: MergeStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    delete_log: Option<DeleteLogStats>,
}

fn main() -> Result<()> {
    load_env_file();
    let cli = Cli::parse();
    cli.common.init_logging();
    let config = cli.common.stream_config();
    let start = Instant::now();

    let from_stdin = |p: &Path| p.as_os_str() == "-";
    if cli.main.iter().any(|p| from_stdin(p)) && cli.mods.as_deref().is_some_and(from_stdin) {
        bail!("only one input can be read from stdin");
    }
    if cli.delete_log.is_some() && cli.mods.as_deref().is_some_and(from_stdin) {
        bail!("--delete-log reads the mods twice, they cannot come from stdin");
    }

    let main = cli::open_records(&cli.main, &config)?;
    let mods = cli::open_records(&mods_paths(&cli), &config)?;
    let deletes = open_deletes(cli.deletes.as_deref())?;

    let mut out = cli::open_output(cli.out.as_deref())?;
    let mut new_out = match &cli.new_out {
        Some(path) => Some(cli::open_output(Some(path))?),
        None => None,
    };
    let mut diagnostics = std::io::stderr();

    let mut merger =
        StreamMerger::new(config.order).with_bounds(cli.min_id.clone(), cli.max_id.clone());
    if let Some(new_out) = new_out.as_mut() {
        merger = merger.with_new_records(new_out);
    }
    if cli.common.verbose {
        merger = merger.with_diagnostics(&mut diagnostics);
    }

    let merge = merger
        .merge(main, mods, deletes, &mut out)
        .context("Merge failed")?;
    out.flush().context("Failed to flush merged output")?;
    drop(merger);
    if let Some(new_out) = new_out.as_mut() {
        new_out.flush().context("Failed to flush new records output")?;
    }
    info!(written = merge.written, "merge complete");

    let delete_log = match (&cli.delete_log, &cli.delete_log_out) {
        (Some(log), Some(log_out)) => Some(update_delete_log(&cli, log, log_out)?),
        _ => None,
    };

    cli.common.report(
        "MARC MERGE",
        &Summary { merge, delete_log },
        start.elapsed(),
    )
}

fn mods_paths(cli: &Cli) -> Vec<PathBuf> {
    cli.mods.iter().cloned().collect()
}

fn open_deletes(path: Option<&Path>) -> Result<DeleteLogReader<BufReader<File>>> {
    match path {
        Some(path) => DeleteLogReader::open_or_empty(path)
            .with_context(|| format!("Failed to open deletes {}", path.display())),
        None => Ok(DeleteLogReader::empty()),
    }
}

/// Second pass: the changeset is read again against the old delete log.
fn update_delete_log(cli: &Cli, log: &Path, log_out: &Path) -> Result<DeleteLogStats> {
    let config = cli.common.stream_config();
    let mods = cli::open_records(&mods_paths(cli), &config)?;
    let deletes = open_deletes(cli.deletes.as_deref())?;
    let log = open_deletes(Some(log))?;
    let mut out = cli::open_output(Some(log_out))?;

    let stats = StreamMerger::new(config.order)
        .merge_delete_log(log, mods, deletes, &mut out)
        .context("Delete log update failed")?;
    out.flush()
        .with_context(|| format!("Failed to flush {}", log_out.display()))?;
    Ok(stats)
}
