//! Compare two sorted MARC files
//!
//! Usage:
//!   marc-diff old.mrc new.mrc                  # line diff of changed records
//!   marc-diff old.mrc new.mrc --mode summary   # identifiers only
//!
//! Exit code 0 when the files hold the same records, 1 when they differ.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;

use marc_stream::cli::{self, CommonArgs};
use marc_stream::config::load_env_file;
use marc_stream::{DiffMode, LineFormat, StreamDiffer};

#[derive(Parser)]
#[command(name = "marc-diff")]
#[command(about = "Report records added, removed or changed between two sorted MARC files")]
struct Cli {
    /// Left (old) file, `-` for stdin
    left: PathBuf,

    /// Right (new) file, `-` for stdin
    right: PathBuf,

    /// summary, full or lines
    #[arg(long, env = "MARC_DIFF_MODE", default_value = "lines")]
    mode: DiffMode,

    /// Report (stdout if omitted or `-`)
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> Result<ExitCode> {
    load_env_file();
    let cli = Cli::parse();
    cli.common.init_logging();
    let config = cli.common.stream_config();
    let start = Instant::now();

    if cli.left.as_os_str() == "-" && cli.right.as_os_str() == "-" {
        bail!("only one input can be read from stdin");
    }

    let left = cli::open_records(std::slice::from_ref(&cli.left), &config)?;
    let right = cli::open_records(std::slice::from_ref(&cli.right), &config)?;
    let mut out = cli::open_output(cli.out.as_deref())?;

    let stats = StreamDiffer::new(config.order, LineFormat)
        .with_mode(cli.mode)
        .diff_to_writer(left, right, &mut out)
        .context("Diff failed")?;

    cli.common.report("MARC DIFF", &stats, start.elapsed())?;
    Ok(if stats.has_differences() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
