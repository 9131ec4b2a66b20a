//! Sort a MARC file by identifier, or check that it is sorted
//!
//! Usage:
//!   marc-sort unsorted.mrc --out sorted.mrc
//!   cat a.mrc b.mrc | marc-sort - > sorted.mrc
//!   marc-sort --check sorted.mrc     # exit 1 at the first record out of order

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

use marc_stream::cli::{self, CommonArgs};
use marc_stream::config::load_env_file;
use marc_stream::{MarcError, StreamSorter};

#[derive(Parser)]
#[command(name = "marc-sort")]
#[command(about = "Sort MARC records by identifier or verify their order")]
struct Cli {
    /// Input file(s), read as one stream (`-` for stdin)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Only verify the order; nothing is written
    #[arg(long)]
    check: bool,

    /// Sorted output (stdout if omitted or `-`)
    #[arg(long, conflicts_with = "check")]
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

    let input = cli::open_records(&cli.inputs, &config)?;
    let sorter = StreamSorter::new(config.order);

    if cli.check {
        return match sorter.check(input) {
            Ok(result) => {
                cli.common.report("MARC SORT CHECK", &result, start.elapsed())?;
                Ok(ExitCode::SUCCESS)
            }
            Err(e @ MarcError::OrderViolation { .. }) => {
                error!("❌ {e}");
                Ok(ExitCode::FAILURE)
            }
            Err(e) => Err(e).context("Order check failed"),
        };
    }

    let mut out = cli::open_output(cli.out.as_deref())?;
    let result = sorter.sort(input, &mut out).context("Sort failed")?;
    out.flush().context("Failed to flush sorted output")?;
    cli.common.report("MARC SORT", &result, start.elapsed())?;
    Ok(ExitCode::SUCCESS)
}
