//! Plot a recorded sensor log.
//!
//! ```text
//! csv_plotter logs/bench_run.csv --output-dir plots
//! csv_plotter                      # newest log in ./logs
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use shared::log_storage::DEFAULT_LOGS_DIR;
use shared::{read_log, LogStorage};
use test_bench::log_plots::render_log_plots;
use tracing::{debug, info, warn};

/// Replay a sensor log as PNG charts
#[derive(Parser, Debug)]
#[command(name = "csv_plotter")]
#[command(about = "Render height and tilt charts from a sensor log")]
#[command(version)]
struct Args {
    /// Log file to plot (defaults to the newest log in --logs-dir)
    file: Option<PathBuf>,

    /// Directory searched when no file is given
    #[arg(long, default_value = DEFAULT_LOGS_DIR)]
    logs_dir: PathBuf,

    /// Directory the charts are written to
    #[arg(short, long, default_value = "plots")]
    output_dir: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let path = match args.file {
        Some(path) => path,
        None => {
            let storage = LogStorage::with_path(args.logs_dir);
            match storage.latest_log().with_context(|| {
                format!("Failed to list logs in {}", storage.root_path().display())
            })? {
                Some(path) => path,
                None => bail!("No logs found in {}", storage.root_path().display()),
            }
        }
    };

    info!("Plotting: {}", path.display());
    let replay = read_log(&path).with_context(|| format!("Failed to read {}", path.display()))?;

    for skipped in &replay.skipped {
        debug!("Row {}: {}", skipped.row, skipped.reason);
    }
    if replay.skipped_count() > 0 {
        warn!("Skipped {} malformed rows", replay.skipped_count());
    }
    if replay.is_empty() {
        warn!("{} has no readable rows", path.display());
    }
    info!("{} samples loaded", replay.len());

    for written in render_log_plots(&replay, &args.output_dir)? {
        println!("{}", written.display());
    }
    Ok(())
}
