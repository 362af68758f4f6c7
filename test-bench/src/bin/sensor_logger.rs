//! Live acquisition console for the EMI height sensor.
//!
//! Polls the board, prints smoothed readings and records them to CSV on
//! request. Type commands while it runs:
//!
//! ```text
//! start [name]   begin recording (generated name if omitted)
//! stop           finish the current recording
//! status         print counters
//! quit           stop recording and exit
//! ```

use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossbeam_channel::{select, tick};
use hardware::serial::{available_ports, SerialLineSource};
use hardware::{AcquisitionLoop, ConnectionError, TickOutcome};
use shared::{AcquisitionSettings, LogStorage, SmoothingBank};
use test_bench::commands::{spawn_command_reader, OperatorCommand};
use test_bench::console_display::ConsoleDisplay;
use tracing::{debug, error, info, warn};

/// Smoothed sensor readout with CSV recording
#[derive(Parser, Debug)]
#[command(name = "sensor_logger")]
#[command(about = "Acquire, smooth and record EMI height sensor readings")]
#[command(version)]
struct Args {
    /// Serial port (defaults to the first port found)
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate (overrides the settings file)
    #[arg(short, long)]
    baud: Option<u32>,

    /// Moving-average window length (overrides the settings file)
    #[arg(short, long)]
    window: Option<usize>,

    /// Poll interval in milliseconds (overrides the settings file)
    #[arg(long)]
    poll_ms: Option<u64>,

    /// Directory recordings are written to (overrides the settings file)
    #[arg(long)]
    logs_dir: Option<PathBuf>,

    /// JSON settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start recording immediately, optionally to the given file name
    #[arg(long, num_args = 0..=1, value_name = "NAME")]
    record: Option<Option<String>>,

    /// Only print every n-th reading
    #[arg(long, default_value = "1")]
    display_every: u64,

    /// List available ports and exit
    #[arg(long)]
    list_ports: bool,
}

impl Args {
    fn settings(&self) -> Result<AcquisitionSettings> {
        let mut settings = match &self.config {
            Some(path) => AcquisitionSettings::load_from_file(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?,
            None => AcquisitionSettings::default(),
        };

        if let Some(baud) = self.baud {
            settings.baud_rate = baud;
        }
        if let Some(window) = self.window {
            settings.window_size = window;
        }
        if let Some(poll_ms) = self.poll_ms {
            settings.poll_interval_ms = poll_ms;
        }
        if let Some(logs_dir) = &self.logs_dir {
            settings.logs_dir = logs_dir.clone();
        }

        settings.validate().context("Invalid settings")?;
        Ok(settings)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    if args.list_ports {
        for port in available_ports()? {
            println!("{port}");
        }
        return Ok(());
    }

    let settings = args.settings()?;
    debug!("Settings: {settings:?}");

    let port = match args.port.clone() {
        Some(port) => port,
        None => match available_ports()?.into_iter().next() {
            Some(port) => port,
            None => bail!("No serial ports found"),
        },
    };

    let mut acquisition = AcquisitionLoop::new(
        ConsoleDisplay::with_stride(args.display_every),
        SmoothingBank::new(settings.window_size),
        LogStorage::with_path(settings.logs_dir.clone()),
    );
    acquisition.connect(SerialLineSource::open(&port, settings.baud_rate)?);

    if let Some(name) = &args.record {
        let path = acquisition.start_recording(name.as_deref().unwrap_or(""))?;
        info!("Recording to {}", path.display());
    }

    let (commands, _input) = spawn_command_reader(BufReader::new(io::stdin()));
    let poll = tick(settings.poll_interval());
    let elapsed = tick(settings.elapsed_interval());
    let mut lost: Option<ConnectionError> = None;

    info!("Commands: start [name], stop, status, quit");
    loop {
        select! {
            recv(poll) -> _ => match acquisition.tick() {
                Ok(TickOutcome::Rejected(e)) => debug!("Rejected line: {e}"),
                Ok(_) => {}
                Err(e) => {
                    lost = Some(e);
                    break;
                }
            },
            recv(elapsed) -> _ => {
                acquisition.elapsed_tick();
            }
            recv(commands) -> command => match command {
                Ok(OperatorCommand::Start(name)) => match acquisition.start_recording(&name) {
                    Ok(path) => info!("Recording to {}", path.display()),
                    Err(e) => warn!("Could not start recording: {e}"),
                },
                Ok(OperatorCommand::Stop) => match acquisition.stop_recording() {
                    Ok(Some(path)) => info!("Recording saved to {}", path.display()),
                    Ok(None) => info!("Not recording"),
                    Err(e) => error!("Failed to close recording: {e}"),
                },
                Ok(OperatorCommand::Status) => {
                    let stats = acquisition.stats();
                    info!(
                        "{} lines, {} samples, {} rejected, {} rows written, {} write failures, recording: {}",
                        stats.lines_received,
                        stats.samples_accepted,
                        stats.lines_rejected,
                        stats.rows_written,
                        stats.write_failures,
                        acquisition.session().path().map_or("no".to_string(), |p| p.display().to_string()),
                    );
                }
                Ok(OperatorCommand::Quit) | Err(_) => break,
            },
        }
    }

    match acquisition.stop_recording() {
        Ok(Some(path)) => info!("Recording saved to {}", path.display()),
        Ok(None) => {}
        Err(e) => error!("Failed to close recording: {e}"),
    }

    let stats = acquisition.stats();
    info!(
        "{} samples accepted, {} lines rejected, {} rows written",
        stats.samples_accepted, stats.lines_rejected, stats.rows_written
    );

    if let Some(e) = lost {
        bail!("Connection to {port} lost: {e}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(extra: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("sensor_logger").chain(extra.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_cli_overrides_are_validated() {
        assert!(args(&["--baud", "0"]).settings().is_err());
        assert!(args(&["--window", "0"]).settings().is_err());
        assert!(args(&["--poll-ms", "0"]).settings().is_err());
        assert_eq!(args(&["--baud", "9600"]).settings().unwrap().baud_rate, 9600);
    }

    #[test]
    fn test_cli_overrides_file_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("acquisition.json");
        AcquisitionSettings {
            window_size: 8,
            ..Default::default()
        }
        .save_to_file(&path)
        .unwrap();

        let config = path.to_str().unwrap();
        let settings = args(&["--config", config]).settings().unwrap();
        assert_eq!(settings.window_size, 8);

        let settings = args(&["--config", config, "--window", "3"])
            .settings()
            .unwrap();
        assert_eq!(settings.window_size, 3);
    }

    #[test]
    fn test_record_flag_takes_optional_name() {
        assert_eq!(args(&[]).record, None);
        assert_eq!(args(&["--record"]).record, Some(None));
        assert_eq!(
            args(&["--record", "bench"]).record,
            Some(Some("bench".to_string()))
        );
    }
}
