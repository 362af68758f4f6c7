//! Print lines from the sensor board and whether they parse.
//!
//! Useful for checking wiring and baud rate before running the logger:
//!
//! ```text
//! listen_sensor --port /dev/ttyACM0
//! listen_sensor --list
//! ```

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use clap::Parser;
use emi_protocol::parse;
use hardware::serial::{available_ports, SerialLineSource, DEFAULT_BAUD_RATE};
use hardware::LineSource;
use tracing::{info, warn};

/// Raw line monitor for the EMI height sensor
#[derive(Parser, Debug)]
#[command(name = "listen_sensor")]
#[command(about = "Print raw sensor lines and their parse result")]
#[command(version)]
struct Args {
    /// Serial port (defaults to the first port found)
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate
    #[arg(short, long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Stop after this many seconds (0 = run until disconnected)
    #[arg(short, long, default_value = "0")]
    duration: u64,

    /// List available ports and exit
    #[arg(long)]
    list: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    if args.list {
        for port in available_ports()? {
            println!("{port}");
        }
        return Ok(());
    }

    let port = match args.port {
        Some(port) => port,
        None => match available_ports()?.into_iter().next() {
            Some(port) => port,
            None => bail!("No serial ports found"),
        },
    };
    let mut source = SerialLineSource::open(&port, args.baud)?;

    let start = Instant::now();
    let limit = (args.duration > 0).then(|| Duration::from_secs(args.duration));
    let (mut good, mut bad) = (0u64, 0u64);

    while limit.is_none_or(|limit| start.elapsed() < limit) {
        match source.poll_line()? {
            Some(line) => match parse(&line) {
                Ok(sample) => {
                    good += 1;
                    println!("OK   {line:<40} {:?}", sample.values());
                }
                Err(e) => {
                    bad += 1;
                    warn!("BAD  {line:?}: {e}");
                }
            },
            None => thread::sleep(Duration::from_millis(10)),
        }
    }

    info!("{good} valid lines, {bad} rejected");
    Ok(())
}
