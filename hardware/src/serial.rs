//! Serial port driver for the sensor board.
//!
//! The board enumerates as a USB CDC serial device and streams one line per
//! measurement cycle at [`DEFAULT_BAUD_RATE`] (8N1, no flow control).
//!
//! # Example
//!
//! ```no_run
//! use hardware::serial::{available_ports, SerialLineSource, DEFAULT_BAUD_RATE};
//! use hardware::LineSource;
//!
//! let ports = available_ports()?;
//! let mut source = SerialLineSource::open(&ports[0], DEFAULT_BAUD_RATE)?;
//!
//! if let Some(line) = source.poll_line()? {
//!     println!("{line}");
//! }
//! # Ok::<(), hardware::ConnectionError>(())
//! ```

use std::io::{ErrorKind, Read};
use std::time::Duration;

use serialport::SerialPort;
use tracing::{debug, info};

use crate::source::{ConnectionError, LineFramer, LineSource};

pub use shared::settings::DEFAULT_BAUD_RATE;

/// Read timeout; only applies when the driver reports bytes that then fail
/// to arrive, so it is kept short to honour the non-blocking tick.
const READ_TIMEOUT: Duration = Duration::from_millis(10);

/// Names of the serial ports currently present on the system.
pub fn available_ports() -> Result<Vec<String>, ConnectionError> {
    let ports = serialport::available_ports()
        .map_err(|e| ConnectionError::Enumerate(std::io::Error::from(e)))?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

/// [`LineSource`] backed by a serial port.
pub struct SerialLineSource {
    port: Box<dyn SerialPort>,
    name: String,
    framer: LineFramer,
}

impl SerialLineSource {
    /// Open `port_name` at `baud_rate`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Open`] if the port does not exist, is busy,
    /// or cannot be configured.
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self, ConnectionError> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|e| ConnectionError::Open {
                port: port_name.to_string(),
                source: std::io::Error::from(e),
            })?;
        info!("Opened {port_name} at {baud_rate} baud");

        Ok(Self {
            port,
            name: port_name.to_string(),
            framer: LineFramer::new(),
        })
    }

    /// Move whatever the driver has buffered into the line framer.
    fn fill(&mut self) -> Result<(), ConnectionError> {
        let waiting = self
            .port
            .bytes_to_read()
            .map_err(|e| ConnectionError::Read(std::io::Error::from(e)))?;
        if waiting == 0 {
            return Ok(());
        }

        let mut buf = vec![0u8; waiting as usize];
        match self.port.read(&mut buf) {
            Ok(0) => Err(ConnectionError::Disconnected(self.name.clone())),
            Ok(n) => {
                debug!("Read {n} bytes from {}", self.name);
                self.framer.push(&buf[..n]);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {
                Ok(())
            }
            Err(e) => Err(ConnectionError::Read(e)),
        }
    }
}

impl LineSource for SerialLineSource {
    fn poll_line(&mut self) -> Result<Option<String>, ConnectionError> {
        if let Some(line) = self.framer.next_line() {
            return Ok(Some(line));
        }
        self.fill()?;
        Ok(self.framer.next_line())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
