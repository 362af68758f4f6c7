//! Line sources feeding the acquisition loop.
//!
//! A [`LineSource`] hands out complete text lines without blocking. The
//! serial driver is the production implementation; tests script their own.

use thiserror::Error;
use tracing::warn;

/// Longest unterminated line kept before the buffer is discarded.
///
/// Sensor lines are ~40 bytes; anything this long means the board is
/// streaming garbage (wrong baud rate, binary firmware dump, ...).
pub const MAX_LINE_LENGTH: usize = 4096;

/// Errors that affect the link to the sensor board itself.
///
/// Unlike a malformed line these end the connection: the acquisition loop
/// drops the source after reporting one of these.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Opening the port failed (missing device, permissions, in use).
    #[error("Connection failed: {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: std::io::Error,
    },

    /// Listing available ports failed.
    #[error("Port enumeration failed: {0}")]
    Enumerate(#[source] std::io::Error),

    /// Reading from an open port failed.
    #[error("Read error: {0}")]
    Read(#[from] std::io::Error),

    /// The device went away.
    #[error("Device disconnected: {0}")]
    Disconnected(String),
}

/// Non-blocking supplier of text lines.
pub trait LineSource {
    /// Return the next complete line if one is available.
    ///
    /// Must return `Ok(None)` immediately when no full line has arrived yet.
    /// The returned line has its terminator removed.
    fn poll_line(&mut self) -> Result<Option<String>, ConnectionError>;

    /// Name shown in connection status messages (e.g. `/dev/ttyACM0`)
    fn name(&self) -> &str;
}

/// Splits a byte stream into `\n`-terminated lines.
///
/// Bytes are accumulated across calls to [`push`](Self::push); complete lines
/// are decoded lossily as UTF-8 so a corrupted byte fails parsing instead of
/// the connection.
#[derive(Debug, Default)]
pub struct LineFramer {
    pending: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes from the device.
    pub fn push(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
        if self.pending.len() > MAX_LINE_LENGTH && !self.pending.contains(&b'\n') {
            warn!(
                "Discarding {} bytes without line terminator",
                self.pending.len()
            );
            self.pending.clear();
        }
    }

    /// Take the oldest complete line, without its `\n` / `\r\n` terminator.
    pub fn next_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.pending.drain(..=end).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Bytes received but not yet returned as a line
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
