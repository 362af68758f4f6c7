//! CSV recording sessions.
//!
//! A [`RecordingSession`] is either idle or writing to exactly one CSV file.
//! Every file starts with the header
//!
//! ```text
//! Timestamp,LIDAR,Ultrasonic1,Ultrasonic2,Average,Tilt
//! ```
//!
//! followed by one row per accepted sample, e.g.
//!
//! ```text
//! 2025-03-26 11:42:07.153,12.34,5.10,5.21,8.72,0.10
//! ```

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};
use emi_protocol::{Channel, SmoothedSnapshot, CHANNEL_COUNT};
use thiserror::Error;
use tracing::{info, warn};

/// Name of the first CSV column.
pub const TIMESTAMP_COLUMN: &str = "Timestamp";

/// chrono format for the timestamp column (millisecond precision, local time).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Full header row: timestamp followed by every channel column.
pub fn log_header() -> [&'static str; CHANNEL_COUNT + 1] {
    let mut header = [TIMESTAMP_COLUMN; CHANNEL_COUNT + 1];
    for channel in Channel::ALL {
        header[channel.index() + 1] = channel.column_name();
    }
    header
}

/// Errors raised while starting, writing or closing a recording.
#[derive(Error, Debug)]
pub enum RecordingError {
    /// Creating the directory or file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing or flushing a CSV record failed.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// A session is already writing to `path`; stop it first.
    #[error("Recording already active: {}", path.display())]
    AlreadyActive {
        /// File of the running session
        path: PathBuf,
    },

    /// Rows can only be appended while a session is active.
    #[error("No recording active")]
    NotActive,
}

/// One row of a recording: local wall-clock time plus the smoothed values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogRow {
    pub timestamp: DateTime<Local>,
    pub snapshot: SmoothedSnapshot,
}

impl LogRow {
    pub fn new(timestamp: DateTime<Local>, snapshot: SmoothedSnapshot) -> Self {
        Self {
            timestamp,
            snapshot,
        }
    }

    /// CSV fields for this row: formatted timestamp, then each value to 2 decimals.
    pub fn to_record(&self) -> Vec<String> {
        std::iter::once(self.timestamp.format(TIMESTAMP_FORMAT).to_string())
            .chain(self.snapshot.values().iter().map(|v| format!("{v:.2}")))
            .collect()
    }
}

struct ActiveRecording {
    path: PathBuf,
    writer: csv::Writer<Box<dyn Write + Send>>,
    started_at: DateTime<Local>,
    rows_written: u64,
}

enum SessionState {
    Idle,
    Active(ActiveRecording),
}

/// Idle/active state machine around a single CSV log file.
///
/// The file handle is owned by the session: [`stop`](Self::stop) flushes and
/// closes it, and dropping an active session does the same.
pub struct RecordingSession {
    state: SessionState,
}

impl RecordingSession {
    /// Create an idle session.
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    /// Begin recording to `path`, truncating any existing file, and return it.
    ///
    /// Parent directories are created as needed and the header row is
    /// flushed before returning, so a freshly started log is never empty.
    ///
    /// # Errors
    ///
    /// Returns [`RecordingError::AlreadyActive`] if a session is running (the
    /// running session is left untouched), or an I/O/CSV error if the file
    /// cannot be created. On error the session stays idle.
    pub fn start(
        &mut self,
        path: &Path,
        now: DateTime<Local>,
    ) -> Result<PathBuf, RecordingError> {
        self.ensure_idle()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        self.start_with_writer(path, file, now)
    }

    /// Begin recording into an arbitrary writer; `path` only labels the session.
    ///
    /// Behaves like [`start`](Self::start) once the destination is open.
    pub fn start_with_writer<W>(
        &mut self,
        path: &Path,
        writer: W,
        now: DateTime<Local>,
    ) -> Result<PathBuf, RecordingError>
    where
        W: Write + Send + 'static,
    {
        self.ensure_idle()?;

        let mut writer = csv::Writer::from_writer(Box::new(writer) as Box<dyn Write + Send>);
        writer.write_record(log_header())?;
        writer.flush()?;

        info!("Recording started: {}", path.display());
        self.state = SessionState::Active(ActiveRecording {
            path: path.to_path_buf(),
            writer,
            started_at: now,
            rows_written: 0,
        });

        Ok(path.to_path_buf())
    }

    fn ensure_idle(&self) -> Result<(), RecordingError> {
        match &self.state {
            SessionState::Active(active) => Err(RecordingError::AlreadyActive {
                path: active.path.clone(),
            }),
            SessionState::Idle => Ok(()),
        }
    }

    /// Write one row and flush it to disk.
    ///
    /// # Errors
    ///
    /// Returns [`RecordingError::NotActive`] while idle (nothing is written),
    /// or the underlying write error. A failed write leaves the session
    /// active; callers decide whether to abort it.
    pub fn append(&mut self, row: &LogRow) -> Result<(), RecordingError> {
        let SessionState::Active(active) = &mut self.state else {
            return Err(RecordingError::NotActive);
        };
        active.writer.write_record(row.to_record())?;
        active.writer.flush()?;
        active.rows_written += 1;
        Ok(())
    }

    /// Time since the session started, or `None` while idle.
    ///
    /// Clamped at zero if the wall clock stepped backwards.
    pub fn elapsed(&self, now: DateTime<Local>) -> Option<Duration> {
        match &self.state {
            SessionState::Active(active) => {
                Some((now - active.started_at).to_std().unwrap_or(Duration::ZERO))
            }
            SessionState::Idle => None,
        }
    }

    /// Flush and close the file, returning its path.
    ///
    /// Calling this while idle is a no-op that returns `Ok(None)`.
    pub fn stop(&mut self) -> Result<Option<PathBuf>, RecordingError> {
        match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::Idle => Ok(None),
            SessionState::Active(mut active) => {
                active.writer.flush()?;
                info!(
                    "Recording stopped: {} ({} rows)",
                    active.path.display(),
                    active.rows_written
                );
                Ok(Some(active.path))
            }
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    /// File being written, if active
    pub fn path(&self) -> Option<&Path> {
        match &self.state {
            SessionState::Active(active) => Some(&active.path),
            SessionState::Idle => None,
        }
    }

    /// Wall-clock start of the active session
    pub fn started_at(&self) -> Option<DateTime<Local>> {
        match &self.state {
            SessionState::Active(active) => Some(active.started_at),
            SessionState::Idle => None,
        }
    }

    /// Rows appended since the active session started (0 while idle)
    pub fn rows_written(&self) -> u64 {
        match &self.state {
            SessionState::Active(active) => active.rows_written,
            SessionState::Idle => 0,
        }
    }
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Failed to close recording on drop: {e}");
        }
    }
}

/// Format an elapsed duration as `HH:MM:SS` for the recording timer.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
