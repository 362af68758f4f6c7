//! Acquisition loop for the height sensor board.
//!
//! [`AcquisitionLoop`] is driven by an external scheduler: a fast timer calls
//! [`tick`](AcquisitionLoop::tick) (100 ms by default) and a slow timer calls
//! [`elapsed_tick`](AcquisitionLoop::elapsed_tick) (1 s). Neither call blocks.
//!
//! Each tick takes at most one line from the [`LineSource`], parses it,
//! smooths every channel, hands the snapshot to the [`DisplaySink`], and
//! appends a row to the recording if one is active:
//!
//! ```text
//! LineSource -> parse -> SmoothingBank -> DisplaySink
//!                                      \-> RecordingSession (when active)
//! ```
//!
//! Malformed lines are dropped and counted. Recording failures abort the
//! recording but not acquisition. A failing source is dropped and reported;
//! later ticks simply find no data.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Local};
use emi_protocol::{parse, ParseError, SmoothedSnapshot};
use shared::{LogRow, LogStorage, RecordingError, RecordingSession, SmoothingBank};
use tracing::{debug, error, info, warn};

use crate::source::{ConnectionError, LineSource};

/// Presentation layer fed by the acquisition loop.
///
/// Implementations own all formatting; the loop only passes values.
pub trait DisplaySink {
    /// Latest smoothed values
    fn show(&mut self, snapshot: &SmoothedSnapshot);

    /// Time since the active recording started
    fn show_elapsed(&mut self, elapsed: Duration);

    /// Connection status text and whether the link is healthy
    fn show_connection_state(&mut self, text: &str, ok: bool);
}

/// Wall-clock source for log timestamps and elapsed time.
pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

/// [`Clock`] reading the local system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Running counters, readable at any time via [`AcquisitionLoop::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcquisitionStats {
    /// Lines taken from the source
    pub lines_received: u64,
    /// Lines that parsed into a sample
    pub samples_accepted: u64,
    /// Lines dropped by the parser
    pub lines_rejected: u64,
    /// Rows appended to recordings
    pub rows_written: u64,
    /// Appends that failed (each one aborts its recording)
    pub write_failures: u64,
    /// Source read failures
    pub connection_errors: u64,
}

/// Result of a single [`tick`](AcquisitionLoop::tick).
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// No source connected or no complete line available
    NoData,
    /// A line arrived but was malformed; nothing was displayed or recorded
    Rejected(ParseError),
    /// A sample was accepted and displayed
    Sample {
        snapshot: SmoothedSnapshot,
        /// Whether a row was appended to the active recording
        recorded: bool,
    },
}

/// What [`toggle_recording`](AcquisitionLoop::toggle_recording) did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingToggle {
    /// A new recording was started at this path
    Started(PathBuf),
    /// The active recording was stopped
    Stopped(Option<PathBuf>),
}

/// Poll-driven pipeline from a line source to display and recording.
pub struct AcquisitionLoop<S: LineSource, D: DisplaySink, C: Clock = SystemClock> {
    source: Option<S>,
    display: D,
    clock: C,
    bank: SmoothingBank,
    session: RecordingSession,
    storage: LogStorage,
    stats: AcquisitionStats,
}

impl<S: LineSource, D: DisplaySink> AcquisitionLoop<S, D, SystemClock> {
    /// Create a disconnected loop using the system clock.
    pub fn new(display: D, bank: SmoothingBank, storage: LogStorage) -> Self {
        Self::with_clock(display, SystemClock, bank, storage)
    }
}

impl<S: LineSource, D: DisplaySink, C: Clock> AcquisitionLoop<S, D, C> {
    /// Create a disconnected loop with an explicit clock.
    pub fn with_clock(display: D, clock: C, bank: SmoothingBank, storage: LogStorage) -> Self {
        Self {
            source: None,
            display,
            clock,
            bank,
            session: RecordingSession::new(),
            storage,
            stats: AcquisitionStats::default(),
        }
    }

    /// Attach a source, replacing any existing one.
    ///
    /// Smoothing windows are kept; call [`bank_mut`](Self::bank_mut) and
    /// `reset()` when switching to a different board.
    pub fn connect(&mut self, source: S) {
        let text = format!("Connected to {}", source.name());
        info!("{text}");
        self.display.show_connection_state(&text, true);
        self.source = Some(source);
    }

    /// Detach and return the current source.
    pub fn disconnect(&mut self) -> Option<S> {
        let source = self.source.take();
        if let Some(source) = &source {
            info!("Disconnected from {}", source.name());
            self.display.show_connection_state("Not connected", false);
        }
        source
    }

    pub fn is_connected(&self) -> bool {
        self.source.is_some()
    }

    /// Run one acquisition cycle.
    ///
    /// # Errors
    ///
    /// Returns the [`ConnectionError`] if reading from the source failed. The
    /// source is dropped first, so the next tick returns
    /// [`TickOutcome::NoData`].
    pub fn tick(&mut self) -> Result<TickOutcome, ConnectionError> {
        let Some(source) = self.source.as_mut() else {
            return Ok(TickOutcome::NoData);
        };

        let line = match source.poll_line() {
            Ok(Some(line)) => line,
            Ok(None) => return Ok(TickOutcome::NoData),
            Err(e) => {
                self.stats.connection_errors += 1;
                self.source = None;
                error!("Serial read failed: {e}");
                self.display
                    .show_connection_state(&format!("Connection lost: {e}"), false);
                return Err(e);
            }
        };
        self.stats.lines_received += 1;

        let sample = match parse(&line) {
            Ok(sample) => sample,
            Err(e) => {
                self.stats.lines_rejected += 1;
                debug!("Dropping line {line:?}: {e}");
                return Ok(TickOutcome::Rejected(e));
            }
        };
        self.stats.samples_accepted += 1;

        let snapshot = self.bank.snapshot(&sample);
        self.display.show(&snapshot);

        let recorded = self.record(&snapshot);
        Ok(TickOutcome::Sample { snapshot, recorded })
    }

    /// Append a row if a recording is active; abort the recording on failure.
    fn record(&mut self, snapshot: &SmoothedSnapshot) -> bool {
        if !self.session.is_active() {
            return false;
        }

        let row = LogRow::new(self.clock.now(), *snapshot);
        match self.session.append(&row) {
            Ok(()) => {
                self.stats.rows_written += 1;
                true
            }
            Err(e) => {
                self.stats.write_failures += 1;
                error!("Write to recording failed, stopping recording: {e}");
                if let Err(e) = self.session.stop() {
                    warn!("Failed to close aborted recording: {e}");
                }
                false
            }
        }
    }

    /// Push the recording's elapsed time to the display.
    ///
    /// Returns the elapsed time, or `None` (and shows nothing) while idle.
    pub fn elapsed_tick(&mut self) -> Option<Duration> {
        let elapsed = self.session.elapsed(self.clock.now())?;
        self.display.show_elapsed(elapsed);
        Some(elapsed)
    }

    /// Start recording to a file named after `filename_hint`.
    ///
    /// An empty hint produces a timestamped name in the logs directory.
    ///
    /// # Errors
    ///
    /// [`RecordingError::AlreadyActive`] if a recording is running, or the
    /// I/O error that prevented the file from being created. Acquisition is
    /// unaffected either way.
    pub fn start_recording(&mut self, filename_hint: &str) -> Result<PathBuf, RecordingError> {
        let now = self.clock.now();
        let path = self.storage.resolve(filename_hint, now);
        let path = self.session.start(&path, now)?;
        self.display.show_elapsed(Duration::ZERO);
        Ok(path)
    }

    /// Stop the active recording; a no-op returning `Ok(None)` while idle.
    pub fn stop_recording(&mut self) -> Result<Option<PathBuf>, RecordingError> {
        self.session.stop()
    }

    /// Start a recording if idle, otherwise stop the active one.
    pub fn toggle_recording(
        &mut self,
        filename_hint: &str,
    ) -> Result<RecordingToggle, RecordingError> {
        if self.session.is_active() {
            self.stop_recording().map(RecordingToggle::Stopped)
        } else {
            self.start_recording(filename_hint)
                .map(RecordingToggle::Started)
        }
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_active()
    }

    pub fn session(&self) -> &RecordingSession {
        &self.session
    }

    pub fn stats(&self) -> AcquisitionStats {
        self.stats
    }

    pub fn bank(&self) -> &SmoothingBank {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut SmoothingBank {
        &mut self.bank
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn storage(&self) -> &LogStorage {
        &self.storage
    }
}
