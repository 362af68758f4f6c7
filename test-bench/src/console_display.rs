//! Terminal rendition of the sensor readout.

use std::time::Duration;

use emi_protocol::SmoothedSnapshot;
use hardware::DisplaySink;
use shared::format_elapsed;
use tracing::{info, warn};

/// Format a snapshot as one line, two decimals per channel.
pub fn format_snapshot(snapshot: &SmoothedSnapshot) -> String {
    snapshot
        .iter()
        .map(|(channel, value)| {
            let unit = if channel.is_height() { " in" } else { "°" };
            format!("{}: {value:.2}{unit}", channel.label())
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

/// [`DisplaySink`] that logs readings through `tracing`.
///
/// Keeps the last values it was given so the operator can query them.
#[derive(Debug, Default)]
pub struct ConsoleDisplay {
    last_snapshot: Option<SmoothedSnapshot>,
    elapsed: Option<Duration>,
    connection: Option<(String, bool)>,
    /// Log every n-th snapshot; 0 or 1 logs all of them
    snapshot_stride: u64,
    snapshots_seen: u64,
}

impl ConsoleDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only log every `stride`-th snapshot.
    pub fn with_stride(stride: u64) -> Self {
        Self {
            snapshot_stride: stride,
            ..Self::default()
        }
    }

    pub fn last_snapshot(&self) -> Option<&SmoothedSnapshot> {
        self.last_snapshot.as_ref()
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed
    }

    /// Last connection text and whether it was a healthy state.
    pub fn connection(&self) -> Option<(&str, bool)> {
        self.connection
            .as_ref()
            .map(|(text, ok)| (text.as_str(), *ok))
    }

    pub fn snapshots_seen(&self) -> u64 {
        self.snapshots_seen
    }
}

impl DisplaySink for ConsoleDisplay {
    fn show(&mut self, snapshot: &SmoothedSnapshot) {
        self.snapshots_seen += 1;
        self.last_snapshot = Some(*snapshot);
        if self.snapshot_stride <= 1 || self.snapshots_seen % self.snapshot_stride == 1 {
            info!("{}", format_snapshot(snapshot));
        }
    }

    fn show_elapsed(&mut self, elapsed: Duration) {
        self.elapsed = Some(elapsed);
        info!("Recording: {}", format_elapsed(elapsed));
    }

    fn show_connection_state(&mut self, text: &str, ok: bool) {
        if ok {
            info!("{text}");
        } else {
            warn!("{text}");
        }
        self.connection = Some((text.to_string(), ok));
    }
}
