//! Shared components for the EMI height sensor tools.
//!
//! - [`smoothing`] - per-channel moving-average filter
//! - [`recording`] - CSV recording sessions
//! - [`log_reader`] - replay of recorded logs
//! - [`log_storage`] - recordings directory and file naming
//! - [`settings`] - acquisition settings file

pub mod log_reader;
pub mod log_storage;
pub mod recording;
pub mod settings;
pub mod smoothing;

pub use log_reader::{read_log, read_log_from, LogReadError, LogReplay, SkippedRow};
pub use log_storage::LogStorage;
pub use recording::{format_elapsed, LogRow, RecordingError, RecordingSession};
pub use settings::AcquisitionSettings;
pub use smoothing::{SmoothingBank, SmoothingWindow};
