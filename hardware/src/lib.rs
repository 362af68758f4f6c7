//! Hardware interface for the EMI height sensor board.
//!
//! This crate connects the sensor board's serial stream to the shared
//! smoothing and recording components.
//!
//! - [`source`] - [`LineSource`] trait, line framing and [`ConnectionError`]
//! - [`serial`] - serial port driver (feature `serial`, on by default)
//! - [`acquisition`] - poll-driven [`AcquisitionLoop`]
//!
//! # Features
//!
//! - `serial` - serial port driver via the `serialport` crate. Disable it to
//!   build the acquisition loop on machines without libudev.

pub mod acquisition;
pub mod source;

#[cfg(feature = "serial")]
pub mod serial;

pub use acquisition::{
    AcquisitionLoop, AcquisitionStats, Clock, DisplaySink, RecordingToggle, SystemClock,
    TickOutcome,
};
pub use source::{ConnectionError, LineFramer, LineSource};
