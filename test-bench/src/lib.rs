//! Bench tools for the EMI height sensor.
//!
//! The `sensor_logger` binary drives a [`hardware::AcquisitionLoop`] from the
//! terminal; `csv_plotter` replays a recorded log into PNG charts.

pub mod commands;
pub mod console_display;
pub mod log_plots;
