//! Acquisition settings persisted as JSON.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::log_storage::DEFAULT_LOGS_DIR;
use crate::smoothing::DEFAULT_WINDOW_SIZE;

/// Baud rate of the sensor board's USB serial link
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Tunables for the acquisition loop and its timers.
///
/// Missing fields in a settings file fall back to the defaults, so older
/// files keep loading after new fields are added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionSettings {
    /// Serial baud rate
    pub baud_rate: u32,
    /// Moving-average window length per channel
    pub window_size: usize,
    /// Interval between acquisition ticks (ms)
    pub poll_interval_ms: u64,
    /// Interval between elapsed-time display updates (ms)
    pub elapsed_interval_ms: u64,
    /// Directory recordings are written to
    pub logs_dir: PathBuf,
}

impl AcquisitionSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn elapsed_interval(&self) -> Duration {
        Duration::from_millis(self.elapsed_interval_ms)
    }

    /// Save to JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    /// Load from JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, std::io::Error> {
        let json = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check that every count and interval is non-zero.
    ///
    /// Run by [`load_from_file`](Self::load_from_file); callers that merge
    /// overrides on top of a loaded file should run it again.
    pub fn validate(&self) -> Result<(), std::io::Error> {
        let invalid = |msg: &str| Err(std::io::Error::new(std::io::ErrorKind::InvalidData, msg));
        if self.window_size == 0 {
            return invalid("window_size must be greater than 0");
        }
        if self.baud_rate == 0 {
            return invalid("baud_rate must be greater than 0");
        }
        if self.poll_interval_ms == 0 || self.elapsed_interval_ms == 0 {
            return invalid("timer intervals must be greater than 0");
        }
        Ok(())
    }
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            window_size: DEFAULT_WINDOW_SIZE,
            poll_interval_ms: 100,
            elapsed_interval_ms: 1000,
            logs_dir: PathBuf::from(DEFAULT_LOGS_DIR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_rejects_zero_overrides() {
        assert!(AcquisitionSettings::default().validate().is_ok());

        let settings = AcquisitionSettings {
            baud_rate: 0,
            ..Default::default()
        };
        let err = settings.validate().unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("baud_rate"));

        let settings = AcquisitionSettings {
            elapsed_interval_ms: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_defaults() {
        let settings = AcquisitionSettings::default();
        assert_eq!(settings.baud_rate, 115_200);
        assert_eq!(settings.window_size, 5);
        assert_eq!(settings.poll_interval(), Duration::from_millis(100));
        assert_eq!(settings.elapsed_interval(), Duration::from_secs(1));
        assert_eq!(settings.logs_dir, PathBuf::from("logs"));
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("acquisition.json");
        let settings = AcquisitionSettings {
            window_size: 8,
            logs_dir: PathBuf::from("/var/log/emi"),
            ..Default::default()
        };
        settings.save_to_file(&path).unwrap();
        assert_eq!(AcquisitionSettings::load_from_file(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("acquisition.json");
        std::fs::write(&path, r#"{ "window_size": 10 }"#).unwrap();

        let settings = AcquisitionSettings::load_from_file(&path).unwrap();
        assert_eq!(settings.window_size, 10);
        assert_eq!(settings.baud_rate, DEFAULT_BAUD_RATE);
    }

    #[test]
    fn test_zero_window_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("acquisition.json");
        std::fs::write(&path, r#"{ "window_size": 0 }"#).unwrap();

        let err = AcquisitionSettings::load_from_file(&path).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
