//! Storage location and naming for sensor logs.
//!
//! All recordings go into one directory (`logs/` relative to the working
//! directory by default). A recording is named after the operator's hint,
//! or after its start time when no hint is given.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

/// Default directory for recordings
pub const DEFAULT_LOGS_DIR: &str = "logs";

/// File extension used for every recording
pub const LOG_EXTENSION: &str = "csv";

/// chrono format for generated file names (`sensor_log_2025-03-26_11-42-07`)
const GENERATED_NAME_FORMAT: &str = "sensor_log_%Y-%m-%d_%H-%M-%S";

/// Manager for the recordings directory.
#[derive(Debug, Clone)]
pub struct LogStorage {
    /// Directory holding all recordings
    root_path: PathBuf,
}

impl LogStorage {
    /// Create log storage rooted at `root_path`
    pub fn with_path(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Get the recordings directory
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Resolve the file a new recording should be written to.
    ///
    /// The hint is trimmed; an empty hint produces a name from `now`. A `.csv`
    /// extension is appended unless the hint already ends in one. Path
    /// separators in the hint are replaced so the file always lands directly
    /// in the recordings directory.
    pub fn resolve(&self, hint: &str, now: DateTime<Local>) -> PathBuf {
        let base = hint.trim();
        let base = if base.is_empty() {
            now.format(GENERATED_NAME_FORMAT).to_string()
        } else {
            base.replace(['/', '\\'], "_")
        };

        let has_extension = Path::new(&base)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(LOG_EXTENSION));
        let filename = if has_extension {
            base
        } else {
            format!("{base}.{LOG_EXTENSION}")
        };
        self.root_path.join(filename)
    }

    /// List all recordings, sorted by file name.
    ///
    /// Returns an empty list if the directory does not exist yet.
    pub fn list_logs(&self) -> std::io::Result<Vec<PathBuf>> {
        if !self.root_path.exists() {
            return Ok(Vec::new());
        }

        let mut logs = Vec::new();
        for entry in std::fs::read_dir(&self.root_path)? {
            let path = entry?.path();
            let is_log = path
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(LOG_EXTENSION));
            if path.is_file() && is_log {
                logs.push(path);
            }
        }
        logs.sort();
        Ok(logs)
    }

    /// Most recently modified recording, if any.
    pub fn latest_log(&self) -> std::io::Result<Option<PathBuf>> {
        let mut latest: Option<(std::time::SystemTime, PathBuf)> = None;
        for path in self.list_logs()? {
            let modified = std::fs::metadata(&path)?.modified()?;
            if latest.as_ref().is_none_or(|(t, _)| modified >= *t) {
                latest = Some((modified, path));
            }
        }
        Ok(latest.map(|(_, path)| path))
    }
}

impl Default for LogStorage {
    fn default() -> Self {
        Self::with_path(PathBuf::from(DEFAULT_LOGS_DIR))
    }
}
