//! Reader for recorded sensor logs.
//!
//! Loads a CSV written by [`RecordingSession`](crate::recording::RecordingSession)
//! back into one series per channel for replay and plotting. Rows that fail
//! to parse are skipped and reported rather than aborting the whole file.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use emi_protocol::{Channel, SmoothedSnapshot, CHANNEL_COUNT};
use thiserror::Error;
use tracing::warn;

use crate::recording::TIMESTAMP_COLUMN;

/// Errors that prevent a log from being read at all.
#[derive(Error, Debug)]
pub enum LogReadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The header row lacks a required column.
    #[error("Missing column: {0}")]
    MissingColumn(String),
}

/// A data row that was dropped during replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// Zero-based index of the data row (header excluded)
    pub row: usize,
    /// Why the row was rejected
    pub reason: String,
}

/// Parsed contents of a log file.
#[derive(Debug, Clone, Default)]
pub struct LogReplay {
    /// Timestamp text of each accepted row
    pub timestamps: Vec<String>,
    series: [Vec<f64>; CHANNEL_COUNT],
    /// Rows that could not be parsed, in file order
    pub skipped: Vec<SkippedRow>,
}

impl LogReplay {
    /// Number of accepted rows
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Values of one channel, indexed by sample number
    pub fn series(&self, channel: Channel) -> &[f64] {
        &self.series[channel.index()]
    }

    /// All channel values of accepted row `index`
    pub fn snapshot(&self, index: usize) -> Option<SmoothedSnapshot> {
        if index >= self.len() {
            return None;
        }
        Some(SmoothedSnapshot::new(std::array::from_fn(|i| {
            self.series[i][index]
        })))
    }

    /// Number of rows dropped while reading
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Min and max over the given channels, or `None` when there is no data.
    pub fn value_range(&self, channels: &[Channel]) -> Option<(f64, f64)> {
        channels
            .iter()
            .flat_map(|&c| self.series(c).iter().copied())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    fn push(&mut self, timestamp: String, values: [f64; CHANNEL_COUNT]) {
        self.timestamps.push(timestamp);
        for (series, value) in self.series.iter_mut().zip(values) {
            series.push(value);
        }
    }
}

/// Read a log file from disk.
///
/// # Errors
///
/// Fails if the file cannot be opened, if the header is missing a column,
/// or on an underlying I/O error. Malformed data rows are not errors; see
/// [`LogReplay::skipped`].
pub fn read_log(path: &Path) -> Result<LogReplay, LogReadError> {
    let file = File::open(path)?;
    read_log_from(file)
}

/// Read a log from any reader (see [`read_log`]).
pub fn read_log_from<R: Read>(reader: R) -> Result<LogReplay, LogReadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let column = |name: &str| -> Result<usize, LogReadError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| LogReadError::MissingColumn(name.to_string()))
    };
    let timestamp_idx = column(TIMESTAMP_COLUMN)?;
    let mut channel_idx = [0usize; CHANNEL_COUNT];
    for channel in Channel::ALL {
        channel_idx[channel.index()] = column(channel.column_name())?;
    }

    let mut replay = LogReplay::default();
    for (row, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                skip(&mut replay, row, e.to_string());
                continue;
            }
        };

        let Some(timestamp) = record.get(timestamp_idx) else {
            skip(&mut replay, row, format!("missing {TIMESTAMP_COLUMN}"));
            continue;
        };

        let mut values = [0.0f64; CHANNEL_COUNT];
        let mut failure = None;
        for channel in Channel::ALL {
            let field = record.get(channel_idx[channel.index()]);
            match field.map(str::parse::<f64>) {
                Some(Ok(v)) if v.is_finite() => values[channel.index()] = v,
                Some(Ok(_)) => {
                    failure = Some(format!("{channel}: non-finite"));
                    break;
                }
                Some(Err(e)) => {
                    failure = Some(format!("{channel}: {e}"));
                    break;
                }
                None => {
                    failure = Some(format!("missing {channel}"));
                    break;
                }
            }
        }

        match failure {
            Some(reason) => skip(&mut replay, row, reason),
            None => replay.push(timestamp.to_string(), values),
        }
    }

    Ok(replay)
}

fn skip(replay: &mut LogReplay, row: usize, reason: String) {
    warn!("Skipping row {row} due to error: {reason}");
    replay.skipped.push(SkippedRow { row, reason });
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
Timestamp,LIDAR,Ultrasonic1,Ultrasonic2,Average,Tilt
2025-03-26 11:42:07.153,12.34,5.10,5.21,8.72,0.10
2025-03-26 11:42:07.254,12.36,5.11,5.22,8.73,0.11
2025-03-26 11:42:07.355,12.38,5.12,5.23,8.74,0.12
";

    #[test]
    fn test_read_clean_log() {
        let replay = read_log_from(LOG.as_bytes()).unwrap();
        assert_eq!(replay.len(), 3);
        assert_eq!(replay.skipped_count(), 0);
        assert_eq!(replay.series(Channel::Lidar), &[12.34, 12.36, 12.38]);
        assert_eq!(replay.series(Channel::Tilt), &[0.10, 0.11, 0.12]);
        assert_eq!(replay.timestamps[0], "2025-03-26 11:42:07.153");
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let log = "\
Timestamp,LIDAR,Ultrasonic1,Ultrasonic2,Average,Tilt
2025-03-26 11:42:07.153,12.34,5.10,5.21,8.72,0.10
2025-03-26 11:42:07.254,12.36,oops,5.22,8.73,0.11
2025-03-26 11:42:07.355,12.38,5.12
2025-03-26 11:42:07.456,12.40,5.13,5.24,8.75,0.13
";
        let replay = read_log_from(log.as_bytes()).unwrap();
        assert_eq!(replay.len(), 2);
        assert_eq!(replay.skipped_count(), 2);
        assert_eq!(replay.skipped[0].row, 1);
        assert!(replay.skipped[0].reason.starts_with("Ultrasonic1"));
        assert_eq!(replay.skipped[1].row, 2);
        assert_eq!(replay.series(Channel::Lidar), &[12.34, 12.40]);
    }

    #[test]
    fn test_non_finite_values_are_skipped() {
        let log = "\
Timestamp,LIDAR,Ultrasonic1,Ultrasonic2,Average,Tilt
t0,inf,1,1,1,NaN
t1,2,2,2,2,-inf
t2,3,3,3,3,3
";
        let replay = read_log_from(log.as_bytes()).unwrap();
        assert_eq!(replay.len(), 1);
        assert_eq!(replay.skipped_count(), 2);
        assert_eq!(replay.skipped[0].reason, "LIDAR: non-finite");
        assert_eq!(replay.skipped[1].reason, "Tilt: non-finite");
        assert_eq!(replay.value_range(&Channel::ALL), Some((3.0, 3.0)));
    }

    #[test]
    fn test_header_with_spaces_and_reordered_columns() {
        let log = "\
Tilt, Timestamp, LIDAR, Ultrasonic1, Ultrasonic2, Average
0.5, 2025-03-26 11:42:07.153, 1.00, 2.00, 3.00, 4.00
";
        let replay = read_log_from(log.as_bytes()).unwrap();
        assert_eq!(
            replay.snapshot(0).unwrap().values(),
            &[1.0, 2.0, 3.0, 4.0, 0.5]
        );
        assert_eq!(replay.snapshot(1), None);
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let log = "Timestamp,LIDAR,Ultrasonic1,Average,Tilt\n";
        let err = read_log_from(log.as_bytes()).unwrap_err();
        assert!(matches!(err, LogReadError::MissingColumn(ref c) if c == "Ultrasonic2"));
    }

    #[test]
    fn test_header_only_log_is_empty() {
        let replay =
            read_log_from("Timestamp,LIDAR,Ultrasonic1,Ultrasonic2,Average,Tilt\n".as_bytes())
                .unwrap();
        assert!(replay.is_empty());
        assert_eq!(replay.value_range(&Channel::ALL), None);
    }

    #[test]
    fn test_value_range() {
        let replay = read_log_from(LOG.as_bytes()).unwrap();
        assert_eq!(
            replay.value_range(&[Channel::Ultrasonic1, Channel::Ultrasonic2]),
            Some((5.10, 5.23))
        );
    }
}
