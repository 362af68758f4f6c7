//! Logs written by a recording session must replay to the same values.

use chrono::{Duration, Local, TimeZone};
use emi_protocol::{parse, Channel};
use shared::{read_log, LogRow, LogStorage, RecordingSession, SmoothingBank};
use tempfile::TempDir;

#[test]
fn test_recorded_rows_replay_in_channel_order() {
    let dir = TempDir::new().unwrap();
    let storage = LogStorage::with_path(dir.path().to_path_buf());
    let start = Local.with_ymd_and_hms(2025, 3, 26, 13, 30, 0).unwrap();
    let path = storage.resolve("", start);

    let mut bank = SmoothingBank::default();
    let mut session = RecordingSession::new();
    session.start(&path, start).unwrap();

    let lines = [
        "10.004,5.0,5.5,7.5,1.0",
        "12.0,5.2,5.4,7.6,1.2",
        "11.0,5.1,5.6,7.7,0.9",
    ];
    let mut written = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let snapshot = bank.snapshot(&parse(line).unwrap());
        let row = LogRow::new(start + Duration::milliseconds(100 * i as i64), snapshot);
        session.append(&row).unwrap();
        written.push(snapshot);
    }
    assert_eq!(session.stop().unwrap(), Some(path.clone()));

    let replay = read_log(&path).unwrap();
    assert_eq!(replay.len(), written.len());
    assert_eq!(replay.skipped_count(), 0);

    for (i, snapshot) in written.iter().enumerate() {
        let replayed = replay.snapshot(i).unwrap();
        for channel in Channel::ALL {
            let diff = (replayed[channel] - snapshot[channel]).abs();
            assert!(diff <= 0.005 + 1e-9, "{channel} row {i}: {diff}");
        }
    }

    assert_eq!(replay.timestamps[0], "2025-03-26 13:30:00.000");
    assert_eq!(replay.timestamps[2], "2025-03-26 13:30:00.200");
}

#[test]
fn test_generated_name_lands_in_storage_dir() {
    let dir = TempDir::new().unwrap();
    let storage = LogStorage::with_path(dir.path().join("logs"));
    let start = Local.with_ymd_and_hms(2025, 3, 26, 8, 5, 9).unwrap();

    let mut session = RecordingSession::new();
    let path = storage.resolve("", start);
    session.start(&path, start).unwrap();

    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "sensor_log_2025-03-26_08-05-09.csv"
    );
    assert_eq!(storage.list_logs().unwrap(), vec![path]);
}
