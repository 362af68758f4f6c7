//! Bench session from board lines to replayed chart data.

use std::collections::VecDeque;

use approx::assert_relative_eq;
use emi_protocol::Channel;
use hardware::{AcquisitionLoop, ConnectionError, LineSource, TickOutcome};
use shared::{read_log, LogStorage, SmoothingBank};
use tempfile::TempDir;
use test_bench::commands::OperatorCommand;
use test_bench::console_display::ConsoleDisplay;
use test_bench::log_plots::sample_points;

struct CapturedBoard {
    lines: VecDeque<&'static str>,
}

impl LineSource for CapturedBoard {
    fn poll_line(&mut self) -> Result<Option<String>, ConnectionError> {
        match self.lines.pop_front() {
            Some(line) => Ok(Some(line.to_string())),
            None => Err(ConnectionError::Disconnected("board unplugged".to_string())),
        }
    }

    fn name(&self) -> &str {
        "captured"
    }
}

#[test]
fn test_recorded_session_replays_smoothed_values() {
    let dir = TempDir::new().unwrap();
    let mut acquisition = AcquisitionLoop::new(
        ConsoleDisplay::new(),
        SmoothingBank::new(2),
        LogStorage::with_path(dir.path().join("logs")),
    );
    acquisition.connect(CapturedBoard {
        lines: VecDeque::from([
            "10.0,20.0,30.0,20.0,1.0",
            "Booting sensor v2",
            "12.0,22.0,32.0,22.0,3.0",
            "14.0,24.0,34.0,24.0,5.0",
        ]),
    });

    let OperatorCommand::Start(name) = OperatorCommand::parse("start bench run").unwrap() else {
        panic!("expected a start command");
    };
    let path = acquisition.start_recording(&name).unwrap();
    assert_eq!(path, dir.path().join("logs").join("bench run.csv"));

    let mut rejected = 0;
    loop {
        match acquisition.tick() {
            Ok(TickOutcome::Rejected(_)) => rejected += 1,
            Ok(_) => {}
            Err(ConnectionError::Disconnected(_)) => break,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(rejected, 1);
    assert!(!acquisition.is_connected());

    let display = acquisition.display();
    assert_eq!(display.snapshots_seen(), 3);
    assert_eq!(display.connection().map(|(_, ok)| ok), Some(false));

    assert_eq!(acquisition.stop_recording().unwrap(), Some(path.clone()));

    let replay = read_log(&path).unwrap();
    assert_eq!(replay.len(), 3);
    assert_eq!(replay.skipped_count(), 0);

    // Window of 2: 10, (10+12)/2, (12+14)/2
    let lidar = sample_points(&replay, Channel::Lidar);
    let expected = [10.0, 11.0, 13.0];
    for ((x, y), (i, want)) in lidar.iter().zip(expected.iter().enumerate()) {
        assert_relative_eq!(*x, i as f64);
        assert_relative_eq!(*y, *want, epsilon = 0.005);
    }

    let tilt = replay.series(Channel::Tilt);
    assert_relative_eq!(tilt[2], 4.0, epsilon = 0.005);
}
