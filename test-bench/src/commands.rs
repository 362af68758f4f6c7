//! Operator commands read from the terminal while logging.
//!
//! Stdin is read on a background thread and each command is forwarded over a
//! channel so the acquisition loop never blocks on the keyboard.

use std::io::BufRead;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,
    #[error("Unknown command {0:?} (expected start [name], stop, status or quit)")]
    Unknown(String),
    #[error("{command} takes no arguments")]
    UnexpectedArgument { command: &'static str },
}

/// A single line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    /// Begin recording; an empty name asks for a generated file name.
    Start(String),
    Stop,
    /// Print the acquisition counters
    Status,
    Quit,
}

impl OperatorCommand {
    /// Parse one line of input. Keywords are case-insensitive.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let (keyword, rest) = match line.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (line, ""),
        };

        let bare = |command: &'static str, value: Self| {
            if rest.is_empty() {
                Ok(value)
            } else {
                Err(CommandError::UnexpectedArgument { command })
            }
        };

        match keyword.to_ascii_lowercase().as_str() {
            "" => Err(CommandError::Empty),
            "start" | "record" => Ok(Self::Start(rest.to_string())),
            "stop" => bare("stop", Self::Stop),
            "status" => bare("status", Self::Status),
            "quit" | "exit" | "q" => bare("quit", Self::Quit),
            _ => Err(CommandError::Unknown(keyword.to_string())),
        }
    }
}

/// Read commands from `reader` on a background thread.
///
/// Invalid lines are logged and skipped. End of input, or a read error, is
/// delivered as [`OperatorCommand::Quit`]. The thread exits once the
/// receiver is dropped.
pub fn spawn_command_reader<R>(reader: R) -> (Receiver<OperatorCommand>, JoinHandle<()>)
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = unbounded();

    let handle = thread::spawn(move || {
        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("Failed to read command input: {e}");
                    break;
                }
            };

            match OperatorCommand::parse(&line) {
                Ok(command) => {
                    if tx.send(command).is_err() {
                        return;
                    }
                }
                Err(CommandError::Empty) => {}
                Err(e) => warn!("{e}"),
            }
        }

        debug!("Command input closed");
        let _ = tx.send(OperatorCommand::Quit);
    });

    (rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_start_with_and_without_name() {
        assert_eq!(
            OperatorCommand::parse("start"),
            Ok(OperatorCommand::Start(String::new()))
        );
        assert_eq!(
            OperatorCommand::parse("  START   bench run 2 "),
            Ok(OperatorCommand::Start("bench run 2".to_string()))
        );
    }

    #[test]
    fn test_parse_bare_commands() {
        assert_eq!(OperatorCommand::parse("stop"), Ok(OperatorCommand::Stop));
        assert_eq!(OperatorCommand::parse("Status"), Ok(OperatorCommand::Status));
        assert_eq!(OperatorCommand::parse("q"), Ok(OperatorCommand::Quit));
        assert_eq!(
            OperatorCommand::parse("stop now"),
            Err(CommandError::UnexpectedArgument { command: "stop" })
        );
    }

    #[test]
    fn test_parse_rejects_unknown_and_empty() {
        assert_eq!(OperatorCommand::parse("   "), Err(CommandError::Empty));
        assert_eq!(
            OperatorCommand::parse("launch"),
            Err(CommandError::Unknown("launch".to_string()))
        );
    }

    #[test]
    fn test_reader_forwards_commands_and_quits_on_eof() {
        let input = Cursor::new("start run1\n\nbogus\nstop\n");
        let (rx, handle) = spawn_command_reader(input);
        handle.join().unwrap();

        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![
                OperatorCommand::Start("run1".to_string()),
                OperatorCommand::Stop,
                OperatorCommand::Quit,
            ]
        );
    }
}
