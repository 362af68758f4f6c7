//! EMI height sensor line protocol
//!
//! This crate provides the channel layout and parsing for the ASCII lines
//! streamed by the height sensor board over its serial link.
//!
//! Each line carries five comma-separated readings in a fixed order:
//!
//! ```text
//! <lidar>,<ultrasonic1>,<ultrasonic2>,<average>,<tilt>\n
//! ```
//!
//! There is no framing or checksum; a line either parses into a [`RawSample`]
//! or is rejected with a [`ParseError`] and dropped by the caller.

mod channel;
mod parser;
mod sample;

pub use channel::{Channel, CHANNEL_COUNT};
pub use parser::{parse, ParseError, FIELD_DELIMITER};
pub use sample::{RawSample, SmoothedSnapshot};
