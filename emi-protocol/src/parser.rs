//! Sensor line parser
//!
//! Splits one ASCII line on [`FIELD_DELIMITER`] and converts each field to
//! an `f64`. The parser is pure: rejected lines leave no trace, and deciding
//! what to do with them is up to the caller.

use thiserror::Error;

use crate::channel::{Channel, CHANNEL_COUNT};
use crate::sample::RawSample;

/// Separator between fields on the wire
pub const FIELD_DELIMITER: char = ',';

/// Reasons a line is rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Line did not contain exactly one field per channel.
    #[error("Expected {expected} fields, found {found}")]
    FieldCount {
        /// Fields required by the protocol
        expected: usize,
        /// Fields present in the line
        found: usize,
    },

    /// A field could not be read as a number.
    #[error("Invalid number for {channel}: {field:?}")]
    InvalidNumber {
        /// Channel the field belongs to
        channel: Channel,
        /// Field text after trimming
        field: String,
    },

    /// A field parsed to NaN or infinity.
    #[error("Non-finite value for {channel}: {value}")]
    NonFinite {
        /// Channel the field belongs to
        channel: Channel,
        /// Parsed value
        value: f64,
    },
}

/// Parse one sensor line into a [`RawSample`].
///
/// Leading/trailing whitespace (including `\r\n`) is ignored on the line and
/// on each field.
///
/// # Errors
///
/// Returns [`ParseError::FieldCount`] unless the line has exactly
/// [`CHANNEL_COUNT`] fields, [`ParseError::InvalidNumber`] for a field that is
/// not a number, and [`ParseError::NonFinite`] for NaN or infinite values.
///
/// # Example
///
/// ```
/// use emi_protocol::{parse, Channel};
///
/// let sample = parse("12.3,5.1,5.2,8.7,0.4\r\n")?;
/// assert_eq!(sample[Channel::Lidar], 12.3);
/// assert_eq!(sample[Channel::Tilt], 0.4);
///
/// assert!(parse("12.3,5.1,5.2,8.7").is_err());
/// # Ok::<(), emi_protocol::ParseError>(())
/// ```
pub fn parse(line: &str) -> Result<RawSample, ParseError> {
    let fields: Vec<&str> = line.trim().split(FIELD_DELIMITER).collect();
    if fields.len() != CHANNEL_COUNT {
        return Err(ParseError::FieldCount {
            expected: CHANNEL_COUNT,
            found: fields.len(),
        });
    }

    let mut values = [0.0f64; CHANNEL_COUNT];
    for (channel, field) in Channel::ALL.iter().copied().zip(fields) {
        let field = field.trim();
        let value: f64 = field.parse().map_err(|_| ParseError::InvalidNumber {
            channel,
            field: field.to_string(),
        })?;
        if !value.is_finite() {
            return Err(ParseError::NonFinite { channel, value });
        }
        values[channel.index()] = value;
    }

    Ok(RawSample::new(values))
}
