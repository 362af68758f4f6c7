//! Measurement channels reported by the sensor board

use strum::{Display, EnumCount, EnumIter, IntoStaticStr};

/// Number of channels in every line and every log row.
pub const CHANNEL_COUNT: usize = <Channel as EnumCount>::COUNT;

/// One measurement slot in a sensor line.
///
/// The declaration order is the wire order and the CSV column order, so
/// `channel as usize` doubles as the field index.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumCount,
    EnumIter,
    IntoStaticStr,
)]
pub enum Channel {
    /// LIDAR height (inches)
    #[strum(serialize = "LIDAR")]
    Lidar,
    /// First ultrasonic height (inches)
    #[strum(serialize = "Ultrasonic1")]
    Ultrasonic1,
    /// Second ultrasonic height (inches)
    #[strum(serialize = "Ultrasonic2")]
    Ultrasonic2,
    /// Board-computed average height (inches)
    #[strum(serialize = "Average")]
    Average,
    /// Tilt angle (degrees)
    #[strum(serialize = "Tilt")]
    Tilt,
}

impl Channel {
    /// All channels in wire order.
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::Lidar,
        Channel::Ultrasonic1,
        Channel::Ultrasonic2,
        Channel::Average,
        Channel::Tilt,
    ];

    /// Field index of this channel in a line or log row.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Column name used in the CSV log header.
    pub fn column_name(self) -> &'static str {
        self.into()
    }

    /// Human readable label for live displays and plot legends.
    pub fn label(self) -> &'static str {
        match self {
            Channel::Lidar => "LIDAR",
            Channel::Ultrasonic1 => "Ultrasonic 1",
            Channel::Ultrasonic2 => "Ultrasonic 2",
            Channel::Average => "Average",
            Channel::Tilt => "Tilt",
        }
    }

    /// Whether the channel carries a height (as opposed to an angle).
    pub fn is_height(self) -> bool {
        !matches!(self, Channel::Tilt)
    }
}
