//! Fixed-width sample records, one value per [`Channel`]

use std::ops::Index;

use crate::channel::{Channel, CHANNEL_COUNT};

/// One parsed sensor line, values in channel order.
///
/// Only [`parse`](crate::parse) and tests construct these; a `RawSample`
/// always holds exactly one finite value per channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    values: [f64; CHANNEL_COUNT],
}

impl RawSample {
    /// Build a sample from values in channel order.
    pub const fn new(values: [f64; CHANNEL_COUNT]) -> Self {
        Self { values }
    }

    /// Value for a single channel
    pub fn get(&self, channel: Channel) -> f64 {
        self.values[channel.index()]
    }

    /// All values in channel order
    pub fn values(&self) -> &[f64; CHANNEL_COUNT] {
        &self.values
    }

    /// Iterate `(channel, value)` pairs in channel order
    pub fn iter(&self) -> impl Iterator<Item = (Channel, f64)> + '_ {
        Channel::ALL.iter().map(move |&c| (c, self.get(c)))
    }
}

impl Index<Channel> for RawSample {
    type Output = f64;

    fn index(&self, channel: Channel) -> &f64 {
        &self.values[channel.index()]
    }
}

/// Moving-average values for every channel after one accepted sample.
///
/// Snapshots are immutable; display and recording layers format them as
/// they see fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedSnapshot {
    values: [f64; CHANNEL_COUNT],
}

impl SmoothedSnapshot {
    /// Build a snapshot from values in channel order.
    pub const fn new(values: [f64; CHANNEL_COUNT]) -> Self {
        Self { values }
    }

    /// Value for a single channel
    pub fn get(&self, channel: Channel) -> f64 {
        self.values[channel.index()]
    }

    /// All values in channel order
    pub fn values(&self) -> &[f64; CHANNEL_COUNT] {
        &self.values
    }

    /// Iterate `(channel, value)` pairs in channel order
    pub fn iter(&self) -> impl Iterator<Item = (Channel, f64)> + '_ {
        Channel::ALL.iter().map(move |&c| (c, self.get(c)))
    }
}

impl Index<Channel> for SmoothedSnapshot {
    type Output = f64;

    fn index(&self, channel: Channel) -> &f64 {
        &self.values[channel.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_indexing() {
        let sample = RawSample::new([1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(sample[Channel::Lidar], 1.0);
        assert_eq!(sample.get(Channel::Tilt), 5.0);

        let pairs: Vec<(Channel, f64)> = sample.iter().collect();
        assert_eq!(pairs[2], (Channel::Ultrasonic2, 3.0));
    }

    #[test]
    fn test_snapshot_values_in_order() {
        let snapshot = SmoothedSnapshot::new([10.0, 11.0, 12.0, 13.0, 0.5]);
        assert_eq!(snapshot.values(), &[10.0, 11.0, 12.0, 13.0, 0.5]);
        assert_eq!(snapshot[Channel::Average], 13.0);
    }
}
