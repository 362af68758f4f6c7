//! Per-channel moving-average smoothing.
//!
//! Each channel keeps a bounded window of its most recent raw values. A new
//! value is pushed, the oldest value is evicted once the window is over
//! capacity, and the arithmetic mean of whatever is in the window is
//! returned. During warm-up the mean is taken over fewer values; nothing is
//! zero-padded.

use std::collections::VecDeque;

use emi_protocol::{Channel, RawSample, SmoothedSnapshot, CHANNEL_COUNT};

/// Window length used by the sensor dashboard.
pub const DEFAULT_WINDOW_SIZE: usize = 5;

/// Bounded sliding window of recent raw values for one channel.
#[derive(Debug, Clone)]
pub struct SmoothingWindow {
    values: VecDeque<f64>,
    capacity: usize,
}

impl SmoothingWindow {
    /// Create an empty window.
    ///
    /// # Panics
    /// Panics if capacity is 0
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Smoothing window capacity must be greater than 0");
        Self {
            values: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Push a raw value and return the mean of the window afterwards.
    pub fn push(&mut self, value: f64) -> f64 {
        self.values.push_back(value);
        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
        self.mean()
    }

    /// Mean of the current contents, or `None` before the first push.
    pub fn current(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.mean())
        }
    }

    fn mean(&self) -> f64 {
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// Number of values currently held (never more than `capacity`)
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True before the first push or after [`clear`](Self::clear)
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Maximum number of values kept
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all values
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// One [`SmoothingWindow`] per channel.
///
/// The bank lives as long as the acquisition loop that owns it; starting
/// or stopping a recording does not touch the windows.
#[derive(Debug, Clone)]
pub struct SmoothingBank {
    windows: [SmoothingWindow; CHANNEL_COUNT],
}

impl SmoothingBank {
    /// Create a bank with every window sized to `window_size`.
    ///
    /// # Panics
    /// Panics if window_size is 0
    pub fn new(window_size: usize) -> Self {
        Self {
            windows: std::array::from_fn(|_| SmoothingWindow::new(window_size)),
        }
    }

    /// Push a raw value for one channel and return its moving average.
    pub fn update(&mut self, channel: Channel, raw: f64) -> f64 {
        self.windows[channel.index()].push(raw)
    }

    /// Smooth every channel of a sample, in channel order.
    pub fn snapshot(&mut self, sample: &RawSample) -> SmoothedSnapshot {
        let mut values = [0.0f64; CHANNEL_COUNT];
        for (channel, raw) in sample.iter() {
            values[channel.index()] = self.update(channel, raw);
        }
        SmoothedSnapshot::new(values)
    }

    /// Window for a single channel
    pub fn window(&self, channel: Channel) -> &SmoothingWindow {
        &self.windows[channel.index()]
    }

    /// Configured window length
    pub fn window_size(&self) -> usize {
        self.windows[0].capacity()
    }

    /// Clear every window, e.g. after reconnecting to a different board.
    pub fn reset(&mut self) {
        for window in &mut self.windows {
            window.clear();
        }
    }
}

impl Default for SmoothingBank {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}
