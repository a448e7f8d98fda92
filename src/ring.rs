use crate::error::PipelineError;

/// Upper bound on `capacity * channel_count` a single buffer may allocate.
pub const MAX_BUFFERED_VALUES: u64 = 64 * 1024 * 1024;

/// Fixed-capacity multi-channel sample store with absolute per-slot timestamps.
///
/// Slots are overwritten oldest-first once the buffer has wrapped. Timestamps
/// are derived from an integer count of samples written since the last reset,
/// so successive slots always differ by exactly one sample period.
#[derive(Debug, Clone, PartialEq)]
pub struct RingBuffer {
    sample_rate_hz: u32,
    capacity: usize,
    timestamps: Vec<f64>,
    samples: Vec<Vec<f32>>,
    write_cursor: usize,
    filled: bool,
    written: u64,
}

impl RingBuffer {
    pub fn new(
        sample_rate_hz: u32,
        buffer_seconds: f64,
        channel_count: usize,
    ) -> Result<Self, PipelineError> {
        if sample_rate_hz == 0 {
            return Err(PipelineError::InvalidSampleRate(sample_rate_hz));
        }
        if channel_count == 0 {
            return Err(PipelineError::NoChannels);
        }
        let capacity = (f64::from(sample_rate_hz) * buffer_seconds).round();
        if !capacity.is_finite() || capacity < 1.0 {
            return Err(PipelineError::EmptyBuffer {
                sample_rate_hz,
                seconds: buffer_seconds,
            });
        }
        let values = capacity * channel_count as f64;
        if values > MAX_BUFFERED_VALUES as f64 {
            return Err(PipelineError::BufferTooLarge {
                samples: capacity as u64,
                channels: channel_count,
                limit: MAX_BUFFERED_VALUES,
            });
        }
        let capacity = capacity as usize;
        Ok(Self {
            sample_rate_hz,
            capacity,
            timestamps: vec![0.0; capacity],
            samples: vec![vec![0.0; capacity]; channel_count],
            write_cursor: 0,
            filled: false,
            written: 0,
        })
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn channel_count(&self) -> usize {
        self.samples.len()
    }

    pub fn write_cursor(&self) -> usize {
        self.write_cursor
    }

    pub fn is_filled(&self) -> bool {
        self.filled
    }

    /// Absolute time in seconds that the next pushed sample will carry.
    pub fn clock_now(&self) -> f64 {
        self.written as f64 / f64::from(self.sample_rate_hz)
    }

    /// Writes one value per channel into the slot under the cursor.
    ///
    /// Channels missing from `sample` are written as zero; extra values are ignored.
    pub fn push(&mut self, sample: &[f32]) {
        let slot = self.write_cursor;
        for (channel, column) in self.samples.iter_mut().enumerate() {
            column[slot] = sample.get(channel).copied().unwrap_or(0.0);
        }
        self.timestamps[slot] = self.clock_now();
        self.written += 1;
        self.write_cursor = (slot + 1) % self.capacity;
        if self.write_cursor == 0 {
            self.filled = true;
        }
    }

    pub fn reset(&mut self) {
        self.timestamps.fill(0.0);
        for column in &mut self.samples {
            column.fill(0.0);
        }
        self.write_cursor = 0;
        self.filled = false;
        self.written = 0;
    }

    /// Physical slot holding the oldest valid sample.
    pub fn start(&self) -> usize {
        if self.filled { self.write_cursor } else { 0 }
    }

    /// Number of valid samples.
    pub fn len(&self) -> usize {
        if self.filled {
            self.capacity
        } else {
            self.write_cursor
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn physical_index(&self, offset: usize) -> usize {
        (self.start() + offset) % self.capacity
    }

    /// Timestamp of the `offset`-th valid sample, oldest first.
    pub fn timestamp_at(&self, offset: usize) -> f64 {
        self.timestamps[self.physical_index(offset)]
    }

    pub fn value_at(&self, channel: usize, offset: usize) -> f32 {
        self.samples[channel][self.physical_index(offset)]
    }

    /// `(timestamp, value)` pairs for one channel in acquisition order.
    pub fn iter_channel(&self, channel: usize) -> impl Iterator<Item = (f64, f32)> + '_ {
        let column = &self.samples[channel];
        (0..self.len()).map(move |offset| {
            let slot = self.physical_index(offset);
            (self.timestamps[slot], column[slot])
        })
    }

    /// First logical offset whose timestamp is not before `time`.
    ///
    /// Relies on valid samples being stored in timestamp order.
    pub fn lower_bound(&self, time: f64) -> usize {
        let (mut lo, mut hi) = (0, self.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.timestamp_at(mid) < time {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }
}
