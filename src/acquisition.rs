use std::time::Instant;

use crate::clock::SampleClock;
use crate::ring::RingBuffer;
use crate::source::SignalSource;

/// Moves samples from a source into the ring buffer at the clock's pace.
pub struct AcquisitionDriver<S> {
    clock: SampleClock,
    source: S,
    scratch: Vec<f32>,
}

impl<S: SignalSource> AcquisitionDriver<S> {
    pub fn new(clock: SampleClock, source: S) -> Self {
        let scratch = vec![0.0; source.channel_count()];
        Self {
            clock,
            source,
            scratch,
        }
    }

    /// Pulls every sample due at `now` and pushes it. Returns how many were pushed.
    pub fn pump(&mut self, ring: &mut RingBuffer, now: Instant) -> usize {
        let due = self.clock.due_at(now);
        for _ in 0..due {
            self.scratch.fill(0.0);
            self.source.next(&mut self.scratch);
            ring.push(&self.scratch);
        }
        due
    }

    pub fn restart_clock(&mut self, now: Instant) {
        self.clock.restart(now);
    }
}
