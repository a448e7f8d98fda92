use std::time::{Duration, Instant};

use crate::error::PipelineError;

/// Converts wall-clock time into a whole number of samples due at a fixed rate.
///
/// Sample `n` is due at `start + n / rate`, computed in integer nanoseconds
/// from the count handed out so far. No per-sample interval is accumulated,
/// so the count at any instant is independent of how frames are spaced.
#[derive(Debug, Clone)]
pub struct SampleClock {
    start: Instant,
    issued: u64,
    sample_rate_hz: u32,
}

impl SampleClock {
    pub fn new(sample_rate_hz: u32, start: Instant) -> Result<Self, PipelineError> {
        if sample_rate_hz == 0 {
            return Err(PipelineError::InvalidSampleRate(sample_rate_hz));
        }
        Ok(Self {
            start,
            issued: 0,
            sample_rate_hz,
        })
    }

    pub fn due(&mut self) -> usize {
        self.due_at(Instant::now())
    }

    pub fn due_at(&mut self, now: Instant) -> usize {
        let mut count = 0;
        while now >= self.deadline(self.issued + 1) {
            self.issued += 1;
            count += 1;
        }
        if count > 1_000 {
            log::debug!("sample clock caught up {count} samples in one call");
        }
        count
    }

    /// Drops any backlog and schedules the next sample one interval after `now`.
    pub fn restart(&mut self, now: Instant) {
        self.start = now;
        self.issued = 0;
    }

    fn deadline(&self, sample: u64) -> Instant {
        let nanos = u128::from(sample) * 1_000_000_000 / u128::from(self.sample_rate_hz);
        self.start + Duration::from_nanos(nanos as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_is_rejected() {
        let err = SampleClock::new(0, Instant::now()).unwrap_err();
        assert_eq!(err, PipelineError::InvalidSampleRate(0));
    }

    #[test]
    fn nothing_due_before_first_interval() {
        let start = Instant::now();
        let mut clock = SampleClock::new(250, start).unwrap();
        assert_eq!(clock.due_at(start), 0);
        assert_eq!(clock.due_at(start + Duration::from_millis(3)), 0);
        assert_eq!(clock.due_at(start + Duration::from_millis(4)), 1);
    }

    #[test]
    fn total_count_is_independent_of_chunking() {
        let rate = 250;
        let span = Duration::from_secs(7);
        let start = Instant::now();

        let mut single = SampleClock::new(rate, start).unwrap();
        let one_shot = single.due_at(start + span);

        let mut chunked = SampleClock::new(rate, start).unwrap();
        let step = span / 1000;
        let mut total = 0;
        for i in 1..=1000u32 {
            total += chunked.due_at(start + step * i);
        }

        let expected = span.as_secs_f64() * f64::from(rate);
        assert!((one_shot as f64 - expected).abs() <= 1.0, "{one_shot}");
        assert!((total as f64 - expected).abs() <= 1.0, "{total}");
        assert!(one_shot.abs_diff(total) <= 1);
    }

    #[test]
    fn non_integer_interval_counts_exactly() {
        // 300 Hz has no exact nanosecond period
        let rate = 300;
        let span = Duration::from_secs(30);
        let start = Instant::now();

        let mut single = SampleClock::new(rate, start).unwrap();
        assert_eq!(single.due_at(start + span), 9000);

        let mut chunked = SampleClock::new(rate, start).unwrap();
        let mut total = 0;
        for i in 1..=1000u32 {
            total += chunked.due_at(start + Duration::from_millis(30) * i);
        }
        assert_eq!(total, 9000);
    }

    #[test]
    fn jittery_frames_converge_to_nominal_rate() {
        let rate = 500;
        let start = Instant::now();
        let mut clock = SampleClock::new(rate, start).unwrap();
        let frame_ms = [16u64, 17, 33, 5, 16, 250, 1, 16];
        let mut elapsed = Duration::ZERO;
        let mut total = 0;
        for i in 0..400 {
            elapsed += Duration::from_millis(frame_ms[i % frame_ms.len()]);
            total += clock.due_at(start + elapsed);
        }
        let expected = elapsed.as_secs_f64() * f64::from(rate);
        assert!((total as f64 - expected).abs() <= 1.0);
    }

    #[test]
    fn stall_returns_full_backlog() {
        let start = Instant::now();
        let mut clock = SampleClock::new(1000, start).unwrap();
        assert_eq!(clock.due_at(start + Duration::from_secs(3)), 3000);
        assert_eq!(clock.due_at(start + Duration::from_secs(3)), 0);
    }

    #[test]
    fn due_reads_the_wall_clock() {
        let mut clock = SampleClock::new(1000, Instant::now()).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        assert!(clock.due() >= 20);
    }

    #[test]
    fn restart_discards_backlog() {
        let start = Instant::now();
        let mut clock = SampleClock::new(100, start).unwrap();
        let resume = start + Duration::from_secs(60);
        clock.restart(resume);
        assert_eq!(clock.due_at(resume), 0);
        assert_eq!(clock.due_at(resume + Duration::from_millis(50)), 5);
    }
}
