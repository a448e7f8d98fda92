use std::time::Instant;

use crate::acquisition::AcquisitionDriver;
use crate::clock::SampleClock;
use crate::display::{DisplaySettings, FrameParams};
use crate::error::PipelineError;
use crate::ring::RingBuffer;
use crate::synth::SyntheticEeg;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Running,
    Paused,
}

impl RunState {
    pub fn label(self) -> &'static str {
        match self {
            RunState::Stopped => "Stopped",
            RunState::Running => "Monitoring",
            RunState::Paused => "Paused",
        }
    }
}

/// Acquisition session parameters fixed for the lifetime of a [`Monitor`].
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    pub sample_rate_hz: u32,
    pub buffer_seconds: f64,
    pub channel_count: usize,
    pub seed: u32,
}

/// One monitoring session: buffer, acquisition, run state and playhead.
pub struct Monitor {
    ring: RingBuffer,
    driver: AcquisitionDriver<SyntheticEeg>,
    state: RunState,
    playhead_seconds: f64,
}

impl Monitor {
    pub fn new(config: &SessionConfig, now: Instant) -> Result<Self, PipelineError> {
        let ring = RingBuffer::new(
            config.sample_rate_hz,
            config.buffer_seconds,
            config.channel_count,
        )?;
        let clock = SampleClock::new(config.sample_rate_hz, now)?;
        let source = SyntheticEeg::new(config.sample_rate_hz, config.channel_count, config.seed);
        Ok(Self {
            ring,
            driver: AcquisitionDriver::new(clock, source),
            state: RunState::Stopped,
            playhead_seconds: 0.0,
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn ring(&self) -> &RingBuffer {
        &self.ring
    }

    pub fn playhead_seconds(&self) -> f64 {
        self.playhead_seconds
    }

    /// Starts a fresh session when stopped, or resumes a paused one.
    pub fn start(&mut self, now: Instant) {
        match self.state {
            RunState::Running => return,
            RunState::Stopped => {
                self.ring.reset();
                self.playhead_seconds = 0.0;
                log::info!("monitoring started");
            }
            RunState::Paused => log::info!("monitoring resumed at {:.2}s", self.playhead_seconds),
        }
        self.driver.restart_clock(now);
        self.state = RunState::Running;
    }

    pub fn pause(&mut self) {
        if self.state == RunState::Running {
            self.state = RunState::Paused;
            log::info!("monitoring paused at {:.2}s", self.playhead_seconds);
        }
    }

    /// Stops acquisition; buffered data stays visible until the next start.
    pub fn stop(&mut self) {
        if self.state != RunState::Stopped {
            self.state = RunState::Stopped;
            log::info!("monitoring stopped at {:.2}s", self.playhead_seconds);
        }
    }

    pub fn tick(&mut self, now: Instant) -> usize {
        if self.state != RunState::Running {
            return 0;
        }
        let pushed = self.driver.pump(&mut self.ring, now);
        self.playhead_seconds = self.ring.clock_now();
        pushed
    }

    pub fn frame_params(&self, display: &DisplaySettings) -> FrameParams {
        FrameParams {
            window_seconds: display.window_seconds,
            gain: display.gain,
            playhead_seconds: self.playhead_seconds,
            sample_rate_hz: self.ring.sample_rate_hz(),
        }
    }
}
