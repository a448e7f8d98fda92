use std::f32::consts::{PI, TAU};

use crate::source::SignalSource;

/// Shape of the synthetic EEG produced by [`SyntheticEeg`]. Amplitudes are in microvolts.
#[derive(Clone, Debug, PartialEq)]
pub struct EegParams {
    pub alpha_uv: f32,
    pub beta_uv: f32,
    pub theta_uv: f32,
    pub noise_uv: f32,
    pub noise_cutoff_hz: f32,
    pub blink_uv: f32,
    pub blink_interval_seconds: f32,
    pub blink_duration_seconds: f32,
    pub burst_gain: f32,
    pub burst_interval_seconds: f32,
    pub burst_duration_seconds: f32,
    pub spike_uv: f32,
    pub spikes_per_minute: f32,
}

impl Default for EegParams {
    fn default() -> Self {
        Self {
            alpha_uv: 20.0,
            beta_uv: 6.0,
            theta_uv: 10.0,
            noise_uv: 4.0,
            noise_cutoff_hz: 40.0,
            blink_uv: 120.0,
            blink_interval_seconds: 4.0,
            blink_duration_seconds: 0.3,
            burst_gain: 2.5,
            burst_interval_seconds: 9.0,
            burst_duration_seconds: 1.5,
            spike_uv: 60.0,
            spikes_per_minute: 3.0,
        }
    }
}

const ALPHA_HZ: f32 = 10.0;
const BETA_HZ: f32 = 22.0;
const THETA_HZ: f32 = 6.0;
const SPIKE_DECAY_SECONDS: f32 = 0.02;
const FRONTAL_CHANNELS: usize = 2;

struct ChannelState {
    alpha_phase: f32,
    beta_phase: f32,
    theta_phase: f32,
    noise_seed: u32,
    noise_state: f32,
    spike_level: f32,
    frontal: bool,
}

impl ChannelState {
    fn new(index: usize, seed: u32) -> Self {
        let offset = (index as f32 * 0.2).fract();
        Self {
            alpha_phase: offset,
            beta_phase: (offset * 1.7).fract(),
            theta_phase: (offset * 0.9).fract(),
            noise_seed: seed ^ (index as u32 + 1).wrapping_mul(1_104_607),
            noise_state: 0.0,
            spike_level: 0.0,
            frontal: index < FRONTAL_CHANNELS,
        }
    }

    fn next_sample(&mut self, params: &EegParams, shared: &SharedState, sample_rate: f32) -> f32 {
        let alpha = (TAU * self.alpha_phase).sin() * params.alpha_uv * shared.alpha_envelope;
        let beta = (TAU * self.beta_phase).sin() * params.beta_uv;
        let theta = (TAU * self.theta_phase).sin() * params.theta_uv;
        advance_phase(&mut self.alpha_phase, ALPHA_HZ, sample_rate);
        advance_phase(&mut self.beta_phase, BETA_HZ, sample_rate);
        advance_phase(&mut self.theta_phase, THETA_HZ, sample_rate);

        let white = next_noise(&mut self.noise_seed);
        let noise = self.apply_filter(white, params, sample_rate) * params.noise_uv;

        if spike_fires(&mut self.noise_seed, params.spikes_per_minute, sample_rate) {
            self.spike_level = params.spike_uv;
        }
        let spike = self.spike_level;
        self.spike_level *= (-1.0 / (SPIKE_DECAY_SECONDS * sample_rate)).exp();

        let blink = if self.frontal { shared.blink_level } else { 0.0 };
        alpha + beta + theta + noise + spike + blink
    }

    fn apply_filter(&mut self, input: f32, params: &EegParams, sample_rate: f32) -> f32 {
        let cutoff = params.noise_cutoff_hz.clamp(1.0, sample_rate * 0.45);
        let x = (TAU * cutoff / sample_rate).min(0.99);
        let alpha = x / (1.0 + x);
        self.noise_state += alpha * (input - self.noise_state);
        self.noise_state
    }
}

/// Artefacts that hit several channels at once.
struct SharedState {
    rng: u32,
    blink_countdown: u32,
    blink_elapsed: Option<u32>,
    blink_level: f32,
    burst_countdown: u32,
    burst_elapsed: Option<u32>,
    alpha_envelope: f32,
}

impl SharedState {
    fn new(seed: u32, params: &EegParams, sample_rate: f32) -> Self {
        let mut state = Self {
            rng: seed.wrapping_add(0x9E37_79B9),
            blink_countdown: 0,
            blink_elapsed: None,
            blink_level: 0.0,
            burst_countdown: 0,
            burst_elapsed: None,
            alpha_envelope: 1.0,
        };
        state.blink_countdown = state.jittered(params.blink_interval_seconds, sample_rate);
        state.burst_countdown = state.jittered(params.burst_interval_seconds, sample_rate);
        state
    }

    fn jittered(&mut self, seconds: f32, sample_rate: f32) -> u32 {
        let jitter = 0.5 + (next_noise(&mut self.rng) + 1.0) * 0.5;
        (seconds.max(0.0) * jitter * sample_rate).max(1.0) as u32
    }

    fn advance(&mut self, params: &EegParams, sample_rate: f32) {
        let blink_len = (params.blink_duration_seconds * sample_rate).max(1.0) as u32;
        match self.blink_elapsed {
            Some(elapsed) if elapsed < blink_len => {
                let progress = elapsed as f32 / blink_len as f32;
                self.blink_level = params.blink_uv * (PI * progress).sin();
                self.blink_elapsed = Some(elapsed + 1);
            }
            Some(_) => {
                self.blink_level = 0.0;
                self.blink_elapsed = None;
                self.blink_countdown = self.jittered(params.blink_interval_seconds, sample_rate);
            }
            None => {
                self.blink_countdown = self.blink_countdown.saturating_sub(1);
                if self.blink_countdown == 0 && params.blink_uv != 0.0 {
                    self.blink_elapsed = Some(0);
                }
            }
        }

        let burst_len = (params.burst_duration_seconds * sample_rate).max(1.0) as u32;
        match self.burst_elapsed {
            Some(elapsed) if elapsed < burst_len => {
                let progress = elapsed as f32 / burst_len as f32;
                self.alpha_envelope = 1.0 + (params.burst_gain - 1.0) * (PI * progress).sin();
                self.burst_elapsed = Some(elapsed + 1);
            }
            Some(_) => {
                self.alpha_envelope = 1.0;
                self.burst_elapsed = None;
                self.burst_countdown = self.jittered(params.burst_interval_seconds, sample_rate);
            }
            None => {
                self.burst_countdown = self.burst_countdown.saturating_sub(1);
                if self.burst_countdown == 0 {
                    self.burst_elapsed = Some(0);
                }
            }
        }
    }
}

/// Deterministic multi-channel EEG-like generator.
///
/// All oscillator phases and artefact timers live in this struct; the same
/// seed and parameters always produce the same sample stream.
pub struct SyntheticEeg {
    channels: Vec<ChannelState>,
    shared: SharedState,
    params: EegParams,
    sample_rate: f32,
}

impl SyntheticEeg {
    pub fn new(sample_rate_hz: u32, channel_count: usize, seed: u32) -> Self {
        Self::with_params(sample_rate_hz, channel_count, seed, EegParams::default())
    }

    fn with_params(
        sample_rate_hz: u32,
        channel_count: usize,
        seed: u32,
        params: EegParams,
    ) -> Self {
        let sample_rate = sample_rate_hz.max(1) as f32;
        Self {
            channels: (0..channel_count)
                .map(|index| ChannelState::new(index, seed))
                .collect(),
            shared: SharedState::new(seed, &params, sample_rate),
            params,
            sample_rate,
        }
    }
}

impl SignalSource for SyntheticEeg {
    fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn next(&mut self, out: &mut [f32]) {
        self.shared.advance(&self.params, self.sample_rate);
        for (channel, slot) in self.channels.iter_mut().zip(out.iter_mut()) {
            *slot = channel.next_sample(&self.params, &self.shared, self.sample_rate);
        }
    }
}

fn advance_phase(phase: &mut f32, freq: f32, sample_rate: f32) {
    *phase += freq / sample_rate;
    if *phase >= 1.0 {
        *phase -= 1.0;
    }
}

fn next_noise(seed: &mut u32) -> f32 {
    // simple LCG mapped to [-1, 1]
    *seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
    let value = ((*seed >> 9) & 0x7FFFFF) as f32 / 0x7FFFFF as f32;
    value * 2.0 - 1.0
}

fn spike_fires(seed: &mut u32, per_minute: f32, sample_rate: f32) -> bool {
    if per_minute <= 0.0 {
        return false;
    }
    let probability = per_minute / (60.0 * sample_rate);
    (next_noise(seed) + 1.0) * 0.5 < probability
}
