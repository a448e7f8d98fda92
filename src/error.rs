use thiserror::Error;

/// Configuration errors raised when building the acquisition pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("sample rate must be positive, got {0} Hz")]
    InvalidSampleRate(u32),
    #[error("buffer duration of {seconds}s at {sample_rate_hz} Hz holds no samples")]
    EmptyBuffer { sample_rate_hz: u32, seconds: f64 },
    #[error("buffer of {samples} samples x {channels} channels exceeds the limit of {limit} values")]
    BufferTooLarge {
        samples: u64,
        channels: usize,
        limit: u64,
    },
    #[error("at least one channel is required")]
    NoChannels,
}
