//! Real-time EEG sweep monitor.
//!
//! Samples flow from a [`source::SignalSource`] through the
//! [`acquisition::AcquisitionDriver`] into a [`ring::RingBuffer`], paced by a
//! [`clock::SampleClock`], and are drawn each frame by [`chart::SweepChart`].
//! Everything runs on the GUI thread, once per frame.

pub mod acquisition;
pub mod chart;
pub mod clock;
pub mod display;
pub mod error;
pub mod monitor;
pub mod ring;
pub mod settings;
pub mod source;
pub mod synth;
pub mod ui;
