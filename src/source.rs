/// Anything that can produce one multi-channel sample per call.
///
/// The synthetic generator and a hardware amplifier feed share this contract,
/// so the acquisition driver never needs to know which one it is pulling from.
pub trait SignalSource {
    fn channel_count(&self) -> usize;

    /// Writes the next sample, one value in microvolts per channel, into `out`.
    fn next(&mut self, out: &mut [f32]);
}
