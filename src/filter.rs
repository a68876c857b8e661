//! One-pole low-pass filter
//!
//! First-order recursive smoother applied in place to each host block before
//! it reaches the ring buffer. Each channel keeps its last output sample so
//! consecutive blocks join without discontinuities.

use std::f32::consts::PI;

/// Per-channel one-pole IIR low-pass filter
///
/// `y[n] = alpha * x[n] + (1 - alpha) * y[n-1]` with
/// `alpha = dt / (rc + dt)`, `rc = 1 / (2π · cutoff)` and `dt = 1 / sample_rate`.
///
/// Invalid arguments make [`LowPassFilter::apply`] a no-op; it never fails,
/// since it runs inside the real-time audio path.
#[derive(Clone)]
pub struct LowPassFilter {
    /// Last output sample per channel
    state: Vec<f32>,
}

impl LowPassFilter {
    /// Create a filter tracking `channels` channels, all starting from silence.
    pub fn new(channels: usize) -> Self {
        Self {
            state: vec![0.0; channels],
        }
    }

    /// Smoothing coefficient for the given cutoff and sample rate.
    #[inline]
    pub fn alpha(cutoff_hz: f32, sample_rate_hz: f32) -> f32 {
        let rc = 1.0 / (cutoff_hz * 2.0 * PI);
        let dt = 1.0 / sample_rate_hz;
        dt / (rc + dt)
    }

    /// Filter `samples` in place for `channel`
    ///
    /// # Arguments
    ///
    /// * `samples` - Block to filter, overwritten with the output
    /// * `cutoff_hz` - -3 dB point of the filter
    /// * `sample_rate_hz` - Rate the block was captured at
    /// * `channel` - Index of the persisted state to use
    ///
    /// Returns without touching `samples` when the sample rate or cutoff is
    /// not a positive finite number, or `channel` is not tracked.
    pub fn apply(
        &mut self,
        samples: &mut [f32],
        cutoff_hz: f32,
        sample_rate_hz: f32,
        channel: usize,
    ) {
        if !(sample_rate_hz > 0.0 && sample_rate_hz.is_finite()) {
            return;
        }
        if !(cutoff_hz > 0.0 && cutoff_hz.is_finite()) {
            return;
        }
        let Some(last) = self.state.get_mut(channel) else {
            return;
        };

        let alpha = Self::alpha(cutoff_hz, sample_rate_hz);
        for sample in samples.iter_mut() {
            *sample = alpha * *sample + (1.0 - alpha) * *last;
            *last = *sample;
        }
    }

    /// Number of channels with persisted state.
    pub fn channels(&self) -> usize {
        self.state.len()
    }

    /// Last output sample of `channel`, if tracked.
    pub fn last_output(&self, channel: usize) -> Option<f32> {
        self.state.get(channel).copied()
    }

    /// Track at least `channels` channels, keeping existing state.
    pub fn ensure_channels(&mut self, channels: usize) {
        if channels > self.state.len() {
            self.state.resize(channels, 0.0);
        }
    }

    /// Discard all state and track `channels` channels from silence.
    pub fn reset(&mut self, channels: usize) {
        self.state.clear();
        self.state.resize(channels, 0.0);
    }
}

impl Default for LowPassFilter {
    fn default() -> Self {
        Self::new(0)
    }
}

impl std::fmt::Debug for LowPassFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LowPassFilter")
            .field("channels", &self.state.len())
            .finish_non_exhaustive()
    }
}
