//! Display and tuning constants
//!
//! Defaults shared by the analysis pipeline and the configuration layer.
//! Every value here can be overridden through [`crate::config::VisualizerConfig`].

/// Default number of ring buffer channels.
pub const DEFAULT_CHANNELS: usize = 3;

/// Default ring buffer capacity in samples per channel.
pub const DEFAULT_CAPACITY: usize = 80_000;

/// Assumed consumer cadence in Hz.
///
/// Peak-hold lifetimes are expressed in analysis frames, so hold seconds are
/// converted with this rate. A consumer polling at a different rate will see
/// holds shorter or longer than their nominal duration.
pub const DEFAULT_REFRESH_RATE_HZ: f32 = 30.0;

/// Divisor applied to magnitudes before they are mapped to pixel rows.
pub const SPECTRUM_SCALING_FACTOR: f32 = 5.0;

/// Largest supported transform order (2^24 samples).
pub const MAX_FFT_ORDER: u32 = 24;

/// Largest supported transform size in samples.
pub const MAX_FFT_SIZE: usize = 1 << MAX_FFT_ORDER;

/// Frequency that maps to the last bin when placing the cutoff marker.
pub const CUTOFF_REFERENCE_HZ: f32 = 20_000.0;

/// Lowest recognized low-pass cutoff.
pub const MIN_LOW_PASS_HZ: f32 = 20.0;

/// Highest recognized low-pass cutoff.
pub const MAX_LOW_PASS_HZ: f32 = 20_000.0;

/// Shortest analysis window in seconds.
pub const MIN_FALLBACK_SECONDS: f32 = 0.1;

/// Longest analysis window in seconds.
pub const MAX_FALLBACK_SECONDS: f32 = 10.0;

/// Default analysis window in seconds.
pub const DEFAULT_FALLBACK_SECONDS: f32 = 0.5;

/// Returns the largest power of two that does not exceed `n`, capped at
/// [`MAX_FFT_SIZE`]. Returns 0 for an input of 0.
#[inline]
pub fn largest_power_of_two(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let floor = 1usize << (usize::BITS - 1 - n.leading_zeros());
    floor.min(MAX_FFT_SIZE)
}
