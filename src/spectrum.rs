//! Spectrum outline with peak hold
//!
//! Reads a power-of-two window from the sample store, computes its magnitude
//! spectrum and maps the Nyquist half onto a logarithmic x axis. Optional
//! per-bin peak hold keeps the maximum magnitude of every bin until its
//! lifetime expires, then restarts from the current magnitude.
//!
//! # Example
//!
//! ```ignore
//! let mut analyzer = SpectrumAnalyzer::new(store.capacity(), 30.0, 5.0, HoldTiming::Frames);
//! let path = analyzer.analyze(&store, 5_000, 0, 200.0, 400.0, DecayMode::Fast, 1_000.0)?;
//! // 5000 rounds down to a 4096-sample window: 2048 vertices + the cutoff marker
//! ```

use crate::buffer::SampleStore;
use crate::config::HoldTiming;
use crate::constants::{largest_power_of_two, CUTOFF_REFERENCE_HZ};
use crate::path::{Path, Point};
use crate::{Error, Result};
use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

// ============================================================================
// Decay Mode
// ============================================================================

/// Peak-hold selection, mutually exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecayMode {
    /// Spectrum disabled, no analysis performed
    Off,
    /// Raw magnitudes, no hold
    #[default]
    None,
    /// Peaks held for 1 second
    Fast,
    /// Peaks held for 2 seconds
    Medium,
    /// Peaks held for 5 seconds
    Slow,
}

impl DecayMode {
    /// All modes in code order.
    pub const ALL: [DecayMode; 5] = [
        DecayMode::Off,
        DecayMode::None,
        DecayMode::Fast,
        DecayMode::Medium,
        DecayMode::Slow,
    ];

    /// Integer code used by hosts and settings (-1 to 3).
    pub fn code(self) -> i32 {
        match self {
            DecayMode::Off => -1,
            DecayMode::None => 0,
            DecayMode::Fast => 1,
            DecayMode::Medium => 2,
            DecayMode::Slow => 3,
        }
    }

    /// Hold duration in seconds, or `None` when peaks are not held.
    pub fn hold_seconds(self) -> Option<f32> {
        match self {
            DecayMode::Off | DecayMode::None => None,
            DecayMode::Fast => Some(1.0),
            DecayMode::Medium => Some(2.0),
            DecayMode::Slow => Some(5.0),
        }
    }

    /// True unless the spectrum is switched off.
    pub fn is_enabled(self) -> bool {
        self != DecayMode::Off
    }
}

impl TryFrom<i32> for DecayMode {
    type Error = Error;

    fn try_from(code: i32) -> Result<Self> {
        DecayMode::ALL
            .into_iter()
            .find(|mode| mode.code() == code)
            .ok_or_else(|| Error::Config(format!("unknown decay mode code {code}")))
    }
}

impl FromStr for DecayMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(DecayMode::Off),
            "none" => Ok(DecayMode::None),
            "fast" => Ok(DecayMode::Fast),
            "medium" => Ok(DecayMode::Medium),
            "slow" => Ok(DecayMode::Slow),
            other => Err(Error::Config(format!("unknown decay mode '{other}'"))),
        }
    }
}

impl fmt::Display for DecayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DecayMode::Off => "off",
            DecayMode::None => "none",
            DecayMode::Fast => "fast",
            DecayMode::Medium => "medium",
            DecayMode::Slow => "slow",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Peak Hold
// ============================================================================

/// Per-bin peak-hold state.
///
/// Each bin is either tracking (elapsed below the lifetime, peak never
/// decreasing) or expired (elapsed reached the lifetime, peak restarts from
/// the current magnitude). The transition is evaluated once per update.
#[derive(Debug, Clone, Default)]
pub struct PeakHold {
    /// Held magnitude per bin
    peaks: Vec<f32>,
    /// Frames elapsed since each bin's peak was last reset
    elapsed: Vec<f32>,
    /// Bin count of the most recent update
    active_bins: usize,
}

impl PeakHold {
    /// Create peak-hold state with storage for up to `max_bins` bins.
    pub fn with_max_bins(max_bins: usize) -> Self {
        Self {
            peaks: vec![0.0; max_bins],
            elapsed: vec![0.0; max_bins],
            active_bins: 0,
        }
    }

    /// Fold one frame of magnitudes into the held peaks
    ///
    /// # Arguments
    ///
    /// * `magnitudes` - Current spectrum, one value per bin
    /// * `lifetime` - Frames a peak is held before it restarts
    /// * `advance` - Frames elapsed since the previous update
    ///
    /// # Returns
    ///
    /// Held peaks for the active bins
    pub fn update(&mut self, magnitudes: &[f32], lifetime: f32, advance: f32) -> &[f32] {
        let bins = magnitudes.len();
        if bins > self.peaks.len() {
            self.peaks.resize(bins, 0.0);
            self.elapsed.resize(bins, 0.0);
        }
        if bins > self.active_bins {
            // Bins that were not part of the previous window start empty
            self.peaks[self.active_bins..bins].fill(0.0);
            self.elapsed[self.active_bins..bins].fill(0.0);
        }
        self.active_bins = bins;

        for ((peak, elapsed), &magnitude) in self
            .peaks
            .iter_mut()
            .zip(self.elapsed.iter_mut())
            .zip(magnitudes)
        {
            if *elapsed >= lifetime {
                *peak = magnitude;
                *elapsed = 0.0;
            } else {
                *peak = peak.max(magnitude);
                *elapsed += advance;
            }
        }

        &self.peaks[..bins]
    }

    /// Held peaks of the most recent update.
    pub fn peaks(&self) -> &[f32] {
        &self.peaks[..self.active_bins]
    }

    /// Elapsed frames per bin of the most recent update.
    pub fn elapsed(&self) -> &[f32] {
        &self.elapsed[..self.active_bins]
    }

    /// Forget all held peaks, keeping the allocation.
    pub fn reset(&mut self) {
        self.peaks.fill(0.0);
        self.elapsed.fill(0.0);
        self.active_bins = 0;
    }
}

// ============================================================================
// Spectrum Analyzer
// ============================================================================

/// Position of bin `bin` on the log-frequency axis.
///
/// The divisor is the window length, not the bin count, so the last bin
/// lands slightly short of `width`.
#[inline]
pub fn log_x(bin: usize, window: usize, width: f32) -> f32 {
    width * ((bin + 1) as f32).ln() / (window as f32).ln()
}

/// Bin holding the low-pass cutoff marker, clamped to `[0, bins - 1]`.
#[inline]
pub fn cutoff_bin(cutoff_hz: f32, window: usize) -> usize {
    let bins = window / 2;
    let bin = (f64::from(cutoff_hz) * window as f64 / f64::from(CUTOFF_REFERENCE_HZ)).floor();
    (bin.max(0.0) as usize).min(bins.saturating_sub(1))
}

/// FFT-based spectrum analyzer with peak hold
///
/// Working buffers are sized at construction for the largest window the
/// intended store can hold, so steady-state analysis does not reallocate.
/// A larger store grows them once on first use.
pub struct SpectrumAnalyzer {
    planner: FftPlanner<f32>,
    /// Time-domain window read from the store
    samples: Vec<f32>,
    /// In-place transform buffer
    spectrum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
    /// Bin count of the most recent analysis
    last_bins: usize,
    peak_hold: PeakHold,
    /// Largest window the working buffers can hold
    max_window: usize,
    refresh_rate_hz: f32,
    scaling_factor: f32,
    hold_timing: HoldTiming,
    last_hold_update: Option<Instant>,
}

impl SpectrumAnalyzer {
    /// Create an analyzer with buffers preallocated for `max_samples`.
    ///
    /// `max_samples` is normally the ring buffer capacity.
    pub fn new(
        max_samples: usize,
        refresh_rate_hz: f32,
        scaling_factor: f32,
        hold_timing: HoldTiming,
    ) -> Self {
        let max_window = largest_power_of_two(max_samples);
        let max_bins = max_window / 2;
        log::debug!(
            "spectrum analyzer: max window {max_window}, {refresh_rate_hz} Hz refresh, {hold_timing:?} hold timing"
        );

        Self {
            planner: FftPlanner::new(),
            samples: vec![0.0; max_window],
            spectrum: vec![Complex::new(0.0, 0.0); max_window],
            scratch: Vec::new(),
            magnitudes: vec![0.0; max_bins],
            last_bins: 0,
            peak_hold: PeakHold::with_max_bins(max_bins),
            max_window,
            refresh_rate_hz,
            scaling_factor,
            hold_timing,
            last_hold_update: None,
        }
    }

    /// Peak-hold lifetime in frames for `mode`, if it holds peaks.
    pub fn lifetime(&self, mode: DecayMode) -> Option<f32> {
        mode.hold_seconds()
            .map(|seconds| self.refresh_rate_hz * seconds)
    }

    /// Current peak-hold state.
    pub fn peak_hold(&self) -> &PeakHold {
        &self.peak_hold
    }

    /// Magnitudes of the most recent analysis.
    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes[..self.last_bins]
    }

    /// Forget all held peaks.
    pub fn reset(&mut self) {
        self.peak_hold.reset();
        self.last_bins = 0;
        self.last_hold_update = None;
    }

    /// Build the spectrum outline for `channel`
    ///
    /// # Arguments
    ///
    /// * `store` - Sample source
    /// * `requested_samples` - Desired window, rounded down to a power of two
    /// * `channel` - Store channel to analyze
    /// * `height` / `width` - Target area in pixels
    /// * `mode` - Peak-hold mode; [`DecayMode::Off`] skips analysis entirely
    /// * `cutoff_hz` - Low-pass marker position; no marker when not positive
    ///
    /// # Returns
    ///
    /// One polyline with a vertex per bin, followed by a vertical marker
    /// sub-path when `cutoff_hz > 0`. Windows shorter than two samples
    /// produce an empty path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CountExceedsCapacity`] when the rounded window is
    /// larger than the store capacity, and propagates the store's channel
    /// check.
    #[allow(clippy::too_many_arguments)]
    pub fn analyze<S: SampleStore + ?Sized>(
        &mut self,
        store: &S,
        requested_samples: usize,
        channel: usize,
        height: f32,
        width: f32,
        mode: DecayMode,
        cutoff_hz: f32,
    ) -> Result<Path> {
        if !mode.is_enabled() {
            return Ok(Path::new());
        }

        let window = largest_power_of_two(requested_samples);
        if window < 2 {
            return Ok(Path::new());
        }
        if window > store.capacity() {
            return Err(Error::CountExceedsCapacity {
                count: window,
                capacity: store.capacity(),
            });
        }
        self.reserve_window(window);
        let bins = window / 2;
        log::trace!("spectrum: requested {requested_samples}, window {window}, {bins} bins");

        store.read_into(&mut self.samples[..window], channel)?;
        self.compute_magnitudes(window);
        self.last_bins = bins;

        let values: &[f32] = match self.lifetime(mode) {
            Some(lifetime) => {
                let advance = self.hold_advance(Instant::now());
                self.peak_hold
                    .update(&self.magnitudes[..bins], lifetime, advance)
            }
            None => &self.magnitudes[..bins],
        };

        let extra = if cutoff_hz > 0.0 { 2 } else { 0 };
        let mut path = Path::with_capacity(bins + extra);
        for (i, &value) in values.iter().enumerate() {
            let point = Point::new(
                log_x(i, window, width),
                height - value / self.scaling_factor,
            );
            if i == 0 {
                path.start_new_sub_path(point);
            } else {
                path.line_to(point);
            }
        }

        if cutoff_hz > 0.0 {
            let x = log_x(cutoff_bin(cutoff_hz, window), window, width);
            path.start_new_sub_path(Point::new(x, 0.0));
            path.line_to(Point::new(x, height));
        }

        Ok(path)
    }

    /// Grow the working buffers to hold `window` samples.
    fn reserve_window(&mut self, window: usize) {
        if window <= self.max_window {
            return;
        }
        log::debug!("spectrum analyzer: growing window {} -> {window}", self.max_window);
        self.samples.resize(window, 0.0);
        self.spectrum.resize(window, Complex::new(0.0, 0.0));
        self.magnitudes.resize(window / 2, 0.0);
        self.max_window = window;
    }

    /// Forward transform of `samples[..window]` into `magnitudes[..window / 2]`.
    fn compute_magnitudes(&mut self, window: usize) {
        let fft = self.planner.plan_fft_forward(window);

        for (bin, &sample) in self.spectrum[..window].iter_mut().zip(&self.samples[..window]) {
            *bin = Complex::new(sample, 0.0);
        }

        let scratch_len = fft.get_inplace_scratch_len();
        if self.scratch.len() < scratch_len {
            self.scratch.resize(scratch_len, Complex::new(0.0, 0.0));
        }
        fft.process_with_scratch(&mut self.spectrum[..window], &mut self.scratch[..scratch_len]);

        for (magnitude, c) in self.magnitudes[..window / 2]
            .iter_mut()
            .zip(&self.spectrum[..window / 2])
        {
            *magnitude = (c.re * c.re + c.im * c.im).sqrt();
        }
    }

    /// Frames to add to every tracking bin for an update at `now`.
    fn hold_advance(&mut self, now: Instant) -> f32 {
        match self.hold_timing {
            HoldTiming::Frames => 1.0,
            HoldTiming::WallClock => {
                let advance = match self.last_hold_update {
                    Some(previous) => {
                        now.saturating_duration_since(previous).as_secs_f32()
                            * self.refresh_rate_hz
                    }
                    None => 1.0,
                };
                self.last_hold_update = Some(now);
                advance
            }
        }
    }
}

impl fmt::Debug for SpectrumAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectrumAnalyzer")
            .field("max_window", &self.max_window)
            .field("refresh_rate_hz", &self.refresh_rate_hz)
            .field("scaling_factor", &self.scaling_factor)
            .field("hold_timing", &self.hold_timing)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::RingBuffer;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use std::f32::consts::PI;
    use std::time::Duration;

    fn analyzer(capacity: usize) -> SpectrumAnalyzer {
        SpectrumAnalyzer::new(capacity, 30.0, 5.0, HoldTiming::Frames)
    }

    fn store_with(samples: &[f32], capacity: usize) -> RingBuffer {
        let store = RingBuffer::new(1, capacity).unwrap();
        store.push(samples, 0).unwrap();
        store
    }

    fn sine(bin: usize, window: usize, amplitude: f32) -> Vec<f32> {
        (0..window)
            .map(|n| amplitude * (2.0 * PI * bin as f32 * n as f32 / window as f32).sin())
            .collect()
    }

    #[test]
    fn test_decay_mode_codes() {
        for mode in DecayMode::ALL {
            assert_eq!(DecayMode::try_from(mode.code()).unwrap(), mode);
        }
        assert_eq!(DecayMode::try_from(-1).unwrap(), DecayMode::Off);
        assert!(DecayMode::try_from(4).is_err());
    }

    #[test]
    fn test_decay_mode_parse_and_display() {
        for mode in DecayMode::ALL {
            assert_eq!(mode.to_string().parse::<DecayMode>().unwrap(), mode);
        }
        assert_eq!("MEDIUM".parse::<DecayMode>().unwrap(), DecayMode::Medium);
        assert!("sometimes".parse::<DecayMode>().is_err());
    }

    #[test]
    fn test_hold_seconds() {
        assert_eq!(DecayMode::Off.hold_seconds(), None);
        assert_eq!(DecayMode::None.hold_seconds(), None);
        assert_eq!(DecayMode::Fast.hold_seconds(), Some(1.0));
        assert_eq!(DecayMode::Medium.hold_seconds(), Some(2.0));
        assert_eq!(DecayMode::Slow.hold_seconds(), Some(5.0));
    }

    #[test]
    fn test_lifetime_follows_refresh_rate() {
        let a = analyzer(1024);
        assert_eq!(a.lifetime(DecayMode::Fast), Some(30.0));
        assert_eq!(a.lifetime(DecayMode::Medium), Some(60.0));
        assert_eq!(a.lifetime(DecayMode::Slow), Some(150.0));
        assert_eq!(a.lifetime(DecayMode::None), None);

        let b = SpectrumAnalyzer::new(1024, 60.0, 5.0, HoldTiming::Frames);
        assert_eq!(b.lifetime(DecayMode::Fast), Some(60.0));
    }

    #[test]
    fn test_off_returns_empty_path() {
        let store = store_with(&[1.0; 64], 64);
        let mut a = analyzer(64);
        let path = a
            .analyze(&store, 64, 0, 100.0, 100.0, DecayMode::Off, 1_000.0)
            .unwrap();
        assert!(path.is_empty());

        // Arguments are not even validated
        let path = a
            .analyze(&store, 1 << 30, 9, -1.0, 0.0, DecayMode::Off, -5.0)
            .unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn test_window_rounds_down_to_power_of_two() {
        let store = store_with(&[0.0; 5000], 8192);
        let mut a = analyzer(8192);
        assert_eq!(largest_power_of_two(5000), 4096);

        let path = a
            .analyze(&store, 5000, 0, 100.0, 100.0, DecayMode::None, 0.0)
            .unwrap();
        assert_eq!(path.sub_path_count(), 1);
        assert_eq!(path.vertex_count(), 2048);
        assert_eq!(a.magnitudes().len(), 2048);
    }

    #[test]
    fn test_window_above_store_capacity_is_error() {
        let store = store_with(&[0.5; 1000], 1000);
        let mut a = analyzer(1000);

        let err = a
            .analyze(&store, 1024, 0, 100.0, 100.0, DecayMode::None, 0.0)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::CountExceedsCapacity {
                count: 1024,
                capacity: 1000
            }
        ));

        // 1000 rounds down to 512, which fits
        let path = a
            .analyze(&store, 1000, 0, 100.0, 100.0, DecayMode::None, 0.0)
            .unwrap();
        assert_eq!(path.vertex_count(), 256);
    }

    #[test]
    fn test_buffers_grow_for_larger_store() {
        let store = store_with(&vec![1.0; 2048], 2048);
        let mut a = analyzer(64);
        let path = a
            .analyze(&store, 2048, 0, 100.0, 100.0, DecayMode::Fast, 0.0)
            .unwrap();
        assert_eq!(path.vertex_count(), 1024);
        assert_relative_eq!(a.magnitudes()[0], 2048.0, epsilon = 1e-1);
    }

    #[test]
    fn test_tiny_window_is_empty() {
        let store = store_with(&[1.0; 4], 4);
        let mut a = analyzer(4);
        for requested in [0, 1] {
            let path = a
                .analyze(&store, requested, 0, 10.0, 10.0, DecayMode::None, 100.0)
                .unwrap();
            assert!(path.is_empty());
        }
    }

    #[test]
    fn test_dc_energy_lands_in_bin_zero() {
        let window = 1024;
        let store = store_with(&vec![1.0; window], window);
        let mut a = analyzer(window);
        let path = a
            .analyze(&store, window, 0, 1_000.0, 500.0, DecayMode::None, 0.0)
            .unwrap();

        let magnitudes = a.magnitudes();
        assert_relative_eq!(magnitudes[0], window as f32, epsilon = 1e-2);
        assert!(magnitudes[1..].iter().all(|&m| m < 1e-2));

        let first = path.points().next().unwrap();
        assert_eq!(first.x, 0.0);
        assert_relative_eq!(first.y, 1_000.0 - window as f32 / 5.0, epsilon = 1e-2);
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        let window = 256;
        let store = store_with(&sine(8, window, 1.0), window);
        let mut a = analyzer(window);
        a.analyze(&store, window, 0, 100.0, 100.0, DecayMode::None, 0.0)
            .unwrap();

        let magnitudes = a.magnitudes();
        let (peak_bin, &peak) = magnitudes
            .iter()
            .enumerate()
            .max_by(|x, y| x.1.total_cmp(y.1))
            .unwrap();
        assert_eq!(peak_bin, 8);
        assert_relative_eq!(peak, window as f32 / 2.0, epsilon = 1e-2);
    }

    #[test]
    fn test_log_axis_mapping() {
        let window = 512;
        let store = store_with(&vec![0.0; window], window);
        let mut a = analyzer(window);
        let path = a
            .analyze(&store, window, 0, 100.0, 300.0, DecayMode::None, 0.0)
            .unwrap();

        let points: Vec<_> = path.points().copied().collect();
        for (i, p) in points.iter().enumerate() {
            let expected = 300.0 * ((i + 1) as f32).ln() / (window as f32).ln();
            assert_relative_eq!(p.x, expected, epsilon = 1e-4);
            assert_abs_diff_eq!(p.y, 100.0, epsilon = 1e-4);
        }
        assert!(points.windows(2).all(|w| w[1].x > w[0].x));
        assert!(points.last().unwrap().x < 300.0);
    }

    #[test]
    fn test_cutoff_marker() {
        let window = 4096;
        let store = store_with(&vec![0.0; window], window);
        let mut a = analyzer(window);
        let path = a
            .analyze(&store, window, 0, 120.0, 400.0, DecayMode::None, 1_000.0)
            .unwrap();

        assert_eq!(cutoff_bin(1_000.0, window), 204);
        let subs: Vec<_> = path.sub_paths().collect();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].len(), 2048);

        let x = log_x(204, window, 400.0);
        assert_eq!(subs[1], &[Point::new(x, 0.0), Point::new(x, 120.0)]);
    }

    #[test]
    fn test_cutoff_bin_clamps() {
        assert_eq!(cutoff_bin(30_000.0, 4096), 2047);
        assert_eq!(cutoff_bin(20_000.0, 4096), 2047);
        assert_eq!(cutoff_bin(1.0, 4096), 0);
        assert_eq!(cutoff_bin(20.0, 2), 0);
    }

    #[test]
    fn test_peak_hold_tracks_then_resets() {
        let mut hold = PeakHold::with_max_bins(1);

        assert_eq!(hold.update(&[5.0], 3.0, 1.0), &[5.0]);
        assert_eq!(hold.update(&[2.0], 3.0, 1.0), &[5.0]);
        assert_eq!(hold.update(&[1.0], 3.0, 1.0), &[5.0]);
        assert_eq!(hold.elapsed(), &[3.0]);

        // Expired: restart from the current magnitude
        assert_eq!(hold.update(&[1.0], 3.0, 1.0), &[1.0]);
        assert_eq!(hold.elapsed(), &[0.0]);
        assert_eq!(hold.update(&[4.0], 3.0, 1.0), &[4.0]);
    }

    #[test]
    fn test_peak_hold_monotonic_until_lifetime() {
        let mut hold = PeakHold::with_max_bins(4);
        let lifetime = 10.0;
        let mut previous = vec![0.0f32; 4];

        for frame in 0..10 {
            let magnitudes: Vec<f32> = (0..4)
                .map(|bin| ((frame * 7 + bin * 3) % 5) as f32)
                .collect();
            let peaks = hold.update(&magnitudes, lifetime, 1.0).to_vec();
            for bin in 0..4 {
                assert!(peaks[bin] >= previous[bin]);
                assert!(peaks[bin] >= magnitudes[bin]);
            }
            previous = peaks;
        }
    }

    #[test]
    fn test_peak_hold_growing_window_starts_new_bins_empty() {
        let mut hold = PeakHold::with_max_bins(4);
        hold.update(&[1.0, 1.0, 1.0, 1.0], 100.0, 1.0);
        hold.update(&[0.0, 0.0], 100.0, 1.0);
        let peaks = hold.update(&[0.0, 0.0, 0.5, 0.0], 100.0, 1.0);
        assert_eq!(peaks, &[1.0, 1.0, 0.5, 0.0]);
    }

    #[test]
    fn test_analyzer_holds_peaks_across_calls() {
        let window = 256;
        let store = RingBuffer::new(1, window).unwrap();
        let mut a = analyzer(window);

        store.push(&sine(16, window, 1.0), 0).unwrap();
        let loud = a
            .analyze(&store, window, 0, 500.0, 100.0, DecayMode::Fast, 0.0)
            .unwrap();

        store.push(&vec![0.0; window], 0).unwrap();
        let held = a
            .analyze(&store, window, 0, 500.0, 100.0, DecayMode::Fast, 0.0)
            .unwrap();
        let raw = a
            .analyze(&store, window, 0, 500.0, 100.0, DecayMode::None, 0.0)
            .unwrap();

        let bin = 16;
        let loud_y = loud.points().nth(bin).unwrap().y;
        assert_relative_eq!(held.points().nth(bin).unwrap().y, loud_y);
        assert_abs_diff_eq!(raw.points().nth(bin).unwrap().y, 500.0, epsilon = 1e-3);
        assert!(loud_y < 500.0 - 20.0);
    }

    #[test]
    fn test_peak_expires_after_lifetime_frames() {
        let window = 64;
        let store = RingBuffer::new(1, window).unwrap();
        let mut a = analyzer(window);

        store.push(&vec![1.0; window], 0).unwrap();
        a.analyze(&store, window, 0, 100.0, 100.0, DecayMode::Fast, 0.0)
            .unwrap();
        store.push(&vec![0.0; window], 0).unwrap();

        // Frames 2..=30 keep the DC peak, frame 31 sees elapsed == 30 and resets
        for _ in 0..29 {
            a.analyze(&store, window, 0, 100.0, 100.0, DecayMode::Fast, 0.0)
                .unwrap();
            assert_relative_eq!(a.peak_hold().peaks()[0], window as f32, epsilon = 1e-3);
        }
        a.analyze(&store, window, 0, 100.0, 100.0, DecayMode::Fast, 0.0)
            .unwrap();
        assert_abs_diff_eq!(a.peak_hold().peaks()[0], 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_wall_clock_advance() {
        let mut a = SpectrumAnalyzer::new(64, 30.0, 5.0, HoldTiming::WallClock);
        let start = Instant::now();
        assert_eq!(a.hold_advance(start), 1.0);
        let advance = a.hold_advance(start + Duration::from_millis(100));
        assert_relative_eq!(advance, 3.0, epsilon = 1e-3);

        let mut frames = analyzer(64);
        assert_eq!(frames.hold_advance(start + Duration::from_secs(5)), 1.0);
    }

    #[test]
    fn test_invalid_channel_is_error() {
        let store = store_with(&[0.0; 64], 64);
        let mut a = analyzer(64);
        let err = a
            .analyze(&store, 64, 3, 10.0, 10.0, DecayMode::None, 0.0)
            .unwrap_err();
        assert!(matches!(err, Error::ChannelOutOfRange { channel: 3, .. }));
    }

    #[test]
    fn test_reset_clears_peaks() {
        let store = store_with(&[1.0; 64], 64);
        let mut a = analyzer(64);
        a.analyze(&store, 64, 0, 10.0, 10.0, DecayMode::Slow, 0.0)
            .unwrap();
        assert!(!a.peak_hold().peaks().is_empty());
        a.reset();
        assert!(a.peak_hold().peaks().is_empty());
        assert!(a.magnitudes().is_empty());
    }
}
