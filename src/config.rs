//! Visualizer configuration
//!
//! Buffer geometry, display tuning and the user-facing controls (cutoff,
//! decay mode, analysis window). Loaded from and saved to JSON.

use crate::constants::{
    DEFAULT_CAPACITY, DEFAULT_CHANNELS, DEFAULT_FALLBACK_SECONDS, DEFAULT_REFRESH_RATE_HZ,
    MAX_FALLBACK_SECONDS, MAX_LOW_PASS_HZ, MIN_FALLBACK_SECONDS, MIN_LOW_PASS_HZ,
    SPECTRUM_SCALING_FACTOR,
};
use crate::spectrum::DecayMode;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How peak-hold lifetimes advance between analysis calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldTiming {
    /// Every analysis call counts as one frame at `refresh_rate_hz`.
    ///
    /// Hold durations are only accurate if the consumer actually polls at
    /// that rate.
    #[default]
    Frames,
    /// Each call advances by the measured time since the previous call,
    /// converted to frames at `refresh_rate_hz`.
    WallClock,
}

/// Configuration for the visualization engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    /// Number of ring buffer channels
    pub channels: usize,
    /// Ring buffer capacity in samples per channel
    pub capacity: usize,
    /// Assumed consumer cadence used to turn hold seconds into frames
    pub refresh_rate_hz: f32,
    /// Divisor applied to magnitudes before mapping to pixel rows
    pub scaling_factor: f32,
    /// Peak-hold clock
    pub hold_timing: HoldTiming,
    /// Low-pass cutoff in Hz (20 - 20000)
    pub low_pass_hz: f32,
    /// Peak-hold decay mode
    pub decay_mode: DecayMode,
    /// Spectrum analysis window in seconds (0.1 - 10.0)
    pub fallback_seconds: f32,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            channels: DEFAULT_CHANNELS,
            capacity: DEFAULT_CAPACITY,
            refresh_rate_hz: DEFAULT_REFRESH_RATE_HZ,
            scaling_factor: SPECTRUM_SCALING_FACTOR,
            hold_timing: HoldTiming::Frames,
            low_pass_hz: MAX_LOW_PASS_HZ,
            decay_mode: DecayMode::None,
            fallback_seconds: DEFAULT_FALLBACK_SECONDS,
        }
    }
}

impl VisualizerConfig {
    /// Set the ring buffer channel count.
    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    /// Set the ring buffer capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the assumed consumer cadence.
    pub fn with_refresh_rate(mut self, hz: f32) -> Self {
        self.refresh_rate_hz = hz;
        self
    }

    /// Set the spectrum display divisor.
    pub fn with_scaling_factor(mut self, factor: f32) -> Self {
        self.scaling_factor = factor;
        self
    }

    /// Set the peak-hold clock.
    pub fn with_hold_timing(mut self, timing: HoldTiming) -> Self {
        self.hold_timing = timing;
        self
    }

    /// Set the low-pass cutoff, clamped to 20 - 20000 Hz.
    pub fn with_low_pass(mut self, hz: f32) -> Self {
        self.low_pass_hz = clamp_low_pass_hz(hz);
        self
    }

    /// Set the peak-hold decay mode.
    pub fn with_decay_mode(mut self, mode: DecayMode) -> Self {
        self.decay_mode = mode;
        self
    }

    /// Set the analysis window, clamped to 0.1 - 10.0 s.
    pub fn with_fallback_seconds(mut self, seconds: f32) -> Self {
        self.fallback_seconds = clamp_fallback_seconds(seconds);
        self
    }

    /// Check structural values and pull the user controls into range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for zero channels or capacity, or a
    /// non-positive refresh rate or scaling factor.
    pub fn validate(mut self) -> Result<Self> {
        if self.channels == 0 {
            return Err(Error::Config("channels must be at least 1".into()));
        }
        if self.capacity == 0 {
            return Err(Error::Config("capacity must be greater than 0".into()));
        }
        if !(self.refresh_rate_hz > 0.0 && self.refresh_rate_hz.is_finite()) {
            return Err(Error::Config(format!(
                "refresh_rate_hz must be positive, got {}",
                self.refresh_rate_hz
            )));
        }
        if !(self.scaling_factor > 0.0 && self.scaling_factor.is_finite()) {
            return Err(Error::Config(format!(
                "scaling_factor must be positive, got {}",
                self.scaling_factor
            )));
        }
        self.low_pass_hz = clamp_low_pass_hz(self.low_pass_hz);
        self.fallback_seconds = clamp_fallback_seconds(self.fallback_seconds);
        Ok(self)
    }

    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()
    }

    /// Load and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("loading configuration from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the configuration as JSON to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}

/// Clamp a cutoff frequency into the recognized 20 - 20000 Hz range.
pub fn clamp_low_pass_hz(hz: f32) -> f32 {
    if hz.is_nan() {
        log::warn!("low-pass cutoff is NaN, using {MAX_LOW_PASS_HZ} Hz");
        return MAX_LOW_PASS_HZ;
    }
    let clamped = hz.clamp(MIN_LOW_PASS_HZ, MAX_LOW_PASS_HZ);
    if clamped != hz {
        log::warn!("low-pass cutoff {hz} Hz clamped to {clamped} Hz");
    }
    clamped
}

/// Clamp an analysis window into the recognized 0.1 - 10.0 s range.
pub fn clamp_fallback_seconds(seconds: f32) -> f32 {
    if seconds.is_nan() {
        log::warn!("analysis window is NaN, using {DEFAULT_FALLBACK_SECONDS} s");
        return DEFAULT_FALLBACK_SECONDS;
    }
    let clamped = seconds.clamp(MIN_FALLBACK_SECONDS, MAX_FALLBACK_SECONDS);
    if clamped != seconds {
        log::warn!("analysis window {seconds} s clamped to {clamped} s");
    }
    clamped
}
