//! Producer/consumer facade
//!
//! [`VisualizationEngine`] owns the sample store and the consumer-side
//! analysis state (peak hold, scratch buffers). [`SampleProducer`] is the
//! audio-thread handle: it owns the low-pass filter state and shares the
//! store, sample rate and cutoff with the engine.
//!
//! The store is the only state both sides mutate. Sample rate and cutoff
//! are plain `f32` values published through atomics so neither side ever
//! waits on the other for them.

use crate::buffer::{RingBuffer, SampleStore};
use crate::config::{clamp_low_pass_hz, VisualizerConfig};
use crate::constants::{DEFAULT_FALLBACK_SECONDS, MAX_FALLBACK_SECONDS, MIN_FALLBACK_SECONDS};
use crate::filter::LowPassFilter;
use crate::path::Path;
use crate::spectrum::{DecayMode, SpectrumAnalyzer};
use crate::waveform::WaveformExtractor;
use crate::{Error, Result};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Values written by one side and read by the other, stored as `f32` bits.
#[derive(Debug)]
struct Controls {
    sample_rate: AtomicU32,
    low_pass_hz: AtomicU32,
}

impl Controls {
    fn new(low_pass_hz: f32) -> Self {
        Self {
            sample_rate: AtomicU32::new(0.0f32.to_bits()),
            low_pass_hz: AtomicU32::new(low_pass_hz.to_bits()),
        }
    }

    fn sample_rate(&self) -> f32 {
        f32::from_bits(self.sample_rate.load(Ordering::Relaxed))
    }

    fn set_sample_rate(&self, hz: f32) {
        self.sample_rate.store(hz.to_bits(), Ordering::Relaxed);
    }

    fn low_pass_hz(&self) -> f32 {
        f32::from_bits(self.low_pass_hz.load(Ordering::Relaxed))
    }

    fn set_low_pass_hz(&self, hz: f32) {
        self.low_pass_hz.store(hz.to_bits(), Ordering::Relaxed);
    }
}

// ============================================================================
// Visualization Engine
// ============================================================================

/// Composition root: one sample store, one waveform extractor, one spectrum
/// analyzer.
///
/// Query methods take `&mut self` because peak-hold state belongs to the
/// consumer. Ingestion from the audio thread goes through a
/// [`SampleProducer`] obtained from [`VisualizationEngine::producer`].
#[derive(Debug)]
pub struct VisualizationEngine<S: SampleStore = RingBuffer> {
    store: Arc<S>,
    controls: Arc<Controls>,
    config: VisualizerConfig,
    waveform: WaveformExtractor,
    spectrum: SpectrumAnalyzer,
}

impl VisualizationEngine<RingBuffer> {
    /// Create an engine backed by a [`RingBuffer`] sized from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration does not validate or the ring
    /// buffer cannot be allocated.
    pub fn new(config: VisualizerConfig) -> Result<Self> {
        let config = config.validate()?;
        let store = RingBuffer::new(config.channels, config.capacity)?;
        Self::with_store(config, store)
    }
}

impl<S: SampleStore> VisualizationEngine<S> {
    /// Create an engine around an existing store.
    ///
    /// Analysis windows are bounded by `store.capacity()`; the geometry
    /// fields of `config` are not used to allocate anything here.
    pub fn with_store(config: VisualizerConfig, store: S) -> Result<Self> {
        let config = config.validate()?;
        let spectrum = SpectrumAnalyzer::new(
            store.capacity(),
            config.refresh_rate_hz,
            config.scaling_factor,
            config.hold_timing,
        );
        log::debug!(
            "visualization engine: {} channels x {} samples, cutoff {} Hz",
            store.channels(),
            store.capacity(),
            config.low_pass_hz
        );

        Ok(Self {
            store: Arc::new(store),
            controls: Arc::new(Controls::new(config.low_pass_hz)),
            config,
            waveform: WaveformExtractor::new(),
            spectrum,
        })
    }

    /// Create an audio-thread handle sharing this engine's store and controls.
    ///
    /// The store assumes a single producer; pushes from several handles at
    /// once interleave in no particular order.
    pub fn producer(&self) -> SampleProducer<S> {
        SampleProducer {
            store: Arc::clone(&self.store),
            controls: Arc::clone(&self.controls),
            filter: LowPassFilter::default(),
            mono: Vec::new(),
        }
    }

    /// Publish the host sample rate used to size spectrum windows and
    /// drive the filter.
    pub fn set_sample_rate(&self, hz: f32) {
        self.controls.set_sample_rate(hz);
    }

    /// Current sample rate, `0.0` until one has been set.
    pub fn sample_rate(&self) -> f32 {
        self.controls.sample_rate()
    }

    /// Set the low-pass cutoff, clamped to 20 - 20000 Hz.
    ///
    /// Takes effect at the producer's next block.
    pub fn set_low_pass_frequency(&self, hz: f32) {
        self.controls.set_low_pass_hz(clamp_low_pass_hz(hz));
    }

    /// Current low-pass cutoff in Hz.
    pub fn low_pass_frequency(&self) -> f32 {
        self.controls.low_pass_hz()
    }

    /// Push raw samples straight into the store, bypassing the filter.
    pub fn push(&self, samples: &[f32], channel: usize) -> Result<()> {
        self.store.push(samples, channel)
    }

    /// Outline of the `requested_samples` most recent samples of `channel`.
    pub fn waveform_path(
        &mut self,
        requested_samples: usize,
        channel: usize,
        height: f32,
        width: f32,
    ) -> Result<Path> {
        self.waveform
            .extract(&*self.store, requested_samples, channel, height, width)
    }

    /// Spectrum outline over the last `fallback_seconds` of `channel`
    ///
    /// The window is `sample_rate * fallback_seconds` samples with
    /// `fallback_seconds` clamped to 0.1 - 10.0. That count is clamped to
    /// the store capacity, then rounded down to a power of two. Until a
    /// sample rate is known the window is empty and so is the path.
    pub fn spectrum_path(
        &mut self,
        fallback_seconds: f32,
        channel: usize,
        height: f32,
        width: f32,
        mode: DecayMode,
        cutoff_hz: f32,
    ) -> Result<Path> {
        if !mode.is_enabled() {
            return Ok(Path::new());
        }

        let seconds = if fallback_seconds.is_nan() {
            DEFAULT_FALLBACK_SECONDS
        } else {
            fallback_seconds.clamp(MIN_FALLBACK_SECONDS, MAX_FALLBACK_SECONDS)
        };
        // Saturating cast: NaN and negative rates give an empty window
        let requested =
            ((self.controls.sample_rate() * seconds) as usize).min(self.store.capacity());

        self.spectrum.analyze(
            &*self.store,
            requested,
            channel,
            height,
            width,
            mode,
            cutoff_hz,
        )
    }

    /// Clear the store and forget held peaks.
    pub fn reset(&mut self) {
        self.store.clear();
        self.spectrum.reset();
        log::debug!("visualization engine reset");
    }

    /// Shared sample store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Validated configuration the engine was built from.
    pub fn config(&self) -> &VisualizerConfig {
        &self.config
    }

    /// Spectrum analyzer, for inspecting magnitudes and held peaks.
    pub fn analyzer(&self) -> &SpectrumAnalyzer {
        &self.spectrum
    }
}

// ============================================================================
// Sample Producer
// ============================================================================

/// Audio-thread handle feeding an engine's store
///
/// Owns the low-pass filter state. Every block is filtered in place, summed
/// to mono and pushed to store channel 0.
#[derive(Debug)]
pub struct SampleProducer<S: SampleStore = RingBuffer> {
    store: Arc<S>,
    controls: Arc<Controls>,
    filter: LowPassFilter,
    /// Mono mix of the current block, grown on demand
    mono: Vec<f32>,
}

impl<S: SampleStore> SampleProducer<S> {
    /// Start a processing session.
    ///
    /// Publishes `sample_rate` to the engine and restarts the filter from
    /// silence with one state slot per input channel.
    pub fn prepare(&mut self, sample_rate: f32, input_channels: usize) {
        self.controls.set_sample_rate(sample_rate);
        self.filter.reset(input_channels);
        log::debug!("producer prepared: {sample_rate} Hz, {input_channels} input channels");
    }

    /// Filter, mix down and store one host block
    ///
    /// Each slice in `channels` is one input channel of the block and is
    /// low-passed in place with the current cutoff. The mono sum covers the
    /// shortest channel. Channels beyond those announced in
    /// [`SampleProducer::prepare`] start with fresh filter state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CountExceedsCapacity`] if the block is longer than
    /// the store capacity. The block, the filter state and the store are
    /// left untouched in that case.
    pub fn process_block(&mut self, channels: &mut [&mut [f32]]) -> Result<()> {
        let Some(len) = channels.iter().map(|ch| ch.len()).min() else {
            return Ok(());
        };
        let capacity = self.store.capacity();
        if len > capacity {
            return Err(Error::CountExceedsCapacity {
                count: len,
                capacity,
            });
        }

        let sample_rate = self.controls.sample_rate();
        let cutoff_hz = self.controls.low_pass_hz();
        self.filter.ensure_channels(channels.len());
        for (index, block) in channels.iter_mut().enumerate() {
            self.filter.apply(block, cutoff_hz, sample_rate, index);
        }

        if self.mono.len() < len {
            self.mono.resize(len, 0.0);
        }
        let mono = &mut self.mono[..len];
        mono.fill(0.0);
        for block in channels.iter() {
            for (out, &sample) in mono.iter_mut().zip(block.iter()) {
                *out += sample;
            }
        }

        self.store.push(mono, 0)
    }

    /// Push raw samples to `channel`, bypassing the filter.
    pub fn push(&self, samples: &[f32], channel: usize) -> Result<()> {
        self.store.push(samples, channel)
    }

    /// Sample rate of the current session.
    pub fn sample_rate(&self) -> f32 {
        self.controls.sample_rate()
    }

    /// Cutoff the next block will be filtered with.
    pub fn low_pass_frequency(&self) -> f32 {
        self.controls.low_pass_hz()
    }

    /// Filter state, for inspection.
    pub fn filter(&self) -> &LowPassFilter {
        &self.filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn small_engine() -> VisualizationEngine {
        VisualizationEngine::new(VisualizerConfig::default().with_capacity(8192)).unwrap()
    }

    #[test]
    fn test_new_uses_config_geometry() {
        let engine = VisualizationEngine::new(VisualizerConfig::default()).unwrap();
        assert_eq!(engine.store().channels(), 3);
        assert_eq!(engine.store().capacity(), 80_000);
        assert_eq!(engine.sample_rate(), 0.0);
        assert_eq!(engine.low_pass_frequency(), 20_000.0);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let err = VisualizationEngine::new(VisualizerConfig::default().with_channels(0));
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[test]
    fn test_spectrum_window_clamped_to_store_capacity() {
        let store = RingBuffer::new(1, 1000).unwrap();
        let mut engine =
            VisualizationEngine::with_store(VisualizerConfig::default(), store).unwrap();
        engine.set_sample_rate(48_000.0);
        engine.push(&[0.25; 1000], 0).unwrap();

        // 10 s at 48 kHz asks for 480000 samples; 1000 are kept, 512 analyzed
        let path = engine
            .spectrum_path(10.0, 0, 100.0, 100.0, DecayMode::None, 0.0)
            .unwrap();
        assert_eq!(path.vertex_count(), 256);
    }

    #[test]
    fn test_spectrum_empty_without_sample_rate() {
        let mut engine = small_engine();
        engine.push(&[1.0; 4096], 0).unwrap();
        let path = engine
            .spectrum_path(0.5, 0, 100.0, 100.0, DecayMode::None, 1_000.0)
            .unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn test_spectrum_window_from_seconds() {
        let mut engine = small_engine();
        engine.set_sample_rate(48_000.0);
        engine.push(&[0.0; 8192], 0).unwrap();

        // 48000 * 0.1 = 4800 -> 4096-sample window, 2048 bins + marker
        let path = engine
            .spectrum_path(0.1, 0, 100.0, 100.0, DecayMode::None, 1_000.0)
            .unwrap();
        assert_eq!(path.sub_path_count(), 2);
        assert_eq!(path.vertex_count(), 2048 + 2);

        // Below range clamps to 0.1 s
        let clamped = engine
            .spectrum_path(0.01, 0, 100.0, 100.0, DecayMode::None, 0.0)
            .unwrap();
        assert_eq!(clamped.vertex_count(), 2048);

        // Above the store capacity clamps to its largest power of two
        let long = engine
            .spectrum_path(10.0, 0, 100.0, 100.0, DecayMode::None, 0.0)
            .unwrap();
        assert_eq!(long.vertex_count(), 4096);
    }

    #[test]
    fn test_spectrum_off_is_empty() {
        let mut engine = small_engine();
        engine.set_sample_rate(48_000.0);
        let path = engine
            .spectrum_path(0.5, 99, 100.0, 100.0, DecayMode::Off, 1_000.0)
            .unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn test_waveform_path() {
        let mut engine = small_engine();
        engine.push(&[-1.0, 0.0, 1.0], 1).unwrap();
        let path = engine.waveform_path(3, 1, 10.0, 30.0).unwrap();
        let ys: Vec<f32> = path.points().map(|p| p.y).collect();
        assert_eq!(ys, vec![0.0, 5.0, 10.0]);
    }

    #[test]
    fn test_low_pass_frequency_is_clamped_and_shared() {
        let engine = small_engine();
        let producer = engine.producer();

        engine.set_low_pass_frequency(1_000.0);
        assert_eq!(producer.low_pass_frequency(), 1_000.0);

        engine.set_low_pass_frequency(5.0);
        assert_eq!(engine.low_pass_frequency(), 20.0);
        engine.set_low_pass_frequency(1e6);
        assert_eq!(producer.low_pass_frequency(), 20_000.0);
    }

    #[test]
    fn test_prepare_publishes_sample_rate() {
        let engine = small_engine();
        let mut producer = engine.producer();
        producer.prepare(44_100.0, 2);
        assert_eq!(engine.sample_rate(), 44_100.0);
        assert_eq!(producer.filter().channels(), 2);
    }

    #[test]
    fn test_process_block_sums_to_mono() {
        let engine = small_engine();
        let mut producer = engine.producer();
        // Unknown sample rate leaves the filter a no-op
        producer.prepare(0.0, 2);

        let mut left = [0.25f32; 4];
        let mut right = [0.5f32, -0.5, 0.0, 1.0];
        producer
            .process_block(&mut [&mut left[..], &mut right[..]])
            .unwrap();

        assert_eq!(engine.store().read(4, 0).unwrap(), vec![0.75, -0.25, 0.25, 1.25]);
        assert_eq!(engine.store().read(4, 1).unwrap(), vec![0.0; 4]);
    }

    #[test]
    fn test_process_block_filters_in_place() {
        let engine = small_engine();
        engine.set_low_pass_frequency(1_000.0);
        let mut producer = engine.producer();
        producer.prepare(48_000.0, 2);

        let mut left = vec![1.0f32; 4096];
        let mut right = vec![1.0f32; 4096];
        producer
            .process_block(&mut [&mut left[..], &mut right[..]])
            .unwrap();

        let alpha = LowPassFilter::alpha(1_000.0, 48_000.0);
        assert_relative_eq!(left[0], alpha);
        assert_relative_eq!(right[0], alpha);

        let mono = engine.store().read(4096, 0).unwrap();
        assert_relative_eq!(mono[0], 2.0 * alpha);
        assert_abs_diff_eq!(mono[4095], 2.0, epsilon = 1e-4);
    }

    #[test]
    fn test_process_block_uses_shortest_channel() {
        let engine = small_engine();
        let mut producer = engine.producer();

        let mut a = [1.0f32; 3];
        let mut b = [1.0f32; 5];
        producer.process_block(&mut [&mut a[..], &mut b[..]]).unwrap();

        assert_eq!(engine.store().write_position(), 3);
        // Unannounced channels get state slots
        assert_eq!(producer.filter().channels(), 2);
    }

    #[test]
    fn test_process_block_rejects_oversized_block() {
        let store = RingBuffer::new(1, 8).unwrap();
        let engine = VisualizationEngine::with_store(VisualizerConfig::default(), store).unwrap();
        let mut producer = engine.producer();

        engine.set_low_pass_frequency(1_000.0);
        producer.prepare(48_000.0, 1);

        let mut block = [1.0f32; 9];
        let err = producer.process_block(&mut [&mut block[..]]).unwrap_err();
        assert!(matches!(err, Error::CountExceedsCapacity { count: 9, capacity: 8 }));
        assert_eq!(engine.store().write_position(), 0);
        assert_eq!(producer.filter().last_output(0), Some(0.0));
        assert_eq!(block, [1.0f32; 9]);
    }

    #[test]
    fn test_process_block_without_channels() {
        let engine = small_engine();
        let mut producer = engine.producer();
        producer.process_block(&mut []).unwrap();
        assert_eq!(engine.store().write_position(), 0);
    }

    #[test]
    fn test_reset_clears_store_and_peaks() {
        let mut engine = small_engine();
        engine.set_sample_rate(10_240.0);
        engine.push(&[1.0; 1024], 0).unwrap();
        engine
            .spectrum_path(0.1, 0, 10.0, 10.0, DecayMode::Slow, 0.0)
            .unwrap();
        assert!(!engine.analyzer().peak_hold().peaks().is_empty());

        engine.reset();
        assert!(engine.analyzer().peak_hold().peaks().is_empty());
        assert_eq!(engine.store().read(16, 0).unwrap(), vec![0.0; 16]);
        assert_eq!(engine.store().write_position(), 0);
    }
}
