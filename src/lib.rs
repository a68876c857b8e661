//! Real-time waveform and spectrum outlines for streaming audio
//!
//! Ingests a continuous stream of audio blocks and derives two visual
//! representations of the signal: a time-domain waveform outline and a
//! log-frequency spectrum outline with optional peak hold and a low-pass
//! cutoff marker. Painting is left to the caller; this crate only produces
//! ordered vertex sequences.
//!
//! # Components
//! - [`RingBuffer`]: fixed-capacity multichannel store shared by producer and consumer
//! - [`LowPassFilter`]: per-channel one-pole IIR applied in the producer path
//! - [`WaveformExtractor`]: most recent samples mapped to a polyline
//! - [`SpectrumAnalyzer`]: power-of-two magnitude spectrum with peak hold
//! - [`VisualizationEngine`]: composition root owning the store and peak-hold state
//!
//! # Quick start
//! ```no_run
//! use spectrum_viz::{DecayMode, VisualizationEngine, VisualizerConfig};
//!
//! let mut engine = VisualizationEngine::new(VisualizerConfig::default()).unwrap();
//! let mut producer = engine.producer();
//! producer.prepare(48_000.0, 2);
//!
//! // Audio thread: one call per host block
//! let mut left = vec![0.0f32; 512];
//! let mut right = vec![0.0f32; 512];
//! producer.process_block(&mut [&mut left[..], &mut right[..]]).unwrap();
//!
//! // Visual thread: one call per refresh
//! let waveform = engine.waveform_path(512, 0, 200.0, 400.0).unwrap();
//! let spectrum = engine
//!     .spectrum_path(0.5, 0, 200.0, 400.0, DecayMode::Fast, 1_000.0)
//!     .unwrap();
//! # let _ = (waveform, spectrum);
//! ```

#![warn(missing_docs)]

pub mod buffer; // Shared sample storage
pub mod config; // Configuration surface
pub mod constants; // Display and tuning constants
pub mod engine; // Producer/consumer facade
pub mod filter; // One-pole low-pass
pub mod path; // Vertex output
pub mod spectrum; // Spectral analysis and peak hold
pub mod waveform; // Time-domain outline

/// Error types for visualization operations
///
/// Precondition violations are reported here instead of being truncated,
/// since silently shortening a read would corrupt the displayed data.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Channel index outside the store's channel range
    #[error("Channel {channel} out of range (store has {channels} channels)")]
    ChannelOutOfRange {
        /// Requested channel
        channel: usize,
        /// Number of channels available
        channels: usize,
    },

    /// Requested sample count larger than the store can hold
    #[error("Sample count {count} exceeds buffer capacity {capacity}")]
    CountExceedsCapacity {
        /// Requested count
        count: usize,
        /// Store capacity
        capacity: usize,
    },

    /// Invalid buffer capacity at construction
    #[error("Invalid capacity: {0}")]
    InvalidCapacity(String),

    /// Invalid channel count at construction
    #[error("Invalid channel count: {0} (must be at least 1)")]
    InvalidChannelCount(usize),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error while reading or writing configuration
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed configuration document
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for visualization operations
pub type Result<T> = std::result::Result<T, Error>;

// Public API exports
pub use buffer::{RingBuffer, SampleStore};
pub use config::{HoldTiming, VisualizerConfig};
pub use engine::{SampleProducer, VisualizationEngine};
pub use filter::LowPassFilter;
pub use path::{Path, Point};
pub use spectrum::{DecayMode, PeakHold, SpectrumAnalyzer};
pub use waveform::WaveformExtractor;
