//! Waveform outline
//!
//! Maps the most recent samples of a channel onto a polyline spanning the
//! target width. Samples are assumed to lie in `[-1, 1]`; values outside that
//! range produce vertices outside `[0, height]` and are not clamped.

use crate::buffer::SampleStore;
use crate::path::{Path, Point};
use crate::Result;

/// Extracts time-domain outlines from a sample store.
///
/// Keeps a scratch buffer between calls so steady-state extraction does not
/// allocate for the samples themselves.
#[derive(Debug, Clone, Default)]
pub struct WaveformExtractor {
    scratch: Vec<f32>,
}

impl WaveformExtractor {
    /// Create a new extractor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the outline of the `count` most recent samples of `channel`
    ///
    /// Vertex `i` sits at `x = i * width / count` and
    /// `y = (sample + 1) * 0.5 * height`.
    ///
    /// # Errors
    ///
    /// Propagates store precondition violations (bad channel, `count`
    /// above capacity).
    pub fn extract<S: SampleStore + ?Sized>(
        &mut self,
        store: &S,
        count: usize,
        channel: usize,
        height: f32,
        width: f32,
    ) -> Result<Path> {
        if count == 0 {
            return Ok(Path::new());
        }

        self.scratch.resize(count, 0.0);
        store.read_into(&mut self.scratch, channel)?;

        let mut path = Path::with_capacity(count);
        for (i, &sample) in self.scratch.iter().enumerate() {
            let point = Point::new(
                i as f32 * width / count as f32,
                (sample + 1.0) * 0.5 * height,
            );
            if i == 0 {
                path.start_new_sub_path(point);
            } else {
                path.line_to(point);
            }
        }

        Ok(path)
    }
}
