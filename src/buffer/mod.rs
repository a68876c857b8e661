//! Shared sample storage between the audio producer and the visual consumer
//!
//! The producer pushes one block per host callback; the consumer reads the
//! most recent window at its own refresh rate. Both go through the
//! [`SampleStore`] trait so the synchronization strategy can be replaced
//! (for example by a lock-free single-producer/single-consumer snapshot)
//! without touching the analysis code.

pub mod ring_buffer;

pub use ring_buffer::RingBuffer;

use crate::Result;

/// Fixed-capacity multichannel sample store.
///
/// # Contract
/// - `push` of `k <= capacity` samples always succeeds by overwriting the
///   oldest `k` samples of that channel.
/// - `read_into` of `k <= capacity` samples yields the `k` most recently
///   written samples, oldest first.
/// - Out-of-range channels and counts above capacity are rejected with an
///   error, never truncated.
pub trait SampleStore: Send + Sync {
    /// Number of channels.
    fn channels(&self) -> usize;

    /// Samples retained per channel.
    fn capacity(&self) -> usize;

    /// Append `samples` to `channel`, advancing the shared write cursor.
    fn push(&self, samples: &[f32], channel: usize) -> Result<()>;

    /// Fill `dest` with the `dest.len()` most recent samples of `channel`.
    fn read_into(&self, dest: &mut [f32], channel: usize) -> Result<()>;

    /// Zero all storage and reset the cursors.
    fn clear(&self);

    /// Allocating convenience wrapper around [`SampleStore::read_into`].
    fn read(&self, count: usize, channel: usize) -> Result<Vec<f32>> {
        let mut out = vec![0.0; count];
        self.read_into(&mut out, channel)?;
        Ok(out)
    }
}
