//! Ring buffer holding the most recent samples of every channel
//!
//! Unlike a playback FIFO, reads do not consume data: every read returns the
//! newest `count` samples relative to the write cursor. Writes never fail for
//! lack of space, they overwrite the oldest samples instead.
//!
//! Memory consumption is fixed at `channels * capacity * sizeof(f32)`.

use super::SampleStore;
use crate::{Error, Result};
use parking_lot::Mutex;

/// Upper bound on the total allocation (512 MB worth of f32 samples).
const MAX_TOTAL_SAMPLES: usize = 512 * 1024 * 1024 / std::mem::size_of::<f32>();

/// Storage and cursors, always accessed together under the lock.
#[derive(Debug)]
struct Storage {
    /// One vector of `capacity` samples per channel
    data: Vec<Vec<f32>>,
    /// Next index to be written, shared by all channels
    write_pos: usize,
    /// Start index of the most recent read
    read_pos: usize,
}

/// Multichannel ring buffer for visualization
///
/// # Thread Safety
/// - One producer thread (audio callback) calling [`SampleStore::push`]
/// - One consumer thread (visual refresh) calling [`SampleStore::read_into`]
/// - A single `parking_lot::Mutex` covers all channels and the cursors, held
///   only for the duration of each copy
///
/// Concurrent pushes from several producers are serialized but not ordered.
#[derive(Debug)]
pub struct RingBuffer {
    storage: Mutex<Storage>,
    channels: usize,
    capacity: usize,
}

impl RingBuffer {
    /// Create a new ring buffer with `channels` channels of `capacity` samples
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `channels` is 0
    /// - `capacity` is 0
    /// - The total allocation would exceed 512 MB
    pub fn new(channels: usize, capacity: usize) -> Result<Self> {
        if channels == 0 {
            return Err(Error::InvalidChannelCount(channels));
        }
        if capacity == 0 {
            return Err(Error::InvalidCapacity(
                "Ring buffer capacity must be greater than 0".into(),
            ));
        }

        let total = channels.checked_mul(capacity).unwrap_or(usize::MAX);
        if total > MAX_TOTAL_SAMPLES {
            return Err(Error::InvalidCapacity(format!(
                "Ring buffer of {channels} x {capacity} samples exceeds maximum safe size {MAX_TOTAL_SAMPLES}"
            )));
        }

        log::debug!("ring buffer: {channels} channels x {capacity} samples");

        Ok(RingBuffer {
            storage: Mutex::new(Storage {
                data: vec![vec![0.0; capacity]; channels],
                write_pos: 0,
                read_pos: 0,
            }),
            channels,
            capacity,
        })
    }

    /// Current write cursor, in `[0, capacity)`.
    pub fn write_position(&self) -> usize {
        self.storage.lock().write_pos
    }

    /// Start index of the most recent read, in `[0, capacity)`.
    pub fn read_position(&self) -> usize {
        self.storage.lock().read_pos
    }

    fn check(&self, count: usize, channel: usize) -> Result<()> {
        if channel >= self.channels {
            return Err(Error::ChannelOutOfRange {
                channel,
                channels: self.channels,
            });
        }
        if count > self.capacity {
            return Err(Error::CountExceedsCapacity {
                count,
                capacity: self.capacity,
            });
        }
        Ok(())
    }
}

impl SampleStore for RingBuffer {
    fn channels(&self) -> usize {
        self.channels
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn push(&self, samples: &[f32], channel: usize) -> Result<()> {
        let count = samples.len();
        self.check(count, channel)?;

        let mut storage = self.storage.lock();
        let write_idx = storage.write_pos;
        let buf = &mut storage.data[channel];

        if write_idx + count <= self.capacity {
            buf[write_idx..write_idx + count].copy_from_slice(samples);
        } else {
            // Wrap-around write
            let first_part = self.capacity - write_idx;
            buf[write_idx..].copy_from_slice(&samples[..first_part]);
            buf[..count - first_part].copy_from_slice(&samples[first_part..]);
        }

        storage.write_pos = (write_idx + count) % self.capacity;
        Ok(())
    }

    fn read_into(&self, dest: &mut [f32], channel: usize) -> Result<()> {
        let count = dest.len();
        self.check(count, channel)?;

        let mut storage = self.storage.lock();
        let read_idx = (storage.write_pos + self.capacity - count) % self.capacity;
        storage.read_pos = read_idx;
        let buf = &storage.data[channel];

        if read_idx + count <= self.capacity {
            dest.copy_from_slice(&buf[read_idx..read_idx + count]);
        } else {
            // Wrap-around read
            let first_part = self.capacity - read_idx;
            dest[..first_part].copy_from_slice(&buf[read_idx..]);
            dest[first_part..].copy_from_slice(&buf[..count - first_part]);
        }

        Ok(())
    }

    fn clear(&self) {
        let mut storage = self.storage.lock();
        for channel in storage.data.iter_mut() {
            channel.fill(0.0);
        }
        storage.write_pos = 0;
        storage.read_pos = 0;
    }
}
