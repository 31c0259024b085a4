use std::sync::Mutex;
use std::time::Duration;
use log::{debug, trace};

use crate::config::{AudioConfig, OverrunPolicy};
use crate::error::BufferError;
use crate::models::{AudioChunk, AudioFormat};

/// Counters kept by the ring buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RingStats {
    pub pushes: u64,
    pub pulls: u64,
    pub underruns: u64,
    pub overruns: u64,
    pub rebases: u64,
    pub reallocations: u64,
    pub dropped_bytes: u64,
}

/// What a single push did to the buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushReport {
    pub reallocated: bool,
    pub rebased: bool,
    pub overrun: bool,
    /// Bytes copied into the ring; zero when the chunk was rejected
    pub written: usize,
}

/// Where the samples of a pulled block came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSource {
    Samples,
    /// Silence while the read pointer catches up to the first written byte
    PreRoll,
    /// Silence because fewer bytes than requested were buffered
    Underrun,
    /// Silence because nothing was ever pushed
    Empty,
}

/// Planar block of normalized samples returned by [`AudioRingBuffer::pull`]
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBlock {
    pub channels: Vec<Vec<f32>>,
    pub source: BlockSource,
}

impl AudioBlock {
    fn silent(samples_per_channel: usize, channels: usize, source: BlockSource) -> Self {
        Self {
            channels: vec![vec![0.0; samples_per_channel]; channels],
            source,
        }
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    pub fn samples_per_channel(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn is_silent(&self) -> bool {
        self.channels.iter().flatten().all(|s| *s == 0.0)
    }
}

#[derive(Debug, Default)]
struct RingState {
    buffer: Vec<u8>,
    /// Total bytes ever written; only moves forward
    write_ptr: i64,
    /// Next byte to read. Negative while pre-rolling.
    read_ptr: i64,
    format: Option<AudioFormat>,
    last_delay: Option<Duration>,
    stats: RingStats,
}

/// Byte ring between an asynchronous audio producer and a fixed-rate consumer.
///
/// The producer pushes decoded chunks tagged with the delay the decoder reports;
/// the buffer sizes itself to `safety_factor` times that delay and keeps the read
/// pointer `delay` bytes behind the write pointer, rebasing when the reported
/// delay drifts past `rebase_tolerance`. Capacity never shrinks. Push and pull
/// serialize on one lock and copy at most one chunk or one block while holding it.
#[derive(Debug)]
pub struct AudioRingBuffer {
    state: Mutex<RingState>,
    safety_factor: f64,
    rebase_tolerance: f64,
    policy: OverrunPolicy,
}

impl Default for AudioRingBuffer {
    fn default() -> Self {
        Self::new(&AudioConfig::default())
    }
}

impl AudioRingBuffer {
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            state: Mutex::new(RingState::default()),
            safety_factor: config.safety_factor.max(1.0),
            rebase_tolerance: config.rebase_tolerance,
            policy: config.overrun_policy,
        }
    }

    pub fn policy(&self) -> OverrunPolicy {
        self.policy
    }

    /// Append a decoded chunk, growing or rebasing the ring first when the
    /// reported delay calls for it.
    pub fn push(&self, chunk: &AudioChunk) -> Result<PushReport, BufferError> {
        let format = chunk.format;
        if format.channels == 0 || format.sample_rate == 0 {
            return Err(BufferError::InvalidFormat {
                reason: format!("{} Hz with {} channels", format.sample_rate, format.channels),
            });
        }
        let frame = format.frame_bytes();
        let len = chunk.data.len();
        if len % frame != 0 {
            return Err(BufferError::InvalidFormat {
                reason: format!("{} bytes is not a whole number of {}-byte frames", len, frame),
            });
        }

        let delay_bytes = format.bytes_for(chunk.delay);
        let wanted = ((delay_bytes as f64 * self.safety_factor).ceil() as usize).max(len).max(frame);
        let required = align_up(wanted, frame);

        let mut state = self.state.lock().unwrap();
        state.stats.pushes += 1;
        let mut report = PushReport::default();

        let needs_alloc = state.buffer.is_empty()
            || state.format != Some(format)
            || required > state.buffer.len();

        if needs_alloc {
            let capacity = align_up(required.max(state.buffer.len()), frame);
            let mut buffer = Vec::new();
            buffer
                .try_reserve_exact(capacity)
                .map_err(|_| BufferError::AllocationFailed { bytes: capacity })?;
            buffer.resize(capacity, 0);

            debug!(
                "Audio ring sized to {} bytes for {} at {:?} delay",
                capacity,
                format.format_description(),
                chunk.delay
            );
            state.buffer = buffer;
            state.format = Some(format);
            state.write_ptr = 0;
            state.read_ptr = -(delay_bytes as i64);
            state.stats.reallocations += 1;
            report.reallocated = true;
        } else {
            let drifted = match state.last_delay {
                Some(last) => self.exceeds_tolerance(last, chunk.delay),
                // Cleared ring: anchor the reader again
                None => true,
            };
            if drifted {
                // Indexes the same byte as (write mod capacity) - delay but keeps
                // both pointers on one monotonic axis
                state.read_ptr = state.write_ptr - delay_bytes as i64;
                state.stats.rebases += 1;
                report.rebased = true;
                trace!("Audio ring rebased to {:?} delay", chunk.delay);
            }
        }
        state.last_delay = Some(chunk.delay);

        if len == 0 {
            return Ok(report);
        }

        let capacity = state.buffer.len() as i64;
        let new_write = state.write_ptr + len as i64;
        let unread_start = state.read_ptr.max(0);
        if new_write - unread_start > capacity {
            report.overrun = true;
            state.stats.overruns += 1;
            match self.policy {
                OverrunPolicy::DropNewest => {
                    state.stats.dropped_bytes += len as u64;
                    return Ok(report);
                }
                OverrunPolicy::DropOldest => {
                    let new_read = new_write - capacity;
                    state.stats.dropped_bytes += (new_read - unread_start) as u64;
                    state.read_ptr = new_read;
                }
            }
        }

        let start = (state.write_ptr % capacity) as usize;
        let first = len.min(capacity as usize - start);
        state.buffer[start..start + first].copy_from_slice(&chunk.data[..first]);
        state.buffer[..len - first].copy_from_slice(&chunk.data[first..]);
        state.write_ptr = new_write;
        report.written = len;

        Ok(report)
    }

    /// Fill a planar block of `samples_per_channel` x `channels` normalized
    /// samples. Output channels beyond the stream's channel count repeat the
    /// stream's last channel. Returns silence during pre-roll and on underrun;
    /// an underrun leaves the read pointer where it was.
    pub fn pull(&self, samples_per_channel: usize, channels: usize) -> AudioBlock {
        let mut state = self.state.lock().unwrap();
        state.stats.pulls += 1;

        let format = match state.format {
            Some(format) if !state.buffer.is_empty() => format,
            _ => return AudioBlock::silent(samples_per_channel, channels, BlockSource::Empty),
        };
        if samples_per_channel == 0 || channels == 0 {
            return AudioBlock::silent(samples_per_channel, channels, BlockSource::Samples);
        }

        let frame = format.frame_bytes();
        let requested = (samples_per_channel * frame) as i64;

        if state.read_ptr < 0 {
            state.read_ptr = (state.read_ptr + requested).min(state.write_ptr);
            return AudioBlock::silent(samples_per_channel, channels, BlockSource::PreRoll);
        }

        if state.write_ptr - state.read_ptr < requested {
            state.stats.underruns += 1;
            return AudioBlock::silent(samples_per_channel, channels, BlockSource::Underrun);
        }

        let mut block = AudioBlock::silent(samples_per_channel, channels, BlockSource::Samples);
        let capacity = state.buffer.len();
        let sample_format = format.sample_format;
        let sample_bytes = sample_format.bytes_per_sample();
        let last_channel = format.channels as usize - 1;
        let scale = sample_format.max_value();
        let base = state.read_ptr as usize;
        let mut scratch = [0u8; 4];

        for i in 0..samples_per_channel {
            let frame_start = base + i * frame;
            for (c, out) in block.channels.iter_mut().enumerate() {
                let offset = frame_start + c.min(last_channel) * sample_bytes;
                for (k, byte) in scratch[..sample_bytes].iter_mut().enumerate() {
                    *byte = state.buffer[(offset + k) % capacity];
                }
                out[i] = sample_format.decode(&scratch[..sample_bytes]) / scale;
            }
        }

        state.read_ptr += requested;
        block
    }

    /// Forget buffered audio. Capacity is kept; the next push re-anchors the reader.
    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap();
        state.write_ptr = 0;
        state.read_ptr = 0;
        state.last_delay = None;
    }

    pub fn status(&self) -> RingStatus {
        let state = self.state.lock().unwrap();
        RingStatus {
            capacity: state.buffer.len(),
            buffered_bytes: (state.write_ptr - state.read_ptr.max(0)).max(0) as usize,
            pre_roll_bytes: (-state.read_ptr).max(0) as usize,
            write_ptr: state.write_ptr,
            read_ptr: state.read_ptr,
            format: state.format,
            last_delay: state.last_delay,
            stats: state.stats,
        }
    }

    /// Compared in whole nanoseconds against a parts-per-million tolerance so
    /// a change of exactly the tolerance does not rebase
    fn exceeds_tolerance(&self, last: Duration, delay: Duration) -> bool {
        let last_ns = last.as_nanos();
        let delta_ns = delay.as_nanos().abs_diff(last_ns);
        if last_ns == 0 {
            return delta_ns != 0;
        }
        let tolerance_ppm = (self.rebase_tolerance.max(0.0) * 1_000_000.0).round() as u128;
        delta_ns * 1_000_000 > last_ns * tolerance_ppm
    }
}

fn align_up(bytes: usize, frame: usize) -> usize {
    (bytes + frame - 1) / frame * frame
}

/// Point-in-time view of an [`AudioRingBuffer`]
#[derive(Debug, Clone, PartialEq)]
pub struct RingStatus {
    pub capacity: usize,
    pub buffered_bytes: usize,
    pub pre_roll_bytes: usize,
    pub write_ptr: i64,
    pub read_ptr: i64,
    pub format: Option<AudioFormat>,
    pub last_delay: Option<Duration>,
    pub stats: RingStats,
}

impl RingStatus {
    /// Fill level between 0.0 and 1.0
    pub fn fill_level(&self) -> f32 {
        if self.capacity == 0 {
            0.0
        } else {
            self.buffered_bytes as f32 / self.capacity as f32
        }
    }

    pub fn buffered_duration(&self) -> Duration {
        match self.format {
            Some(format) if format.byte_rate() > 0 => {
                Duration::from_secs_f64(self.buffered_bytes as f64 / format.byte_rate() as f64)
            }
            _ => Duration::ZERO,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.capacity > 0 && (self.pre_roll_bytes > 0 || self.buffered_bytes > 0)
    }

    pub fn status_description(&self) -> String {
        if self.capacity == 0 {
            "No audio received".to_string()
        } else if self.pre_roll_bytes > 0 {
            "Pre-rolling".to_string()
        } else if self.buffered_bytes == 0 {
            "Starved".to_string()
        } else if self.fill_level() > 0.8 {
            "Buffer is well-filled".to_string()
        } else {
            "Buffer is normal".to_string()
        }
    }
}
