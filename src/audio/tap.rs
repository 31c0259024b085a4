use std::sync::{Arc, Mutex};

use log::{info, warn};

use crate::config::{AudioConfig, AudioDelivery};
use crate::error::{BufferError, HandoverError};
use crate::handover::{AudioSink, OutputHandle};
use crate::logging::{StreamEventType, StreamLogger};
use crate::models::AudioChunk;
use crate::registry::NodeRegistry;
use super::buffer::{AudioBlock, AudioRingBuffer, BlockSource, PushReport, RingStatus};
use super::channel::{chunk_channel, ChunkReceiver};

/// Whether an [`AudioTap`] is attached to an orchestrator output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingStatus {
    NotBound,
    Bound,
    BindingError,
}

impl BindingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BindingStatus::NotBound => "Not bound",
            BindingStatus::Bound => "Bound",
            BindingStatus::BindingError => "Binding error",
        }
    }
}

impl std::fmt::Display for BindingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Consumer side of an orchestrator's audio.
///
/// Binds to a published output by path, receives the active slot's chunks
/// into an [`AudioRingBuffer`] and serves fixed-size planar blocks from it.
pub struct AudioTap {
    path: String,
    target: String,
    status: BindingStatus,
    ring: Arc<AudioRingBuffer>,
    bound: Option<OutputHandle>,
    receiver: Option<ChunkReceiver>,
    delivery: AudioDelivery,
    channel_capacity: usize,
    /// Push failure from the decoder thread, surfaced on the next pull
    failure: Arc<Mutex<Option<BufferError>>>,
    logger: StreamLogger,
    execute_count: u64,
    samples_pulled: u64,
}

impl AudioTap {
    pub fn new(path: &str, target: &str, config: &AudioConfig) -> Self {
        Self {
            path: path.to_string(),
            target: target.to_string(),
            status: BindingStatus::NotBound,
            ring: Arc::new(AudioRingBuffer::new(config)),
            bound: None,
            receiver: None,
            delivery: config.delivery,
            channel_capacity: config.channel_capacity,
            failure: Arc::new(Mutex::new(None)),
            logger: StreamLogger::new(),
            execute_count: 0,
            samples_pulled: 0,
        }
    }

    pub fn with_logger(mut self, logger: StreamLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Change the output this tap follows. Takes effect on the next `bind`.
    pub fn set_target(&mut self, target: &str) {
        if target != self.target {
            self.unbind();
            self.target = target.to_string();
        }
    }

    /// Resolve the target in `registry` and attach to it. Safe to call every
    /// tick: an existing binding to the same output is kept.
    pub fn bind(&mut self, registry: &NodeRegistry) -> BindingStatus {
        let handle = match registry.resolve(&self.target, &self.path) {
            Some(handle) => handle,
            None => {
                if self.bound.is_some() {
                    self.unbind();
                }
                self.status = if self.target.is_empty() {
                    BindingStatus::NotBound
                } else {
                    BindingStatus::BindingError
                };
                return self.status;
            }
        };

        if let Some(current) = &self.bound {
            if current.same_output(&handle) {
                return self.status;
            }
            self.unbind();
        }

        let sink: AudioSink = match self.delivery {
            AudioDelivery::Direct => {
                let ring = self.ring.clone();
                let failure = self.failure.clone();
                let logger = self.logger.clone();
                Arc::new(move |chunk: AudioChunk| match ring.push(&chunk) {
                    Ok(report) => note_push(&logger, &report, &chunk),
                    Err(err) => *failure.lock().unwrap() = Some(err),
                })
            }
            AudioDelivery::Channel => {
                let (tx, rx) = chunk_channel(self.channel_capacity);
                self.receiver = Some(rx);
                Arc::new(move |chunk: AudioChunk| {
                    tx.send(chunk);
                })
            }
        };

        self.ring.clear();
        handle.set_audio_sink(Some(sink));
        self.bound = Some(handle);
        self.status = BindingStatus::Bound;
        info!("Audio tap {} bound to {}", self.path, self.target);
        self.status
    }

    pub fn unbind(&mut self) {
        if let Some(handle) = self.bound.take() {
            handle.set_audio_sink(None);
            info!("Audio tap {} released {}", self.path, self.target);
        }
        self.receiver = None;
        self.ring.clear();
        self.status = BindingStatus::NotBound;
    }

    /// Serve one block of `samples_per_channel` samples on `channels` outputs
    pub fn pull(&mut self, samples_per_channel: usize, channels: usize) -> Result<AudioBlock, HandoverError> {
        self.execute_count += 1;

        if let Some(err) = self.failure.lock().unwrap().take() {
            warn!("Audio tap {}: {}", self.path, err);
            return Err(err.into());
        }
        if let Some(receiver) = &self.receiver {
            receiver.drain_into(&self.ring)?;
        }

        let block = self.ring.pull(samples_per_channel, channels);
        if block.source == BlockSource::Samples {
            self.samples_pulled += samples_per_channel as u64;
        }
        Ok(block)
    }

    pub fn binding_status(&self) -> BindingStatus {
        self.status
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn execute_count(&self) -> u64 {
        self.execute_count
    }

    pub fn samples_pulled(&self) -> u64 {
        self.samples_pulled
    }

    /// Chunks lost because the delivery channel was full
    pub fn dropped_chunks(&self) -> u64 {
        self.receiver.as_ref().map_or(0, ChunkReceiver::dropped)
    }

    pub fn ring_status(&self) -> RingStatus {
        self.ring.status()
    }
}

impl Drop for AudioTap {
    fn drop(&mut self) {
        self.unbind();
    }
}

fn note_push(logger: &StreamLogger, report: &PushReport, chunk: &AudioChunk) {
    if report.reallocated {
        logger.log_event(
            StreamEventType::BufferReallocated,
            format!(
                "Ring sized for {:?} delay at {}",
                chunk.delay,
                chunk.format.format_description()
            ),
            None,
        );
    } else if report.rebased {
        logger.log_event(
            StreamEventType::BufferRebased,
            format!("Reader moved to {:?} behind writer", chunk.delay),
            None,
        );
    }
    if report.overrun {
        logger.log_event(
            StreamEventType::BufferOverrun,
            format!("Push of {} bytes overran the ring", chunk.data.len()),
            None,
        );
    }
}
