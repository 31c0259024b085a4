use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::error::BufferError;
use crate::models::AudioChunk;
use super::buffer::AudioRingBuffer;

/// Create a bounded single-producer chunk channel.
///
/// The decoder side never blocks: when the channel is full the incoming chunk
/// is dropped and counted.
pub fn chunk_channel(capacity: usize) -> (ChunkSender, ChunkReceiver) {
    let (tx, rx) = bounded(capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    (
        ChunkSender {
            tx,
            dropped: dropped.clone(),
        },
        ChunkReceiver { rx, dropped },
    )
}

#[derive(Clone)]
pub struct ChunkSender {
    tx: Sender<AudioChunk>,
    dropped: Arc<AtomicU64>,
}

impl ChunkSender {
    /// Hand a chunk to the consumer. Returns false if it was dropped.
    pub fn send(&self, chunk: AudioChunk) -> bool {
        match self.tx.try_send(chunk) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

pub struct ChunkReceiver {
    rx: Receiver<AudioChunk>,
    dropped: Arc<AtomicU64>,
}

impl ChunkReceiver {
    /// Move every queued chunk into `ring`. Returns the number of chunks moved.
    pub fn drain_into(&self, ring: &AudioRingBuffer) -> Result<usize, BufferError> {
        let mut moved = 0;
        while let Ok(chunk) = self.rx.try_recv() {
            ring.push(&chunk)?;
            moved += 1;
        }
        Ok(moved)
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Chunks dropped because the channel was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
