pub mod buffer;
pub mod channel;
pub mod tap;

pub use buffer::{AudioBlock, AudioRingBuffer, BlockSource, PushReport, RingStats, RingStatus};
pub use channel::{chunk_channel, ChunkReceiver, ChunkSender};
pub use tap::{AudioTap, BindingStatus};

pub use crate::config::{AudioDelivery, OverrunPolicy};
