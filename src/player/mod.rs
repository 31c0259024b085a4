pub mod sim;

use std::sync::Arc;
use crate::models::{AudioChunk, PlayerStatus};

pub use sim::{PlayerCall, SimScript, SimulatedPlayer};

/// Receives decoded RGBA frames
pub type FrameCallback = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Receives decoded audio chunks
pub type AudioCallback = Arc<dyn Fn(AudioChunk) + Send + Sync>;

/// Callbacks a player invokes from its decoder threads
#[derive(Clone)]
pub struct PlayerSinks {
    pub on_frame: FrameCallback,
    pub on_audio: AudioCallback,
}

impl PlayerSinks {
    /// Sinks that discard everything
    pub fn discard() -> Self {
        Self {
            on_frame: Arc::new(|_| {}),
            on_audio: Arc::new(|_| {}),
        }
    }
}

/// Capability of an external media playback engine.
///
/// Calls are fire-and-forget: failures surface as [`PlayerState::Error`] in
/// the next [`MediaPlayer::status`] snapshot rather than as return values.
/// `play_url` must make the new URL visible in `status()` before it returns.
///
/// [`PlayerState::Error`]: crate::models::PlayerState::Error
pub trait MediaPlayer: Send + Sync {
    /// Name used in log output
    fn name(&self) -> &str;

    /// Open `url` and start decoding into `sinks`
    fn play_url(&self, url: &str, sinks: PlayerSinks);

    /// Resume the current stream
    fn resume(&self);

    fn pause(&self, paused: bool);

    fn stop(&self);

    /// Seek to a normalized position, 0.0 to 1.0
    fn seek(&self, position: f32);

    fn seek_absolute(&self, time_ms: i64);

    fn set_playback_speed(&self, rate: f32);

    /// Output volume, 0 to 100
    fn set_volume(&self, level: u8);

    fn status(&self) -> PlayerStatus;
}
