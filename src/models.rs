use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifecycle state reported by a media player
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PlayerState {
    #[default]
    NothingSpecial,
    Opening,
    Buffering,
    Playing,
    Paused,
    Stopped,
    Ended,
    Error,
}

impl PlayerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerState::NothingSpecial => "Nothing Special",
            PlayerState::Opening => "Opening",
            PlayerState::Buffering => "Buffering",
            PlayerState::Playing => "Playing",
            PlayerState::Paused => "Paused",
            PlayerState::Stopped => "Stopped",
            PlayerState::Ended => "Ended",
            PlayerState::Error => "Error",
        }
    }
}

impl std::fmt::Display for PlayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of a media player's state. Decision logic only ever reads these
/// snapshots, never the live player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PlayerStatus {
    pub state: PlayerState,
    pub url: String,
    /// Video geometry and duration are known
    pub video_ready: bool,
    pub audio_ready: bool,
    pub width: u32,
    pub height: u32,
    pub fps: f32,
    pub total_time_ms: i64,
    pub current_time_ms: i64,
    /// Buffer fill level, 0 to 100
    pub buffer_level: f32,
    pub warning: Option<String>,
    pub error: Option<String>,
    pub info: Option<String>,
}

impl PlayerStatus {
    /// Size in bytes of one RGBA frame at the reported geometry
    pub fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    /// Playback progress between 0.0 and 1.0, zero when the duration is unknown
    pub fn progress(&self) -> f64 {
        if self.total_time_ms <= 0 {
            return 0.0;
        }
        (self.current_time_ms as f64 / self.total_time_ms as f64).clamp(0.0, 1.0)
    }
}

/// Integer PCM sample encodings accepted by the audio ring buffer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SampleFormat {
    S16Le,
    S32Le,
}

impl SampleFormat {
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            SampleFormat::S16Le => 2,
            SampleFormat::S32Le => 4,
        }
    }

    /// Largest positive sample magnitude, used to normalize to [-1.0, 1.0]
    pub fn max_value(&self) -> f32 {
        match self {
            SampleFormat::S16Le => i16::MAX as f32,
            SampleFormat::S32Le => i32::MAX as f32,
        }
    }

    /// Decode one little-endian sample from `bytes`
    pub fn decode(&self, bytes: &[u8]) -> f32 {
        match self {
            SampleFormat::S16Le => i16::from_le_bytes([bytes[0], bytes[1]]) as f32,
            SampleFormat::S32Le => {
                i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f32
            }
        }
    }
}

/// Interleaved PCM stream format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub sample_format: SampleFormat,
}

impl AudioFormat {
    pub fn new(sample_rate: u32, channels: u16, sample_format: SampleFormat) -> Self {
        Self {
            sample_rate,
            channels,
            sample_format,
        }
    }

    /// Bytes occupied by one sample of every channel
    pub fn frame_bytes(&self) -> usize {
        self.channels as usize * self.sample_format.bytes_per_sample()
    }

    pub fn byte_rate(&self) -> usize {
        self.sample_rate as usize * self.frame_bytes()
    }

    /// Byte count covering `delay` at this format, rounded down to whole frames
    pub fn bytes_for(&self, delay: Duration) -> usize {
        let raw = (delay.as_nanos() * self.byte_rate() as u128 / 1_000_000_000) as usize;
        let frame = self.frame_bytes().max(1);
        raw - raw % frame
    }

    pub fn format_description(&self) -> String {
        format!(
            "{:.1}kHz {}-bit {}ch",
            self.sample_rate as f32 / 1000.0,
            self.sample_format.bytes_per_sample() * 8,
            self.channels
        )
    }
}

/// A block of decoded audio handed over by a player, with the end-to-end delay
/// the player reports for it
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    pub format: AudioFormat,
    pub delay: Duration,
    pub data: Vec<u8>,
}

impl AudioChunk {
    pub fn new(format: AudioFormat, delay: Duration, data: Vec<u8>) -> Self {
        Self { format, delay, data }
    }

    /// Build a 16-bit chunk from interleaved samples
    pub fn from_i16(sample_rate: u32, channels: u16, delay: Duration, samples: &[i16]) -> Self {
        let data = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        Self {
            format: AudioFormat::new(sample_rate, channels, SampleFormat::S16Le),
            delay,
            data,
        }
    }

    /// Samples per channel carried by this chunk
    pub fn frames(&self) -> usize {
        let frame = self.format.frame_bytes();
        if frame == 0 {
            0
        } else {
            self.data.len() / frame
        }
    }
}

/// Host parameter snapshot read once per tick
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Parameters {
    pub url: String,
    pub paused: bool,
    pub looping: bool,
    pub blackout: bool,
    /// Normalized seek position, 0.0 to 1.0
    pub seek_position: f32,
    pub playback_speed: f32,
    pub start_time_sec: f64,
    /// Reported on the diagnostic channels only
    pub end_time_sec: f64,
    /// Swap as soon as the handover is ready; otherwise wait for the switch cue
    pub seamless: bool,
    pub switch_cue: bool,
    pub preview_url: String,
    pub preview_enabled: bool,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            url: String::new(),
            paused: false,
            looping: false,
            blackout: false,
            seek_position: 0.0,
            playback_speed: 1.0,
            start_time_sec: 0.0,
            end_time_sec: 0.0,
            seamless: true,
            switch_cue: false,
            preview_url: String::new(),
            preview_enabled: false,
        }
    }
}

impl Parameters {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Presentation state of the orchestrator's output
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Active video geometry not known yet
    #[default]
    None,
    ReadyToRun,
    Running,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::None => "None",
            PlaybackState::ReadyToRun => "ReadyToRun",
            PlaybackState::Running => "Running",
        }
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Progress of the replacement stream on the spare slot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum HandoverState {
    #[default]
    NoHandover,
    Initiated,
    Ready,
}

impl HandoverState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandoverState::NoHandover => "No handover",
            HandoverState::Initiated => "Initiated",
            HandoverState::Ready => "Ready",
        }
    }
}

impl std::fmt::Display for HandoverState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
