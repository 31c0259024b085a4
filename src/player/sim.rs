use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::models::{AudioChunk, AudioFormat, PlayerState, PlayerStatus, SampleFormat};
use super::{MediaPlayer, PlayerSinks};

/// A call made on a [`SimulatedPlayer`], recorded for assertions
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCall {
    Play(String),
    Resume,
    Pause(bool),
    Stop,
    Seek(f32),
    SeekAbsolute(i64),
    SetSpeed(f32),
    SetVolume(u8),
}

/// Stream properties the simulated player reports when driven by [`SimulatedPlayer::step`]
#[derive(Debug, Clone)]
pub struct SimScript {
    pub width: u32,
    pub height: u32,
    pub fps: f32,
    pub total_time_ms: i64,
    /// Buffer fill rate in percent per second
    pub buffer_rate: f32,
    pub audio_format: AudioFormat,
    pub audio_delay: Duration,
    pub tone_hz: f32,
}

impl Default for SimScript {
    fn default() -> Self {
        Self {
            width: 64,
            height: 36,
            fps: 30.0,
            total_time_ms: 10_000,
            buffer_rate: 150.0,
            audio_format: AudioFormat::new(48000, 2, SampleFormat::S16Le),
            audio_delay: Duration::from_millis(200),
            tone_hz: 440.0,
        }
    }
}

struct SimState {
    status: PlayerStatus,
    sinks: Option<PlayerSinks>,
    calls: Vec<PlayerCall>,
    script: SimScript,
    paused: bool,
    speed: f32,
    volume: u8,
    frames_emitted: u64,
    phase: f64,
}

/// Deterministic in-process media player.
///
/// Tests script it explicitly (`deliver_metadata`, `set_buffer_level`,
/// `emit_frame`, `finish`, `fail`); the demo binary advances it with `step`.
/// Sinks are always invoked with the internal lock released.
#[derive(Clone)]
pub struct SimulatedPlayer {
    name: Arc<str>,
    inner: Arc<Mutex<SimState>>,
}

impl SimulatedPlayer {
    pub fn new(name: &str) -> Self {
        Self::with_script(name, SimScript::default())
    }

    pub fn with_script(name: &str, script: SimScript) -> Self {
        Self {
            name: Arc::from(name),
            inner: Arc::new(Mutex::new(SimState {
                status: PlayerStatus::default(),
                sinks: None,
                calls: Vec::new(),
                script,
                paused: false,
                speed: 1.0,
                volume: 100,
                frames_emitted: 0,
                phase: 0.0,
            })),
        }
    }

    /// Report video geometry and duration as known
    pub fn deliver_metadata(&self, width: u32, height: u32, total_time_ms: i64) {
        let mut state = self.inner.lock().unwrap();
        Self::apply_metadata(&mut state, width, height, total_time_ms);
    }

    pub fn set_buffer_level(&self, level: f32) {
        self.inner.lock().unwrap().status.buffer_level = level.clamp(0.0, 100.0);
    }

    pub fn set_current_time(&self, time_ms: i64) {
        self.inner.lock().unwrap().status.current_time_ms = time_ms;
    }

    /// Reach end of stream
    pub fn finish(&self) {
        let mut state = self.inner.lock().unwrap();
        state.status.current_time_ms = state.status.total_time_ms;
        state.status.state = PlayerState::Ended;
    }

    /// Fail with a transport error
    pub fn fail(&self, message: &str) {
        let mut state = self.inner.lock().unwrap();
        state.status.state = PlayerState::Error;
        state.status.error = Some(message.to_string());
    }

    pub fn set_warning(&self, message: Option<&str>) {
        self.inner.lock().unwrap().status.warning = message.map(str::to_string);
    }

    /// Deliver a frame to the attached sink. Returns false when nothing is attached.
    pub fn emit_frame(&self, data: &[u8]) -> bool {
        let sink = self.inner.lock().unwrap().sinks.as_ref().map(|s| s.on_frame.clone());
        match sink {
            Some(on_frame) => {
                on_frame(data);
                true
            }
            None => false,
        }
    }

    /// Deliver an audio chunk to the attached sink. Returns false when nothing is attached.
    pub fn emit_audio(&self, chunk: AudioChunk) -> bool {
        let sink = self.inner.lock().unwrap().sinks.as_ref().map(|s| s.on_audio.clone());
        match sink {
            Some(on_audio) => {
                on_audio(chunk);
                true
            }
            None => false,
        }
    }

    /// Advance the simulation by `elapsed`: fill the buffer, report metadata on
    /// the first step after opening, progress playback and emit one frame plus
    /// the audio covering the interval.
    pub fn step(&self, elapsed: Duration) {
        let (sinks, frame, chunk) = {
            let mut state = self.inner.lock().unwrap();
            let s = &mut *state;
            if s.status.url.is_empty()
                || matches!(
                    s.status.state,
                    PlayerState::NothingSpecial | PlayerState::Stopped | PlayerState::Error
                )
            {
                return;
            }

            let secs = elapsed.as_secs_f32();
            s.status.buffer_level = (s.status.buffer_level + s.script.buffer_rate * secs).min(100.0);

            if !s.status.video_ready {
                let (w, h, total) = (s.script.width, s.script.height, s.script.total_time_ms);
                Self::apply_metadata(s, w, h, total);
                return;
            }

            if s.status.state != PlayerState::Playing {
                return;
            }

            let advance = (elapsed.as_secs_f64() * 1000.0 * s.speed as f64) as i64;
            s.status.current_time_ms += advance;
            if s.status.current_time_ms >= s.status.total_time_ms {
                s.status.current_time_ms = s.status.total_time_ms;
                s.status.state = PlayerState::Ended;
                return;
            }

            let sinks = match &s.sinks {
                Some(sinks) => sinks.clone(),
                None => return,
            };

            s.frames_emitted += 1;
            let shade = (s.frames_emitted % 256) as u8;
            let frame = vec![shade; s.status.frame_bytes()];
            let chunk = Self::tone(s, elapsed);
            (sinks, frame, chunk)
        };

        (sinks.on_frame)(&frame);
        (sinks.on_audio)(chunk);
    }

    pub fn calls(&self) -> Vec<PlayerCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().unwrap().calls.clear();
    }

    pub fn has_sinks(&self) -> bool {
        self.inner.lock().unwrap().sinks.is_some()
    }

    pub fn volume(&self) -> u8 {
        self.inner.lock().unwrap().volume
    }

    pub fn speed(&self) -> f32 {
        self.inner.lock().unwrap().speed
    }

    fn apply_metadata(state: &mut SimState, width: u32, height: u32, total_time_ms: i64) {
        let status = &mut state.status;
        status.width = width;
        status.height = height;
        status.fps = state.script.fps;
        status.total_time_ms = total_time_ms;
        status.video_ready = true;
        status.audio_ready = true;
        if matches!(status.state, PlayerState::Opening | PlayerState::Buffering) {
            status.state = if state.paused { PlayerState::Paused } else { PlayerState::Playing };
        }
    }

    fn tone(state: &mut SimState, elapsed: Duration) -> AudioChunk {
        let format = state.script.audio_format;
        let frames = (elapsed.as_secs_f64() * format.sample_rate as f64) as usize;
        let step = 2.0 * std::f64::consts::PI * state.script.tone_hz as f64 / format.sample_rate as f64;
        let mut samples = Vec::with_capacity(frames * format.channels as usize);
        for _ in 0..frames {
            let value = (state.phase.sin() * 0.25 * i16::MAX as f64) as i16;
            state.phase = (state.phase + step) % (2.0 * std::f64::consts::PI);
            for _ in 0..format.channels {
                samples.push(value);
            }
        }
        AudioChunk::from_i16(format.sample_rate, format.channels, state.script.audio_delay, &samples)
    }
}

impl MediaPlayer for SimulatedPlayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn play_url(&self, url: &str, sinks: PlayerSinks) {
        let mut state = self.inner.lock().unwrap();
        state.calls.push(PlayerCall::Play(url.to_string()));
        state.status = PlayerStatus {
            state: PlayerState::Opening,
            url: url.to_string(),
            ..PlayerStatus::default()
        };
        state.sinks = Some(sinks);
        state.paused = false;
    }

    fn resume(&self) {
        let mut state = self.inner.lock().unwrap();
        state.calls.push(PlayerCall::Resume);
        state.paused = false;
        let status = &mut state.status;
        match status.state {
            PlayerState::Paused => status.state = PlayerState::Playing,
            PlayerState::Ended => {
                if status.current_time_ms >= status.total_time_ms {
                    status.current_time_ms = 0;
                }
                status.state = PlayerState::Playing;
            }
            _ => {}
        }
    }

    fn pause(&self, paused: bool) {
        let mut state = self.inner.lock().unwrap();
        state.calls.push(PlayerCall::Pause(paused));
        state.paused = paused;
        let status = &mut state.status;
        match (status.state, paused) {
            (PlayerState::Playing, true) => status.state = PlayerState::Paused,
            (PlayerState::Paused, false) => status.state = PlayerState::Playing,
            _ => {}
        }
    }

    fn stop(&self) {
        let mut state = self.inner.lock().unwrap();
        state.calls.push(PlayerCall::Stop);
        state.status = PlayerStatus {
            state: PlayerState::Stopped,
            ..PlayerStatus::default()
        };
        state.sinks = None;
        state.paused = false;
    }

    fn seek(&self, position: f32) {
        let mut state = self.inner.lock().unwrap();
        state.calls.push(PlayerCall::Seek(position));
        let paused = state.paused;
        let status = &mut state.status;
        status.current_time_ms = (position.clamp(0.0, 1.0) as f64 * status.total_time_ms as f64) as i64;
        if status.state == PlayerState::Ended && status.current_time_ms < status.total_time_ms {
            status.state = if paused { PlayerState::Paused } else { PlayerState::Playing };
        }
    }

    fn seek_absolute(&self, time_ms: i64) {
        let mut state = self.inner.lock().unwrap();
        state.calls.push(PlayerCall::SeekAbsolute(time_ms));
        let status = &mut state.status;
        status.current_time_ms = if status.total_time_ms > 0 {
            time_ms.clamp(0, status.total_time_ms)
        } else {
            time_ms.max(0)
        };
    }

    fn set_playback_speed(&self, rate: f32) {
        let mut state = self.inner.lock().unwrap();
        state.calls.push(PlayerCall::SetSpeed(rate));
        state.speed = rate;
    }

    fn set_volume(&self, level: u8) {
        let mut state = self.inner.lock().unwrap();
        state.calls.push(PlayerCall::SetVolume(level));
        state.volume = level.min(100);
    }

    fn status(&self) -> PlayerStatus {
        self.inner.lock().unwrap().status.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_sinks() -> (PlayerSinks, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let frames = Arc::new(AtomicUsize::new(0));
        let chunks = Arc::new(AtomicUsize::new(0));
        let f = frames.clone();
        let c = chunks.clone();
        let sinks = PlayerSinks {
            on_frame: Arc::new(move |_| {
                f.fetch_add(1, Ordering::SeqCst);
            }),
            on_audio: Arc::new(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        };
        (sinks, frames, chunks)
    }

    #[test]
    fn test_play_url_is_visible_immediately() {
        let player = SimulatedPlayer::new("sim");
        player.play_url("a.mp4", PlayerSinks::discard());

        let status = player.status();
        assert_eq!(status.url, "a.mp4");
        assert_eq!(status.state, PlayerState::Opening);
        assert!(!status.video_ready);
        assert_eq!(player.calls(), vec![PlayerCall::Play("a.mp4".to_string())]);
    }

    #[test]
    fn test_pause_before_metadata_holds_after_metadata() {
        let player = SimulatedPlayer::new("sim");
        player.play_url("a.mp4", PlayerSinks::discard());
        player.pause(true);
        player.deliver_metadata(16, 9, 5000);

        let status = player.status();
        assert!(status.video_ready);
        assert_eq!(status.state, PlayerState::Paused);

        player.pause(false);
        assert_eq!(player.status().state, PlayerState::Playing);
    }

    #[test]
    fn test_stop_clears_url_and_sinks() {
        let player = SimulatedPlayer::new("sim");
        player.play_url("a.mp4", PlayerSinks::discard());
        player.stop();

        let status = player.status();
        assert_eq!(status.state, PlayerState::Stopped);
        assert!(status.url.is_empty());
        assert!(!player.has_sinks());
        assert!(!player.emit_frame(&[0; 4]));
    }

    #[test]
    fn test_seek_absolute_clamps_to_duration() {
        let player = SimulatedPlayer::new("sim");
        player.play_url("a.mp4", PlayerSinks::discard());
        player.deliver_metadata(16, 9, 5000);

        player.seek_absolute(9000);
        assert_eq!(player.status().current_time_ms, 5000);
        player.seek(0.5);
        assert_eq!(player.status().current_time_ms, 2500);
    }

    #[test]
    fn test_finish_and_resume_restarts() {
        let player = SimulatedPlayer::new("sim");
        player.play_url("a.mp4", PlayerSinks::discard());
        player.deliver_metadata(16, 9, 5000);
        player.finish();
        assert_eq!(player.status().state, PlayerState::Ended);

        player.resume();
        let status = player.status();
        assert_eq!(status.state, PlayerState::Playing);
        assert_eq!(status.current_time_ms, 0);
    }

    #[test]
    fn test_fail_reports_error() {
        let player = SimulatedPlayer::new("sim");
        player.play_url("a.mp4", PlayerSinks::discard());
        player.fail("connection reset");

        let status = player.status();
        assert_eq!(status.state, PlayerState::Error);
        assert_eq!(status.error.as_deref(), Some("connection reset"));
    }

    #[test]
    fn test_step_delivers_metadata_then_media() {
        let script = SimScript {
            total_time_ms: 1000,
            ..SimScript::default()
        };
        let player = SimulatedPlayer::with_script("sim", script);
        let (sinks, frames, chunks) = counting_sinks();
        player.play_url("a.mp4", sinks);

        player.step(Duration::from_millis(100));
        assert!(player.status().video_ready);
        assert_eq!(frames.load(Ordering::SeqCst), 0);

        player.step(Duration::from_millis(100));
        assert_eq!(frames.load(Ordering::SeqCst), 1);
        assert_eq!(chunks.load(Ordering::SeqCst), 1);
        assert_eq!(player.status().current_time_ms, 100);

        for _ in 0..20 {
            player.step(Duration::from_millis(100));
        }
        assert_eq!(player.status().state, PlayerState::Ended);
        assert_eq!(player.status().buffer_level, 100.0);
    }

    #[test]
    fn test_tone_chunk_matches_interval() {
        let player = SimulatedPlayer::new("sim");
        let captured = Arc::new(Mutex::new(Vec::new()));
        let sink = captured.clone();
        player.play_url(
            "a.mp4",
            PlayerSinks {
                on_frame: Arc::new(|_| {}),
                on_audio: Arc::new(move |chunk| sink.lock().unwrap().push(chunk)),
            },
        );
        player.step(Duration::from_millis(10));
        player.step(Duration::from_millis(10));

        let chunks = captured.lock().unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].frames(), 480);
        assert_eq!(chunks[0].delay, Duration::from_millis(200));
    }

    #[test]
    fn test_transport_calls_recorded() {
        let player = SimulatedPlayer::new("sim");
        player.set_playback_speed(1.5);
        player.set_volume(120);

        assert_eq!(player.speed(), 1.5);
        assert_eq!(player.volume(), 100);
        assert_eq!(
            player.calls(),
            vec![PlayerCall::SetSpeed(1.5), PlayerCall::SetVolume(120)]
        );
        player.clear_calls();
        assert!(player.calls().is_empty());
    }
}
