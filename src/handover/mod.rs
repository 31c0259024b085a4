//! Gap-free switching between two media players.
//!
//! The orchestrator owns two swappable slots and a preview player. One slot
//! is active and feeds the output; the other prebuffers the next stream, or
//! the current one again for looping, and is held paused on its first frame
//! until the swap. Everything is driven by [`HandoverOrchestrator::tick`],
//! which reads a parameter snapshot plus one status snapshot per player.

pub mod latch;
pub mod output;
pub mod slot;

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};

pub use latch::ParameterLatch;
pub use output::{AudioSink, FrameImage, OutputHandle};
pub use slot::SlotId;
use slot::PlayerSlot;

use crate::config::EngineConfig;
use crate::diagnostics::Diagnostics;
use crate::error::{HandoverError, PlaybackError, RegistryError};
use crate::logging::{OperationTimer, StreamEventType, StreamLogger};
use crate::models::{HandoverState, Parameters, PlaybackState, PlayerState, PlayerStatus};
use crate::player::MediaPlayer;
use crate::registry::NodeRegistry;

/// What the host should show after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    /// Keep showing the previous image
    Hold,
    /// A new frame from the active slot
    Frame,
    Black,
    /// A new frame from the preview player
    Preview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapReason {
    /// The requested URL finished prebuffering
    Handover,
    /// The active stream ended with looping on
    Loop,
}

impl SwapReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapReason::Handover => "handover",
            SwapReason::Loop => "loop",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub presentation: Presentation,
    pub swapped: Option<SwapReason>,
    /// A new URL was handed to the players this tick
    pub loaded: bool,
}

pub struct HandoverOrchestrator {
    slots: [PlayerSlot; 2],
    preview: PlayerSlot,
    active: SlotId,
    playback: PlaybackState,
    handover: HandoverState,
    preview_ready: bool,
    /// Set after a transport error; cleared by the next load
    suspended: bool,
    loop_deferred: bool,
    blacked_out: bool,
    restore_main: bool,
    latch: ParameterLatch,
    start_ms: i64,
    execute_count: u64,
    volume: u8,
    config: EngineConfig,
    logger: StreamLogger,
    output: OutputHandle,
    presented: FrameImage,
    registration: Option<(Arc<NodeRegistry>, String)>,
}

impl HandoverOrchestrator {
    pub fn new(
        first: Arc<dyn MediaPlayer>,
        second: Arc<dyn MediaPlayer>,
        preview: Arc<dyn MediaPlayer>,
        config: EngineConfig,
    ) -> Self {
        let volume = config.default_volume.min(100);
        first.set_volume(volume);
        second.set_volume(volume);
        preview.set_volume(0);

        Self {
            slots: [PlayerSlot::new(first), PlayerSlot::new(second)],
            preview: PlayerSlot::new(preview),
            active: SlotId::First,
            playback: PlaybackState::None,
            handover: HandoverState::NoHandover,
            preview_ready: false,
            suspended: false,
            loop_deferred: false,
            blacked_out: false,
            restore_main: false,
            latch: ParameterLatch::new(),
            start_ms: 0,
            execute_count: 0,
            volume,
            config,
            logger: StreamLogger::new(),
            output: OutputHandle::new(),
            presented: FrameImage::default(),
            registration: None,
        }
    }

    pub fn with_logger(mut self, logger: StreamLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Advance the orchestrator by one host tick
    pub fn tick(&mut self, params: &Parameters) -> Result<TickReport, HandoverError> {
        self.execute_count += 1;
        self.latch.update(params);
        let req = self.latch.current().clone();

        for slot in self.slots.iter_mut() {
            slot.refresh();
        }
        self.preview.refresh();

        self.handle_metadata(&req)?;

        if let Some(start_sec) = self.latch.take_start() {
            self.apply_start_time(start_sec);
        }

        self.update_preview(&req);

        let active_url = self.slot(self.active).url().to_string();
        let spare_url = self.slot(self.active.other()).url().to_string();

        if req.url != active_url && req.url != spare_url {
            self.load(&req.url);
            let presentation = if req.url.is_empty() || req.blackout {
                self.black_out();
                Presentation::Black
            } else {
                Presentation::Hold
            };
            self.sync_presenting();
            return Ok(TickReport {
                presentation,
                swapped: None,
                loaded: true,
            });
        }

        // Requested URL is back to what is playing; the spare holds something else
        if req.url == active_url && spare_url != active_url && !active_url.is_empty() {
            self.standby(&active_url);
        }

        let mut swapped = None;
        if !self.preview_ready
            && self.handover == HandoverState::Ready
            && (req.seamless || self.latch.cue_pending())
            && spare_url == req.url
            && req.url != active_url
        {
            self.perform_swap(SwapReason::Handover)?;
            self.latch.consume_cue();
            swapped = Some(SwapReason::Handover);
        }

        self.apply_transport(&req);

        if let Some(reason) = self.check_terminal(&req)? {
            swapped = Some(reason);
        }

        let presentation = self.present(&req);
        self.sync_presenting();

        Ok(TickReport {
            presentation,
            swapped,
            loaded: false,
        })
    }

    fn slot(&self, id: SlotId) -> &PlayerSlot {
        &self.slots[id.index()]
    }

    fn role(&self, id: SlotId) -> &'static str {
        if id == self.active {
            "Active"
        } else {
            "Handover"
        }
    }

    fn handle_metadata(&mut self, req: &Parameters) -> Result<(), HandoverError> {
        let active = self.active;
        let spare = active.other();

        let slot = &mut self.slots[active.index()];
        if slot.status.video_ready && !slot.metadata_seen {
            slot.metadata_seen = true;
            let (width, height) = (slot.status.width, slot.status.height);
            debug!("Active stream '{}' reports {}x{}", slot.status.url, width, height);
            if self.playback == PlaybackState::None {
                self.init_frame(width, height)?;
                self.playback = PlaybackState::ReadyToRun;
            }
        }
        self.issue_start_seek(active);

        // Hold the spare on its first frame
        let slot = &mut self.slots[spare.index()];
        if slot.status.video_ready && !slot.metadata_seen {
            slot.metadata_seen = true;
            slot.set_paused(true);
        }
        let adjusted = self.issue_start_seek(spare);

        if self.handover == HandoverState::NoHandover {
            let active_url = self.slots[active.index()].url();
            let spare_url = self.slots[spare.index()].url();
            if !spare_url.is_empty() && spare_url == active_url {
                self.handover = HandoverState::Initiated;
                self.logger.log_handover_initiated(spare_url);
            }
        }

        if self.handover == HandoverState::Initiated {
            let slot = &self.slots[spare.index()];
            if slot.metadata_seen
                && !slot.seek_pending
                && !adjusted
                && slot.status.buffer_level >= self.config.handover_ready_threshold
            {
                self.handover = HandoverState::Ready;
                self.logger.log_handover_ready(slot.url(), slot.status.buffer_level);
            }
        }

        if req.preview_enabled
            && !self.preview_ready
            && self.preview.status.video_ready
            && !self.preview.url().is_empty()
        {
            let (width, height) = (self.preview.status.width, self.preview.status.height);
            {
                let mut state = self.output.lock();
                if !state.preview.has_geometry(width, height) {
                    state.preview = FrameImage::allocate(width, height)?;
                }
                state.preview_updated = false;
            }
            self.preview_ready = true;
            self.slots[active.index()].set_paused(true);
            if self.playback == PlaybackState::Running {
                self.playback = PlaybackState::ReadyToRun;
            }
            self.logger.log_event(
                StreamEventType::PreviewShown,
                format!("Showing preview '{}'", self.preview.url()),
                None,
            );
        }

        Ok(())
    }

    /// Fire a deferred start-time seek once the slot's duration is known.
    /// Returns true when a seek was issued.
    fn issue_start_seek(&mut self, id: SlotId) -> bool {
        let role = self.role(id);
        let start_ms = self.start_ms;
        let slot = &mut self.slots[id.index()];
        if !slot.metadata_seen || !slot.seek_pending {
            return false;
        }
        slot.seek_pending = false;

        let duration_ms = slot.status.total_time_ms;
        if start_ms < duration_ms {
            slot.player.seek_absolute(start_ms);
            self.logger.log_start_seek(role, start_ms);
            true
        } else {
            self.logger
                .log_start_seek_dropped(role, &PlaybackError::SeekOutOfRange { start_ms, duration_ms });
            false
        }
    }

    fn apply_start_time(&mut self, start_sec: f64) {
        self.start_ms = (start_sec * 1000.0).round() as i64;
        let start_ms = self.start_ms;

        let active = &mut self.slots[self.active.index()];
        active.seek_pending = start_ms > 0
            && (start_ms > active.status.current_time_ms || !active.metadata_seen);

        let spare = &mut self.slots[self.active.other().index()];
        if !spare.url().is_empty() {
            spare.seek_pending = true;
            if self.handover == HandoverState::Ready {
                self.handover = HandoverState::Initiated;
            }
        }
    }

    fn update_preview(&mut self, req: &Parameters) {
        if req.preview_url != self.preview.url() {
            if self.preview_ready {
                self.hide_preview();
            }
            if req.preview_url.is_empty() {
                self.preview.halt();
            } else {
                let sinks = self.output.preview_sinks();
                self.preview.load(&req.preview_url, sinks);
            }
            return;
        }

        if !req.preview_enabled {
            if self.preview_ready {
                self.hide_preview();
            }
        } else if !self.preview_ready {
            if matches!(self.preview.status.state, PlayerState::Paused | PlayerState::Ended) {
                self.preview.player.seek(0.0);
                self.preview.player.resume();
                self.preview.status.state = PlayerState::Playing;
            }
        } else if self.preview.status.state == PlayerState::Playing && self.output.lock().preview_updated {
            // One frame is enough
            self.preview.set_paused(true);
        }
    }

    fn hide_preview(&mut self) {
        self.preview_ready = false;
        self.restore_main = true;
        self.logger.log_event(
            StreamEventType::PreviewHidden,
            format!("Hiding preview '{}'", self.preview.url()),
            None,
        );
    }

    fn load(&mut self, url: &str) {
        self.suspended = false;
        self.loop_deferred = false;

        if url.is_empty() {
            self.logger.log_load_requested(url, false);
            for slot in self.slots.iter_mut() {
                slot.halt();
            }
            self.playback = PlaybackState::None;
            self.handover = HandoverState::NoHandover;
            let mut state = self.output.lock();
            state.frame.fill_black();
            state.frame_updated = false;
            return;
        }

        let seek_pending = self.start_ms > 0;
        if self.playback == PlaybackState::Running {
            self.logger.log_load_requested(url, false);
            let spare = self.active.other();
            let sinks = self.output.sinks_for(spare);
            let slot = &mut self.slots[spare.index()];
            slot.load(url, sinks);
            slot.seek_pending = seek_pending;
        } else {
            self.logger.log_load_requested(url, true);
            self.playback = PlaybackState::None;
            for id in [SlotId::First, SlotId::Second] {
                let sinks = self.output.sinks_for(id);
                let slot = &mut self.slots[id.index()];
                slot.load(url, sinks);
                slot.seek_pending = seek_pending;
            }
        }
        self.handover = HandoverState::Initiated;
        self.logger.log_handover_initiated(url);
    }

    /// Re-prebuffer `url` on the spare slot
    fn standby(&mut self, url: &str) {
        let spare = self.active.other();
        let sinks = self.output.sinks_for(spare);
        let slot = &mut self.slots[spare.index()];
        slot.load(url, sinks);
        slot.seek_pending = self.start_ms > 0;
        self.handover = HandoverState::Initiated;
        self.logger.log_handover_initiated(url);
    }

    fn perform_swap(&mut self, reason: SwapReason) -> Result<(), HandoverError> {
        let timer = OperationTimer::new(format!("{} swap", reason.as_str()));
        let old = self.active;
        let new = old.other();
        let (width, height) = (self.slot(new).status.width, self.slot(new).status.height);

        {
            let mut state = self.output.lock();
            if !state.frame.has_geometry(width, height) {
                state.frame = FrameImage::allocate(width, height)?;
                state.frame_updated = false;
            }
            state.active = new;
        }
        self.active = new;

        let from_url = self.slot(old).url().to_string();
        let to_url = self.slot(new).url().to_string();

        self.slots[old.index()].halt();
        self.handover = HandoverState::NoHandover;
        self.loop_deferred = false;

        // The freed slot prebuffers the stream now playing so the next loop is ready
        if !to_url.is_empty() {
            let sinks = self.output.sinks_for(old);
            let slot = &mut self.slots[old.index()];
            slot.load(&to_url, sinks);
            slot.seek_pending = self.start_ms > 0;
        }

        let took = timer.finish_with_threshold(Duration::from_millis(self.config.swap_warn_ms));
        self.logger.log_swap(&from_url, &to_url, reason.as_str(), took);
        Ok(())
    }

    fn apply_transport(&mut self, req: &Parameters) {
        if self.playback == PlaybackState::None || self.preview_ready || self.suspended {
            return;
        }

        let active = self.active.index();
        self.slots[active].set_paused(req.paused);
        if let Some(position) = self.latch.take_seek() {
            self.slots[active].player.seek(position);
        }
        if let Some(rate) = self.latch.take_speed() {
            for slot in &self.slots {
                slot.player.set_playback_speed(rate);
            }
        }

        self.playback = if req.paused {
            PlaybackState::ReadyToRun
        } else {
            PlaybackState::Running
        };
    }

    fn check_terminal(&mut self, req: &Parameters) -> Result<Option<SwapReason>, HandoverError> {
        if self.preview_ready || self.suspended {
            return Ok(None);
        }

        let state = self.slot(self.active).status.state;
        if self.playback == PlaybackState::None {
            // Failed before the stream opened; nothing to present
            if state == PlayerState::Error {
                self.suspend_on_error();
            }
            return Ok(None);
        }

        match state {
            PlayerState::Error => {
                self.suspend_on_error();
                self.playback = PlaybackState::ReadyToRun;
            }
            PlayerState::Ended if self.playback == PlaybackState::Running => {
                if !req.looping {
                    self.playback = PlaybackState::ReadyToRun;
                    return Ok(None);
                }

                let url = self.slot(self.active).url().to_string();
                let spare_matches = self.slot(self.active.other()).url() == url;
                if self.handover == HandoverState::Ready && spare_matches {
                    self.perform_swap(SwapReason::Loop)?;
                    self.slots[self.active.index()].set_paused(req.paused);
                    return Ok(Some(SwapReason::Loop));
                }

                if !self.loop_deferred {
                    self.loop_deferred = true;
                    self.logger.log_event(
                        StreamEventType::LoopSwapDeferred,
                        format!("'{}' ended before its loop copy was ready", url),
                        None,
                    );
                }
            }
            _ => {}
        }
        Ok(None)
    }

    /// Log the active slot's transport error and stop per-tick work until the next load
    fn suspend_on_error(&mut self) {
        let active = self.slot(self.active);
        let error = PlaybackError::Transport {
            url: active.url().to_string(),
            message: active
                .status
                .error
                .clone()
                .unwrap_or_else(|| "unknown error".to_string()),
        };
        self.logger.log_playback_error(&error);
        self.suspended = true;
    }

    fn present(&mut self, req: &Parameters) -> Presentation {
        if req.blackout {
            self.black_out();
            return Presentation::Black;
        }

        let restore = std::mem::take(&mut self.restore_main) | std::mem::take(&mut self.blacked_out);
        let mut state = self.output.lock();

        if self.preview_ready {
            if state.preview_updated {
                state.preview_updated = false;
                self.presented.clone_from(&state.preview);
                return Presentation::Preview;
            }
            return Presentation::Hold;
        }

        if state.frame_updated || (restore && !state.frame.data.is_empty()) {
            state.frame_updated = false;
            self.presented.clone_from(&state.frame);
            return Presentation::Frame;
        }
        Presentation::Hold
    }

    fn black_out(&mut self) {
        self.presented.fill_black();
        if !self.blacked_out {
            self.blacked_out = true;
            self.logger
                .log_event(StreamEventType::BlackFrame, "Presenting black frame".to_string(), None);
        }
    }

    fn init_frame(&mut self, width: u32, height: u32) -> Result<(), HandoverError> {
        let mut state = self.output.lock();
        if !state.frame.has_geometry(width, height) {
            state.frame = FrameImage::allocate(width, height)?;
            info!("Allocated {}x{} output frame", width, height);
        }
        state.frame_updated = false;
        Ok(())
    }

    fn sync_presenting(&self) {
        self.output.lock().presenting =
            self.playback == PlaybackState::Running && !self.suspended && !self.preview_ready;
    }

    /// Volume of the two main slots; the preview stays muted
    pub fn set_volume(&mut self, level: u8) {
        self.volume = level.min(100);
        for slot in &self.slots {
            slot.player.set_volume(self.volume);
        }
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// The host should keep ticking even without new frames
    pub fn needs_continuous_ticks(&self) -> bool {
        if self.suspended {
            return false;
        }
        self.playback == PlaybackState::Running
            || self.handover == HandoverState::Initiated
            || (self.latch.current().preview_enabled && !self.preview_ready)
    }

    /// Publish this orchestrator's output under `path`
    pub fn publish(&mut self, registry: Arc<NodeRegistry>, path: &str) -> Result<(), RegistryError> {
        registry.register(path, self.output.clone())?;
        if let Some((previous, _)) = self.registration.take() {
            if !Arc::ptr_eq(&previous, &registry) {
                previous.unregister(&self.output);
            }
        }
        self.registration = Some((registry, path.to_string()));
        Ok(())
    }

    pub fn published_path(&self) -> Option<&str> {
        self.registration.as_ref().map(|(_, path)| path.as_str())
    }

    pub fn output_handle(&self) -> OutputHandle {
        self.output.clone()
    }

    /// The image most recently handed to the host
    pub fn presented(&self) -> &FrameImage {
        &self.presented
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback
    }

    pub fn handover_state(&self) -> HandoverState {
        self.handover
    }

    pub fn active_slot(&self) -> SlotId {
        self.active
    }

    pub fn active_status(&self) -> &PlayerStatus {
        &self.slot(self.active).status
    }

    pub fn handover_status(&self) -> &PlayerStatus {
        &self.slot(self.active.other()).status
    }

    pub fn preview_shown(&self) -> bool {
        self.preview_ready
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn execute_count(&self) -> u64 {
        self.execute_count
    }

    pub fn logger(&self) -> &StreamLogger {
        &self.logger
    }

    pub fn diagnostics(&self) -> Diagnostics {
        let req = self.latch.current();
        let active = &self.slot(self.active).status;
        let spare = &self.slot(self.active.other()).status;

        Diagnostics {
            execute_count: self.execute_count,
            is_looping: req.looping,
            is_paused: req.paused,
            duration: active.total_time_ms as f64 / 1000.0,
            playback_progress: active.progress(),
            buffering_progress: active.buffer_level as f64,
            video_width: active.width,
            video_height: active.height,
            handover: spare.buffer_level as f64,
            switch_on_cue: !req.seamless,
            switch_cue: self.latch.cue_pending(),
            playback_speed: req.playback_speed,
            start_time: req.start_time_sec,
            end_time: req.end_time_sec,
            blackout: req.blackout,
            preview_on: req.preview_enabled,
            framerate: active.fps,
            current_time: active.current_time_ms as f64 / 1000.0,
            url: active.url.clone(),
            player_state: active.state,
            playback_state: self.playback,
            handover_state: self.handover,
            preview_url: self.preview.status.url.clone(),
            warning: active.warning.clone(),
            error: active.error.clone(),
            info: active.info.clone(),
        }
    }
}

impl Drop for HandoverOrchestrator {
    fn drop(&mut self) {
        if let Some((registry, _)) = self.registration.take() {
            registry.unregister(&self.output);
        }
        for slot in &self.slots {
            slot.player.stop();
        }
        self.preview.player.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{PlayerCall, SimulatedPlayer};

    struct Rig {
        first: SimulatedPlayer,
        second: SimulatedPlayer,
        preview: SimulatedPlayer,
        orchestrator: HandoverOrchestrator,
    }

    fn rig() -> Rig {
        let first = SimulatedPlayer::new("first");
        let second = SimulatedPlayer::new("second");
        let preview = SimulatedPlayer::new("preview");
        let orchestrator = HandoverOrchestrator::new(
            Arc::new(first.clone()),
            Arc::new(second.clone()),
            Arc::new(preview.clone()),
            EngineConfig::default(),
        );
        Rig {
            first,
            second,
            preview,
            orchestrator,
        }
    }

    #[test]
    fn test_new_sets_volumes() {
        let rig = rig();
        assert_eq!(rig.first.volume(), 100);
        assert_eq!(rig.second.volume(), 100);
        assert_eq!(rig.preview.volume(), 0);
        assert_eq!(rig.orchestrator.playback_state(), PlaybackState::None);
        assert_eq!(rig.orchestrator.handover_state(), HandoverState::NoHandover);
    }

    #[test]
    fn test_first_url_starts_both_slots() {
        let mut rig = rig();
        let report = rig.orchestrator.tick(&Parameters::with_url("a.mp4")).unwrap();

        assert!(report.loaded);
        assert_eq!(rig.first.status().url, "a.mp4");
        assert_eq!(rig.second.status().url, "a.mp4");
        assert_eq!(rig.orchestrator.playback_state(), PlaybackState::None);
        assert_eq!(rig.orchestrator.handover_state(), HandoverState::Initiated);
    }

    #[test]
    fn test_metadata_moves_to_ready_to_run_then_running() {
        let mut rig = rig();
        let params = Parameters::with_url("a.mp4");
        rig.orchestrator.tick(&params).unwrap();

        rig.first.deliver_metadata(4, 2, 5000);
        rig.second.deliver_metadata(4, 2, 5000);
        rig.orchestrator.tick(&params).unwrap();

        assert_eq!(rig.orchestrator.playback_state(), PlaybackState::Running);
        assert_eq!(rig.second.status().state, PlayerState::Paused);
        assert_eq!(rig.orchestrator.output_handle().lock().frame.data.len(), 32);
    }

    #[test]
    fn test_paused_parameter_keeps_ready_to_run() {
        let mut rig = rig();
        let mut params = Parameters::with_url("a.mp4");
        params.paused = true;
        rig.orchestrator.tick(&params).unwrap();
        rig.first.deliver_metadata(4, 2, 5000);
        rig.orchestrator.tick(&params).unwrap();

        assert_eq!(rig.orchestrator.playback_state(), PlaybackState::ReadyToRun);
        assert_eq!(rig.first.status().state, PlayerState::Paused);
    }

    #[test]
    fn test_empty_url_stops_everything() {
        let mut rig = rig();
        rig.orchestrator.tick(&Parameters::with_url("a.mp4")).unwrap();
        let report = rig.orchestrator.tick(&Parameters::default()).unwrap();

        assert_eq!(report.presentation, Presentation::Black);
        assert_eq!(rig.first.status().state, PlayerState::Stopped);
        assert_eq!(rig.second.status().state, PlayerState::Stopped);
        assert_eq!(rig.orchestrator.handover_state(), HandoverState::NoHandover);
    }

    #[test]
    fn test_speed_change_applies_to_both_slots() {
        let mut rig = rig();
        let mut params = Parameters::with_url("a.mp4");
        rig.orchestrator.tick(&params).unwrap();
        rig.first.deliver_metadata(4, 2, 5000);
        rig.orchestrator.tick(&params).unwrap();

        params.playback_speed = 1.5;
        rig.orchestrator.tick(&params).unwrap();
        assert_eq!(rig.first.speed(), 1.5);
        assert_eq!(rig.second.speed(), 1.5);

        rig.first.clear_calls();
        rig.orchestrator.tick(&params).unwrap();
        assert!(!rig.first.calls().contains(&PlayerCall::SetSpeed(1.5)));
    }

    #[test]
    fn test_blackout_presents_black() {
        let mut rig = rig();
        let mut params = Parameters::with_url("a.mp4");
        rig.orchestrator.tick(&params).unwrap();
        rig.first.deliver_metadata(1, 1, 5000);
        rig.orchestrator.tick(&params).unwrap();
        rig.first.emit_frame(&[5, 5, 5, 5]);
        assert_eq!(rig.orchestrator.tick(&params).unwrap().presentation, Presentation::Frame);
        assert_eq!(rig.orchestrator.presented().data, vec![5, 5, 5, 5]);

        params.blackout = true;
        assert_eq!(rig.orchestrator.tick(&params).unwrap().presentation, Presentation::Black);
        assert!(rig.orchestrator.presented().is_black());

        params.blackout = false;
        assert_eq!(rig.orchestrator.tick(&params).unwrap().presentation, Presentation::Frame);
        assert_eq!(rig.orchestrator.presented().data, vec![5, 5, 5, 5]);
    }

    #[test]
    fn test_set_volume_skips_preview() {
        let mut rig = rig();
        rig.orchestrator.set_volume(150);
        assert_eq!(rig.orchestrator.volume(), 100);
        rig.orchestrator.set_volume(40);
        assert_eq!(rig.first.volume(), 40);
        assert_eq!(rig.second.volume(), 40);
        assert_eq!(rig.preview.volume(), 0);
    }

    #[test]
    fn test_needs_continuous_ticks() {
        let mut rig = rig();
        assert!(!rig.orchestrator.needs_continuous_ticks());
        rig.orchestrator.tick(&Parameters::with_url("a.mp4")).unwrap();
        assert!(rig.orchestrator.needs_continuous_ticks());
    }

    #[test]
    fn test_publish_and_drop_unregisters() {
        let registry = Arc::new(NodeRegistry::new());
        let mut rig = rig();
        rig.orchestrator.publish(registry.clone(), "/project1/player1").unwrap();
        assert_eq!(rig.orchestrator.published_path(), Some("/project1/player1"));
        assert!(registry.lookup("/project1/player1").is_some());

        drop(rig.orchestrator);
        assert!(registry.is_empty());
        assert_eq!(rig.first.calls().last(), Some(&PlayerCall::Stop));
    }
}
