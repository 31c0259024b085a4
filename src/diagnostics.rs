use serde::Serialize;

use crate::models::{HandoverState, PlaybackState, PlayerState};

/// Per-tick diagnostic snapshot of an orchestrator.
///
/// `channels` gives the numeric outputs under their host-facing names;
/// `rows` gives the textual ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub execute_count: u64,
    pub is_looping: bool,
    pub is_paused: bool,
    /// Seconds
    pub duration: f64,
    pub playback_progress: f64,
    /// Buffer fill of the active slot, 0 to 100
    pub buffering_progress: f64,
    pub video_width: u32,
    pub video_height: u32,
    /// Buffer fill of the handover slot, 0 to 100
    pub handover: f64,
    pub switch_on_cue: bool,
    /// A latched cue is waiting for the handover
    pub switch_cue: bool,
    pub playback_speed: f32,
    pub start_time: f64,
    pub end_time: f64,
    pub blackout: bool,
    pub preview_on: bool,
    pub framerate: f32,
    /// Seconds
    pub current_time: f64,
    pub url: String,
    pub player_state: PlayerState,
    pub playback_state: PlaybackState,
    pub handover_state: HandoverState,
    pub preview_url: String,
    pub warning: Option<String>,
    pub error: Option<String>,
    pub info: Option<String>,
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

impl Diagnostics {
    pub fn channels(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("executeCount", self.execute_count as f64),
            ("isLooping", flag(self.is_looping)),
            ("isPaused", flag(self.is_paused)),
            ("duration", self.duration),
            ("playbackProgress", self.playback_progress),
            ("bufferingProgress", self.buffering_progress),
            ("videoWidth", self.video_width as f64),
            ("videoHeight", self.video_height as f64),
            ("handover", self.handover),
            ("switchOnCue", flag(self.switch_on_cue)),
            ("switchCue", flag(self.switch_cue)),
            ("playbackSpeed", self.playback_speed as f64),
            ("startTime", self.start_time),
            ("endTime", self.end_time),
            ("blackout", flag(self.blackout)),
            ("previewOn", flag(self.preview_on)),
            ("framerate", self.framerate as f64),
            ("currentTime", self.current_time),
        ]
    }

    pub fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("URL", self.url.clone()),
            ("Player state", self.player_state.as_str().to_string()),
            ("Playback state", self.playback_state.as_str().to_string()),
            ("Handover state", self.handover_state.as_str().to_string()),
            ("Preview URL", self.preview_url.clone()),
        ];
        if let Some(warning) = &self.warning {
            rows.push(("Warning", warning.clone()));
        }
        if let Some(error) = &self.error {
            rows.push(("Error", error.clone()));
        }
        if let Some(info) = &self.info {
            rows.push(("Info", info.clone()));
        }
        rows
    }

    pub fn channel(&self, name: &str) -> Option<f64> {
        self.channels()
            .into_iter()
            .find(|(channel, _)| *channel == name)
            .map(|(_, value)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Diagnostics {
        Diagnostics {
            execute_count: 12,
            is_looping: true,
            is_paused: false,
            duration: 10.0,
            playback_progress: 0.5,
            buffering_progress: 100.0,
            video_width: 1920,
            video_height: 1080,
            handover: 90.0,
            switch_on_cue: false,
            switch_cue: false,
            playback_speed: 1.0,
            start_time: 0.0,
            end_time: 0.0,
            blackout: false,
            preview_on: false,
            framerate: 25.0,
            current_time: 5.0,
            url: "a.mp4".to_string(),
            player_state: PlayerState::Playing,
            playback_state: PlaybackState::Running,
            handover_state: HandoverState::Ready,
            preview_url: String::new(),
            warning: None,
            error: Some("decoder hiccup".to_string()),
            info: None,
        }
    }

    #[test]
    fn test_channel_names_and_order() {
        let names: Vec<_> = sample().channels().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names.len(), 18);
        assert_eq!(names[0], "executeCount");
        assert_eq!(names[17], "currentTime");
    }

    #[test]
    fn test_channel_lookup() {
        let diagnostics = sample();
        assert_eq!(diagnostics.channel("isLooping"), Some(1.0));
        assert_eq!(diagnostics.channel("videoWidth"), Some(1920.0));
        assert_eq!(diagnostics.channel("bufferingProgress"), Some(100.0));
        assert_eq!(diagnostics.channel("handover"), Some(90.0));
        assert_eq!(diagnostics.channel("missing"), None);
    }

    #[test]
    fn test_rows_include_messages() {
        let rows = sample().rows();
        assert_eq!(rows[3], ("Handover state", "Ready".to_string()));
        assert_eq!(rows.last(), Some(&("Error", "decoder hiccup".to_string())));
        assert_eq!(rows.len(), 6);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["executeCount"], 12);
        assert_eq!(json["handoverState"], "Ready");
        assert_eq!(json["playerState"], "Playing");
    }
}
