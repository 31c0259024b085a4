use crate::models::Parameters;

/// Turns per-tick parameter snapshots into one-shot requests.
///
/// Seek, speed and start time fire when their value changes and stay pending
/// until taken. The switch cue latches on its rising edge in cued mode, stays
/// pending until a swap consumes it and is cleared whenever seamless mode is on.
#[derive(Debug, Clone, Default)]
pub struct ParameterLatch {
    current: Parameters,
    seek: Option<f32>,
    speed: Option<f32>,
    start: Option<f64>,
    cue_pending: bool,
}

impl ParameterLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, params: &Parameters) {
        let mut next = params.clone();
        next.url = strip_line_breaks(&params.url);
        next.preview_url = strip_line_breaks(&params.preview_url);

        if next.seek_position != self.current.seek_position {
            self.seek = Some(next.seek_position);
        }
        if next.playback_speed != self.current.playback_speed {
            self.speed = Some(next.playback_speed);
        }
        if next.start_time_sec != self.current.start_time_sec {
            self.start = Some(next.start_time_sec);
        }

        if next.seamless {
            self.cue_pending = false;
        } else if next.switch_cue && !self.current.switch_cue {
            self.cue_pending = true;
        }

        self.current = next;
    }

    /// Latest sanitized snapshot
    pub fn current(&self) -> &Parameters {
        &self.current
    }

    pub fn take_seek(&mut self) -> Option<f32> {
        self.seek.take()
    }

    pub fn take_speed(&mut self) -> Option<f32> {
        self.speed.take()
    }

    pub fn take_start(&mut self) -> Option<f64> {
        self.start.take()
    }

    pub fn cue_pending(&self) -> bool {
        self.cue_pending
    }

    pub fn consume_cue(&mut self) {
        self.cue_pending = false;
    }
}

fn strip_line_breaks(url: &str) -> String {
    url.chars().filter(|c| *c != '\r' && *c != '\n').collect()
}
