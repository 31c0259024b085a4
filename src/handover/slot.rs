use std::sync::Arc;

use crate::models::{PlayerState, PlayerStatus};
use crate::player::{MediaPlayer, PlayerSinks};

/// Index of one of the two swappable players. Roles move by flipping which
/// id is active; the players themselves never move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotId {
    First,
    Second,
}

impl SlotId {
    pub fn other(self) -> Self {
        match self {
            SlotId::First => SlotId::Second,
            SlotId::Second => SlotId::First,
        }
    }

    pub fn index(self) -> usize {
        match self {
            SlotId::First => 0,
            SlotId::Second => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotId::First => "first",
            SlotId::Second => "second",
        }
    }
}

/// A player plus the per-tick snapshot the orchestrator decides on
pub(crate) struct PlayerSlot {
    pub(crate) player: Arc<dyn MediaPlayer>,
    pub(crate) status: PlayerStatus,
    /// Metadata arrival has been handled for the current URL
    pub(crate) metadata_seen: bool,
    /// A start-time seek waits for this slot's metadata
    pub(crate) seek_pending: bool,
}

impl PlayerSlot {
    pub(crate) fn new(player: Arc<dyn MediaPlayer>) -> Self {
        Self {
            player,
            status: PlayerStatus::default(),
            metadata_seen: false,
            seek_pending: false,
        }
    }

    pub(crate) fn refresh(&mut self) {
        self.status = self.player.status();
    }

    pub(crate) fn url(&self) -> &str {
        &self.status.url
    }

    /// Start `url`. The snapshot is updated to what `play_url` guarantees.
    pub(crate) fn load(&mut self, url: &str, sinks: PlayerSinks) {
        self.player.play_url(url, sinks);
        self.status = PlayerStatus {
            state: PlayerState::Opening,
            url: url.to_string(),
            ..PlayerStatus::default()
        };
        self.metadata_seen = false;
        self.seek_pending = false;
    }

    pub(crate) fn halt(&mut self) {
        self.player.stop();
        self.status = PlayerStatus {
            state: PlayerState::Stopped,
            ..PlayerStatus::default()
        };
        self.metadata_seen = false;
        self.seek_pending = false;
    }

    /// Pause or resume, issuing the call only when the snapshot disagrees
    pub(crate) fn set_paused(&mut self, paused: bool) {
        match (paused, self.status.state) {
            (true, PlayerState::Playing | PlayerState::Buffering | PlayerState::Opening) => {
                self.player.pause(true);
                self.status.state = PlayerState::Paused;
            }
            (false, PlayerState::Paused) => {
                self.player.pause(false);
                self.status.state = PlayerState::Playing;
            }
            _ => {}
        }
    }
}
