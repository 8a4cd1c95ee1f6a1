//! Playback Events
//!
//! Event-based communication for UI synchronization. The supervisor queues
//! events as it handles commands and deck reports; the host drains them with
//! `Supervisor::drain_events`.
//! Events are emitted at key points:
//! - Transport changes (play/pause/stop)
//! - Queue advancement (deck flip or user skip)
//! - Crossfade start
//! - Position updates from the active deck

use crate::sampler::Progress;
use crate::types::{DeckId, PlaybackState};
use serde::{Deserialize, Serialize};

/// Events emitted by the playback system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Transport state changed
    StateChanged {
        /// The new playback state
        state: PlaybackState,
    },

    /// The queue's current entry changed
    TrackChanged {
        /// Play-order index of the new current entry
        index: usize,
        /// ID of the new current entry
        entry_id: String,
        /// ID of the entry that was current before (if any)
        previous_entry_id: Option<String>,
    },

    /// The inactive deck started for a handoff
    CrossfadeStarted {
        /// Deck fading out
        from: DeckId,
        /// Deck fading in
        to: DeckId,
        /// Entry the incoming deck plays
        entry_id: String,
    },

    /// Now-playing position of the active deck
    PositionUpdate {
        deck: DeckId,
        progress: Progress,
    },

    /// Entry finished playing naturally
    TrackFinished {
        /// ID of the finished entry
        entry_id: String,
    },

    /// A finished entry was handed to the cache store
    CacheRequested {
        entry_id: String,
    },

    /// Playback reached the end of the queue and halted
    QueueEnded,

    /// Master volume changed
    VolumeChanged {
        /// New volume in [0, 1]
        volume: f32,
    },

    /// Queue replaced or reordered
    QueueChanged {
        /// New queue length
        length: usize,
    },

    /// A deck failed to load or play
    Error {
        deck: DeckId,
        message: String,
    },
}

impl PlaybackEvent {
    /// Whether this event reports a failure
    pub fn is_error(&self) -> bool {
        matches!(self, PlaybackEvent::Error { .. })
    }
}
