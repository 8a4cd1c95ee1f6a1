//! Error types for playback management

use crate::types::DeckId;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Queue is empty
    #[error("Queue is empty")]
    QueueEmpty,

    /// Index out of bounds
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// A media deck rejected a command
    #[error("Deck {deck} failed: {message}")]
    Deck { deck: DeckId, message: String },

    /// A setting is outside its accepted range
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    /// Settings could not be loaded
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// A broken deck-table invariant, reported by `DeckTable::check`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    /// The active deck does not hold the queue's current entry
    #[error("active deck {deck} holds {loaded:?}, current index is {current}")]
    ActiveDeckMismatch {
        deck: DeckId,
        loaded: Option<usize>,
        current: usize,
    },

    /// The inactive deck does not hold the successor of the current entry
    #[error("inactive deck {deck} holds {loaded:?}, expected {expected:?}")]
    InactiveDeckMismatch {
        deck: DeckId,
        loaded: Option<usize>,
        expected: Option<usize>,
    },

    /// A deck volume is outside `[0, master]`
    #[error("deck {deck} volume {volume} outside [0, {master}]")]
    VolumeOutOfRange { deck: DeckId, volume: f32, master: f32 },

    /// Outside a fade, the active deck must sit at master volume and the other at zero
    #[error("volume handoff incomplete: active {active}, inactive {inactive}")]
    VolumeHandoff { active: f32, inactive: f32 },
}
