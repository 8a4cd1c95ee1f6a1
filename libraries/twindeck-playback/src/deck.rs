//! Media deck abstraction
//!
//! A deck is one audio player the host provides (a decoder + output, an
//! embedded web audio element, ...). The supervisor drives two of them.
//! Decks report back through [`DeckEvent`]s, either by calling
//! `Supervisor::dispatch` directly or through a [`DeckEmitter`] when the
//! deck lives on another thread.

use crate::error::Result;
use crate::sampler::ProgressSample;
use crate::types::{DeckId, DeckSource};
use crossbeam_channel::{Receiver, Sender};

/// Platform-provided audio player
pub trait MediaDeck: Send {
    /// Point the deck at new media; does not start playback
    fn load(&mut self, source: &DeckSource) -> Result<()>;

    /// Start or resume playback
    fn play(&mut self) -> Result<()>;

    /// Pause playback, keeping the position
    fn pause(&mut self);

    /// Set output volume in [0, 1]
    fn set_volume(&mut self, volume: f32);

    /// Release the current media
    fn unload(&mut self) {
        self.pause();
    }
}

/// Something a deck reports
#[derive(Debug, Clone, PartialEq)]
pub enum DeckEvent {
    /// Periodic position report (~150ms while playing)
    Progress(ProgressSample),

    /// Media reached end-of-stream
    Complete,

    /// Media failed to load or play
    Error(String),
}

pub(crate) type DeckMessage = (DeckId, DeckEvent);

/// Channel pair carrying deck events to the supervisor
pub(crate) struct DeckBus {
    tx: Sender<DeckMessage>,
    rx: Receiver<DeckMessage>,
}

impl DeckBus {
    pub(crate) fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx }
    }

    pub(crate) fn emitter(&self, deck: DeckId) -> DeckEmitter {
        DeckEmitter {
            deck,
            tx: self.tx.clone(),
        }
    }

    pub(crate) fn pending(&self) -> impl Iterator<Item = DeckMessage> + '_ {
        self.rx.try_iter()
    }
}

/// Sending half handed to a deck implementation
///
/// Events are queued and applied in order on the next `Supervisor::pump`.
/// Sends after the supervisor is dropped are discarded.
#[derive(Debug, Clone)]
pub struct DeckEmitter {
    deck: DeckId,
    tx: Sender<DeckMessage>,
}

impl DeckEmitter {
    pub fn deck(&self) -> DeckId {
        self.deck
    }

    pub fn progress(&self, sample: ProgressSample) {
        self.send(DeckEvent::Progress(sample));
    }

    pub fn complete(&self) {
        self.send(DeckEvent::Complete);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(DeckEvent::Error(message.into()));
    }

    pub fn send(&self, event: DeckEvent) {
        if self.tx.send((self.deck, event)).is_err() {
            tracing::debug!(deck = %self.deck, "Supervisor gone, dropping deck event");
        }
    }
}
