//! Queue advancement state machine
//!
//! Tracks which deck holds which queue entry, which deck is active, and the
//! auto-increment guard. The table is explicit: the inactive deck is always
//! seated on `queue.successor(current)`, and a finished deck is re-targeted
//! to the successor of the entry the other deck holds.
//!
//! ```text
//!   deck 1: A (active, V)      deck 2: B (0)
//!         -- fade starts B, volumes ramp --
//!   deck 1 completes
//!   deck 1: C (0)              deck 2: B (active, V)
//! ```

use crate::error::InvariantViolation;
use crate::queue::PlayQueue;
use crate::types::{DeckId, DeckStatus, RepeatMode};

const VOLUME_EPSILON: f32 = 1e-4;

/// Per-deck row of the table
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeckSlot {
    /// Play-order index of the loaded entry
    pub index: Option<usize>,

    /// Current volume in [0, V]
    pub volume: f32,

    pub status: DeckStatus,

    /// Deck is taking part in a running crossfade
    pub fading: bool,
}

/// Outcome of a natural completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Duplicate or stale event; nothing changed
    Ignored,

    /// Inactive deck finished first; replayed once it becomes active
    Deferred,

    /// Nothing left to play; halt both decks without touching the pointer
    Terminal,

    /// Repeat one: the finished deck plays its entry again
    Replayed {
        /// Deck to reload and restart
        deck: DeckId,
    },

    /// The queue moved on
    Advanced {
        /// Deck that is active now
        active: DeckId,

        /// Whether the logical pointer moved during this completion
        advanced: bool,

        /// Whether the active deck flipped
        flipped: bool,

        /// New index for the finished deck after a flip
        retarget: Option<usize>,
    },
}

/// Explicit deck state table
#[derive(Debug, Clone, PartialEq)]
pub struct DeckTable {
    slots: [DeckSlot; 2],
    active: DeckId,
    auto_incremented: bool,
}

impl DeckTable {
    pub fn new() -> Self {
        Self {
            slots: [DeckSlot::default(); 2],
            active: DeckId::One,
            auto_incremented: false,
        }
    }

    pub fn active(&self) -> DeckId {
        self.active
    }

    pub fn inactive(&self) -> DeckId {
        self.active.other()
    }

    pub fn slot(&self, deck: DeckId) -> &DeckSlot {
        &self.slots[deck.slot()]
    }

    pub(crate) fn slot_mut(&mut self, deck: DeckId) -> &mut DeckSlot {
        &mut self.slots[deck.slot()]
    }

    /// Whether a crossfade is running
    pub fn is_fading(&self) -> bool {
        self.slots.iter().any(|s| s.fading)
    }

    /// Auto-increment guard
    pub fn auto_incremented(&self) -> bool {
        self.auto_incremented
    }

    /// Seat both decks around the queue's current entry
    ///
    /// The active deck keeps its identity. Its slot takes the current entry at
    /// master volume, the other slot takes the successor at zero. Fades and
    /// the guard are cleared. Statuses become `Loading` (or `Idle` when a deck
    /// has nothing to hold).
    pub fn seat(&mut self, queue: &PlayQueue) {
        let current = (!queue.is_empty()).then(|| queue.current_index());
        let next = current.and_then(|c| queue.successor(c));
        let volume = queue.volume();

        *self.slot_mut(self.active) = DeckSlot {
            index: current,
            volume,
            status: if current.is_some() {
                DeckStatus::Loading
            } else {
                DeckStatus::Idle
            },
            fading: false,
        };
        *self.slot_mut(self.active.other()) = DeckSlot {
            index: next,
            volume: 0.0,
            status: if next.is_some() {
                DeckStatus::Loading
            } else {
                DeckStatus::Idle
            },
            fading: false,
        };
        self.auto_incremented = false;
    }

    /// Consume a natural completion of `finished`
    ///
    /// Reads the latest queue state; the caller applies the media side effects.
    pub fn complete(&mut self, finished: DeckId, queue: &mut PlayQueue) -> Completion {
        if !matches!(
            self.slot(finished).status,
            DeckStatus::Playing | DeckStatus::Ended
        ) {
            return Completion::Ignored;
        }

        if finished != self.active {
            self.slot_mut(finished).status = DeckStatus::Ended;
            return Completion::Deferred;
        }

        self.slot_mut(finished).status = DeckStatus::Ended;

        let other = finished.other();
        let finished_index = self.slot(finished).index;
        let other_index = self.slot(other).index;

        // Repeat one loops in place unless a fade already handed off
        if queue.repeat() == RepeatMode::One && !self.slot(other).fading {
            let volume = queue.volume();
            let slot = self.slot_mut(finished);
            slot.status = DeckStatus::Loading;
            slot.volume = volume;
            slot.fading = false;
            self.auto_incremented = false;
            return Completion::Replayed { deck: finished };
        }

        let other_is_ahead = matches!((finished_index, other_index), (Some(f), Some(o)) if o > f);
        if other_index.is_none() || (queue.repeat() == RepeatMode::Off && !other_is_ahead) {
            return Completion::Terminal;
        }

        let mut advanced = false;
        if !self.auto_incremented {
            if let Some(index) = other_index {
                advanced = queue.advance_to(index);
            }
            self.auto_incremented = true;
        }

        if queue.len() > 1 || queue.repeat() == RepeatMode::All {
            let retarget = other_index.and_then(|o| queue.successor(o));
            let volume = queue.volume();

            self.active = other;
            *self.slot_mut(finished) = DeckSlot {
                index: retarget,
                volume: 0.0,
                status: if retarget.is_some() {
                    DeckStatus::Loading
                } else {
                    DeckStatus::Idle
                },
                fading: false,
            };
            let incoming = self.slot_mut(other);
            incoming.volume = volume;
            incoming.fading = false;
            self.auto_incremented = false;

            return Completion::Advanced {
                active: other,
                advanced,
                flipped: true,
                retarget,
            };
        }

        Completion::Advanced {
            active: finished,
            advanced,
            flipped: false,
            retarget: None,
        }
    }

    /// Validate the stable-state invariants against the queue
    pub fn check(&self, queue: &PlayQueue) -> Result<(), InvariantViolation> {
        let master = queue.volume();

        for deck in DeckId::ALL {
            let volume = self.slot(deck).volume;
            if !(-VOLUME_EPSILON..=master + VOLUME_EPSILON).contains(&volume) {
                return Err(InvariantViolation::VolumeOutOfRange {
                    deck,
                    volume,
                    master,
                });
            }
        }

        if queue.is_empty() {
            return Ok(());
        }

        let current = queue.current_index();
        let active = self.slot(self.active);
        if active.index != Some(current) {
            return Err(InvariantViolation::ActiveDeckMismatch {
                deck: self.active,
                loaded: active.index,
                current,
            });
        }

        let inactive = self.slot(self.inactive());
        let expected = queue.successor(current);
        if inactive.index != expected {
            return Err(InvariantViolation::InactiveDeckMismatch {
                deck: self.inactive(),
                loaded: inactive.index,
                expected,
            });
        }

        if !self.is_fading()
            && ((active.volume - master).abs() > VOLUME_EPSILON
                || inactive.volume.abs() > VOLUME_EPSILON)
        {
            return Err(InvariantViolation::VolumeHandoff {
                active: active.volume,
                inactive: inactive.volume,
            });
        }

        Ok(())
    }
}

impl Default for DeckTable {
    fn default() -> Self {
        Self::new()
    }
}
