//! Playback supervisor - core orchestration
//!
//! Owns both decks and wires their reports into the crossfade controller and
//! the advancement table. Every handler reads the latest queue and table state
//! at its top; nothing is captured across calls.

use crate::{
    advance::{Completion, DeckTable},
    cache::{CacheStore, CacheTrigger},
    crossfade::{CrossfadeController, FadeDecision, FadeInput},
    deck::{DeckBus, DeckEmitter, DeckEvent, MediaDeck},
    error::{InvariantViolation, PlaybackError, Result},
    events::PlaybackEvent,
    queue::PlayQueue,
    sampler::{Progress, ProgressSample},
    settings::{PlaybackSettings, SettingsProvider, MAX_FADE_DURATION},
    timer::GraceTimer,
    types::{DeckId, DeckSource, DeckStatus, Entry, PlaybackState, RepeatMode},
};
use std::sync::Arc;
use std::time::Instant;

/// Dual-deck playback supervisor
pub struct Supervisor {
    decks: [Box<dyn MediaDeck>; 2],

    // Set when a deck reported an error; cleared on the next load
    failed: [bool; 2],

    queue: PlayQueue,
    table: DeckTable,
    controller: CrossfadeController,
    cache: CacheTrigger,
    store: Option<Arc<dyn CacheStore>>,

    // Deferred halt after the last entry finished
    grace: GraceTimer,

    // Deck events delivered from other threads
    bus: DeckBus,

    state: PlaybackState,
    position: Option<Progress>,

    // Event queue for UI synchronization
    pending_events: Vec<PlaybackEvent>,
}

impl Supervisor {
    /// Create a supervisor around two host decks
    pub fn new(
        deck_one: Box<dyn MediaDeck>,
        deck_two: Box<dyn MediaDeck>,
        settings: PlaybackSettings,
    ) -> Self {
        let mut supervisor = Self {
            decks: [deck_one, deck_two],
            failed: [false; 2],
            queue: PlayQueue::new(),
            table: DeckTable::new(),
            controller: CrossfadeController::new(0.0, settings.fade_type),
            cache: CacheTrigger::new(settings.cache_songs),
            store: None,
            grace: GraceTimer::new(),
            bus: DeckBus::new(),
            state: PlaybackState::Stopped,
            position: None,
            pending_events: Vec::new(),
        };
        supervisor.apply_settings(&settings);
        supervisor.sync_volumes();
        supervisor
    }

    /// Attach the song cache used for source resolution and caching
    pub fn with_cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    // ===== Queue =====

    /// Replace the queue and seat both decks around `start_index`
    ///
    /// The transport state is kept: the active deck only starts when the
    /// supervisor was already playing.
    pub fn replace_queue(&mut self, entries: Vec<Entry>, start_index: usize) {
        let previous = self.current_entry_id();
        self.queue.replace(entries, start_index);

        tracing::info!(
            length = self.queue.len(),
            index = self.queue.current_index(),
            "Queue replaced"
        );
        self.pending_events.push(PlaybackEvent::QueueChanged {
            length: self.queue.len(),
        });

        self.reseat();
        self.emit_track_changed(previous);

        if self.queue.is_empty() {
            self.set_state(PlaybackState::Stopped);
        }
    }

    /// Jump to a play-order index
    ///
    /// A no-op on an empty queue; an index past the end is an error.
    pub fn skip_to(&mut self, index: usize) -> Result<()> {
        if self.queue.is_empty() {
            tracing::debug!(index, "Queue is empty, nothing to skip to");
            return Ok(());
        }
        let previous = self.current_entry_id();
        self.queue.set_current_index(index)?;

        tracing::debug!(index, "Skipping");
        self.reseat();
        self.emit_track_changed(previous);
        Ok(())
    }

    /// Skip to next entry
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<()> {
        if self.queue.is_empty() {
            tracing::debug!("Queue is empty, nothing to skip to");
            return Ok(());
        }
        match self.queue.next_index() {
            Some(index) => self.skip_to(index),
            None => {
                tracing::debug!("Already at the last entry");
                Ok(())
            }
        }
    }

    /// Skip to previous entry
    pub fn previous(&mut self) -> Result<()> {
        if self.queue.is_empty() {
            tracing::debug!("Queue is empty, nothing to skip to");
            return Ok(());
        }
        match self.queue.previous_index() {
            Some(index) => self.skip_to(index),
            None => {
                tracing::debug!("Already at the first entry");
                Ok(())
            }
        }
    }

    // ===== Playback Control =====

    /// Start or resume playback on the active deck
    pub fn play(&mut self) -> Result<()> {
        if self.queue.is_empty() {
            return Err(PlaybackError::QueueEmpty);
        }
        self.grace.cancel();
        self.set_state(PlaybackState::Playing);

        // Halted at the end of the queue: start the last entry over
        if self.table.slot(self.table.active()).status == DeckStatus::Ended {
            tracing::debug!(index = self.queue.current_index(), "Reloading ended deck");
            self.reseat();
            return Ok(());
        }

        self.start_deck(self.table.active());
        Ok(())
    }

    /// Pause both decks
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.set_state(PlaybackState::Paused);
        }
        self.pause_decks();
    }

    /// Set master volume
    ///
    /// Outside a fade the active deck follows the master volume directly.
    /// During a fade both decks are capped to it and the ramp continues.
    pub fn set_volume(&mut self, volume: f32) {
        self.queue.set_volume(volume);
        let master = self.queue.volume();
        let active = self.table.active();

        if self.table.is_fading() {
            for deck in DeckId::ALL {
                let slot = self.table.slot_mut(deck);
                slot.volume = slot.volume.min(master);
            }
        } else {
            self.table.slot_mut(active).volume = master;
            self.table.slot_mut(active.other()).volume = 0.0;
        }

        self.sync_volumes();
        self.pending_events
            .push(PlaybackEvent::VolumeChanged { volume: master });
    }

    pub fn set_repeat(&mut self, mode: RepeatMode) {
        if self.queue.repeat() == mode {
            return;
        }
        tracing::debug!(?mode, "Repeat mode changed");
        self.queue.set_repeat(mode);
        self.retarget_inactive(false);
    }

    /// Toggle shuffle; the current entry keeps playing
    pub fn set_shuffle(&mut self, shuffle: bool) {
        if !self.queue.set_shuffle(shuffle) {
            return;
        }
        tracing::debug!(
            shuffle,
            index = self.queue.current_index(),
            "Shuffle toggled"
        );

        if !self.queue.is_empty() {
            let active = self.table.active();
            self.table.slot_mut(active).index = Some(self.queue.current_index());
        }
        self.retarget_inactive(true);

        self.pending_events.push(PlaybackEvent::QueueChanged {
            length: self.queue.len(),
        });
    }

    /// Apply new settings; the controller picks them up on its next tick
    pub fn reload_settings(&mut self, provider: &impl SettingsProvider) -> Result<()> {
        let settings = provider.playback_settings();
        settings.validate()?;
        self.apply_settings(&settings);
        Ok(())
    }

    // ===== Deck events =====

    /// Handle one report from a deck
    pub fn dispatch(&mut self, deck: DeckId, event: DeckEvent, now: Instant) {
        self.poll_timers(now);

        match event {
            DeckEvent::Progress(sample) => self.on_progress(deck, &sample),
            DeckEvent::Complete => self.on_complete(deck, now),
            DeckEvent::Error(message) => self.deck_failed(deck, message),
        }
    }

    /// Sender for a deck that reports from another thread
    pub fn emitter(&self, deck: DeckId) -> DeckEmitter {
        self.bus.emitter(deck)
    }

    /// Apply every queued emitter event in arrival order
    ///
    /// Returns the number of events handled.
    pub fn pump(&mut self, now: Instant) -> usize {
        let messages: Vec<_> = self.bus.pending().collect();
        let count = messages.len();

        for (deck, event) in messages {
            self.dispatch(deck, event, now);
        }
        self.poll_timers(now);

        count
    }

    /// Fire the deferred halt once its deadline has passed
    pub fn poll_timers(&mut self, now: Instant) {
        if self.grace.poll(now) {
            self.halt();
        }
    }

    /// Whether a halt is scheduled
    pub fn halt_pending(&self) -> bool {
        self.grace.is_armed()
    }

    // ===== State Queries =====

    pub fn queue(&self) -> &PlayQueue {
        &self.queue
    }

    pub fn deck_table(&self) -> &DeckTable {
        &self.table
    }

    pub fn active_deck(&self) -> DeckId {
        self.table.active()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Last position reported by the active deck
    pub fn position(&self) -> Option<Progress> {
        self.position
    }

    pub fn now_playing(&self) -> Option<&Entry> {
        self.queue.current()
    }

    /// Validate the deck table against the queue
    pub fn check_invariants(&self) -> std::result::Result<(), InvariantViolation> {
        self.table.check(&self.queue)
    }

    // ===== Events =====

    /// Drain all pending events
    ///
    /// Returns all events that have been emitted since the last drain.
    /// Position updates are coalesced, so at most one is pending at a time;
    /// every other event is kept until the host drains.
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Check if there are pending events
    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Internals =====

    fn deck_mut(&mut self, deck: DeckId) -> &mut dyn MediaDeck {
        self.decks[deck.slot()].as_mut()
    }

    fn apply_settings(&mut self, settings: &PlaybackSettings) {
        self.controller.configure(
            settings.fade_duration.min(MAX_FADE_DURATION),
            settings.fade_type,
        );
        self.cache.set_enabled(settings.cache_songs);
        tracing::debug!(
            fade_duration = self.controller.fade_duration(),
            curve = self.controller.curve().display_name(),
            cache = settings.cache_songs,
            "Settings applied"
        );
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            tracing::debug!(from = ?self.state, to = ?state, "Transport state changed");
            self.state = state;
            self.pending_events
                .push(PlaybackEvent::StateChanged { state });
        }
    }

    fn current_entry_id(&self) -> Option<String> {
        self.queue.current().map(|e| e.id.clone())
    }

    fn emit_track_changed(&mut self, previous_entry_id: Option<String>) {
        if let Some(entry) = self.queue.current() {
            self.pending_events.push(PlaybackEvent::TrackChanged {
                index: self.queue.current_index(),
                entry_id: entry.id.clone(),
                previous_entry_id,
            });
        }
    }

    fn sync_volumes(&mut self) {
        for deck in DeckId::ALL {
            let volume = self.table.slot(deck).volume;
            self.deck_mut(deck).set_volume(volume);
        }
    }

    fn pause_decks(&mut self) {
        for deck in DeckId::ALL {
            self.deck_mut(deck).pause();
            let slot = self.table.slot_mut(deck);
            if slot.status == DeckStatus::Playing {
                slot.status = DeckStatus::Paused;
            }
        }
    }

    /// Seat both decks around the current entry and load them
    fn reseat(&mut self) {
        self.grace.cancel();
        self.controller.reset();
        self.position = None;

        for deck in DeckId::ALL {
            self.deck_mut(deck).pause();
        }
        self.table.seat(&self.queue);

        let active = self.table.active();
        self.load_deck(active);
        self.load_deck(active.other());
    }

    /// Point the inactive deck at the successor of the current entry
    fn retarget_inactive(&mut self, force: bool) {
        let expected = (!self.queue.is_empty())
            .then(|| self.queue.current_index())
            .and_then(|current| self.queue.successor(current));
        let inactive = self.table.inactive();

        if !force && self.table.slot(inactive).index == expected {
            return;
        }

        self.cancel_fade();
        self.deck_mut(inactive).pause();

        let slot = self.table.slot_mut(inactive);
        slot.index = expected;
        slot.volume = 0.0;
        slot.fading = false;
        self.load_deck(inactive);
    }

    fn cancel_fade(&mut self) {
        if !self.table.is_fading() {
            return;
        }
        tracing::debug!("Cancelling crossfade");

        let active = self.table.active();
        let inactive = active.other();
        self.deck_mut(inactive).pause();

        let master = self.queue.volume();
        let slot = self.table.slot_mut(inactive);
        if slot.status == DeckStatus::Playing {
            slot.status = DeckStatus::Paused;
        }
        slot.volume = 0.0;
        slot.fading = false;

        let slot = self.table.slot_mut(active);
        slot.volume = master;
        slot.fading = false;

        self.controller.reset();
        self.sync_volumes();
    }

    fn resolve_source(&self, entry: &Entry) -> DeckSource {
        match self
            .store
            .as_ref()
            .and_then(|store| store.resolve_local_path(&entry.id))
        {
            Some(path) => DeckSource::Local(path),
            None => DeckSource::Stream(entry.stream_url.clone()),
        }
    }

    /// Load whatever the table says `deck` holds
    fn load_deck(&mut self, deck: DeckId) {
        let slot = *self.table.slot(deck);
        self.failed[deck.slot()] = false;
        self.deck_mut(deck).set_volume(slot.volume);

        let source = slot
            .index
            .and_then(|index| self.queue.get(index))
            .map(|entry| self.resolve_source(entry));

        let Some(source) = source else {
            self.deck_mut(deck).unload();
            self.table.slot_mut(deck).status = DeckStatus::Idle;
            return;
        };

        tracing::debug!(deck = %deck, index = ?slot.index, source = ?source, "Loading deck");
        if let Err(e) = self.deck_mut(deck).load(&source) {
            self.deck_failed(deck, e.to_string());
            return;
        }
        self.table.slot_mut(deck).status = DeckStatus::Loading;

        if self.may_autoplay(deck) {
            self.start_deck(deck);
        }
    }

    /// Only the active deck holding the current entry may start on load
    fn may_autoplay(&self, deck: DeckId) -> bool {
        self.state == PlaybackState::Playing
            && deck == self.table.active()
            && !self.queue.is_empty()
            && self.table.slot(deck).index == Some(self.queue.current_index())
    }

    /// Start `deck` unless it already runs; returns whether it runs now
    fn start_deck(&mut self, deck: DeckId) -> bool {
        if self.table.slot(deck).status == DeckStatus::Playing {
            return true;
        }

        match self.deck_mut(deck).play() {
            Ok(()) => {
                self.table.slot_mut(deck).status = DeckStatus::Playing;
                true
            }
            Err(e) => {
                self.deck_failed(deck, e.to_string());
                false
            }
        }
    }

    fn deck_failed(&mut self, deck: DeckId, message: String) {
        tracing::warn!(deck = %deck, error = %message, "Deck failed");

        self.failed[deck.slot()] = true;
        self.deck_mut(deck).pause();
        let slot = self.table.slot_mut(deck);
        if slot.status != DeckStatus::Idle {
            slot.status = DeckStatus::Paused;
        }

        self.pending_events
            .push(PlaybackEvent::Error { deck, message });
    }

    fn on_progress(&mut self, deck: DeckId, sample: &ProgressSample) {
        let active = self.table.active();
        if deck != active {
            return;
        }

        let progress = Progress::from_sample(sample);
        self.position = Some(progress);

        // Only the latest position is kept until the host drains
        self.pending_events
            .retain(|event| !matches!(event, PlaybackEvent::PositionUpdate { .. }));
        self.pending_events
            .push(PlaybackEvent::PositionUpdate { deck, progress });

        if self.state != PlaybackState::Playing
            || self.table.slot(active).status != DeckStatus::Playing
        {
            return;
        }

        let inactive = active.other();
        let outgoing = *self.table.slot(active);
        let incoming = *self.table.slot(inactive);
        let input = FadeInput {
            elapsed: sample.elapsed.as_secs_f64(),
            duration: sample.duration.map(|d| d.as_secs_f64()),
            master_volume: self.queue.volume(),
            outgoing_volume: outgoing.volume,
            incoming_volume: incoming.volume,
            incoming_playing: incoming.status == DeckStatus::Playing,
            next_exists: incoming.index.is_some()
                && self.queue.next_exists(self.queue.current_index()),
        };

        match self.controller.tick(&input) {
            FadeDecision::Hold => {}
            FadeDecision::Gapless { incoming } => {
                self.table.slot_mut(inactive).volume = incoming;
                self.begin_handoff(active, inactive);
            }
            FadeDecision::Ramp { outgoing, incoming } => {
                self.table.slot_mut(active).volume = outgoing;
                self.table.slot_mut(inactive).volume = incoming;
                self.begin_handoff(active, inactive);
            }
        }
    }

    fn begin_handoff(&mut self, from: DeckId, to: DeckId) {
        self.table.slot_mut(from).fading = true;
        self.table.slot_mut(to).fading = true;
        self.sync_volumes();

        // An ended deck waits for its completion to be replayed
        let starting = !matches!(
            self.table.slot(to).status,
            DeckStatus::Playing | DeckStatus::Ended
        );
        if !starting || self.failed[to.slot()] || !self.start_deck(to) {
            return;
        }

        if let Some(entry) = self.table.slot(to).index.and_then(|i| self.queue.get(i)) {
            let entry_id = entry.id.clone();
            tracing::debug!(from = %from, to = %to, entry = %entry_id, "Crossfade started");
            self.pending_events
                .push(PlaybackEvent::CrossfadeStarted { from, to, entry_id });
        }
    }

    fn on_complete(&mut self, deck: DeckId, now: Instant) {
        let finished = self
            .table
            .slot(deck)
            .index
            .and_then(|index| self.queue.get(index))
            .cloned();
        let previous = self.current_entry_id();

        let completion = self.table.complete(deck, &mut self.queue);
        tracing::debug!(deck = %deck, ?completion, "Deck completed");

        if matches!(completion, Completion::Ignored | Completion::Deferred) {
            return;
        }
        if let Some(entry) = &finished {
            self.finish_entry(entry);
        }

        match completion {
            Completion::Terminal => {
                tracing::info!(
                    index = self.queue.current_index(),
                    "Last entry finished, halting"
                );
                self.grace.schedule(now);
            }
            Completion::Replayed { deck } => {
                tracing::debug!(deck = %deck, index = self.queue.current_index(), "Repeating entry");
                self.controller.reset();
                self.position = None;
                self.load_deck(deck);
            }
            Completion::Advanced {
                active,
                advanced,
                flipped,
                ..
            } => {
                if flipped {
                    self.controller.reset();
                    self.position = None;
                    self.sync_volumes();
                    self.load_deck(deck);
                }
                if advanced {
                    self.emit_track_changed(previous);
                }

                // The new active deck finished while it was still inactive
                if flipped && self.table.slot(active).status == DeckStatus::Ended {
                    self.on_complete(active, now);
                } else if self.state == PlaybackState::Playing {
                    self.start_deck(active);
                }
            }
            Completion::Ignored | Completion::Deferred => {}
        }
    }

    fn finish_entry(&mut self, entry: &Entry) {
        self.pending_events.push(PlaybackEvent::TrackFinished {
            entry_id: entry.id.clone(),
        });

        if self
            .cache
            .on_natural_completion(entry, self.store.as_deref())
        {
            self.pending_events.push(PlaybackEvent::CacheRequested {
                entry_id: entry.id.clone(),
            });
        }
    }

    fn halt(&mut self) {
        tracing::info!(index = self.queue.current_index(), "Queue ended");

        self.pause_decks();
        let master = self.queue.volume();
        let active = self.table.active();
        for deck in DeckId::ALL {
            let slot = self.table.slot_mut(deck);
            slot.fading = false;
            slot.volume = if deck == active { master } else { 0.0 };
        }
        self.sync_volumes();
        self.controller.reset();

        self.set_state(PlaybackState::Stopped);
        self.pending_events.push(PlaybackEvent::QueueEnded);
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        for deck in DeckId::ALL {
            self.deck_mut(deck).pause();
        }
    }
}
