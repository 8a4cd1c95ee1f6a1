//! Twindeck - Dual-Deck Playback
//!
//! Crossfade and queue advancement for a streaming music client.
//!
//! This crate provides:
//! - Two media decks kept loaded with the current and the next entry
//! - Volume ramps driven by ~150ms progress samples (equal power or linear)
//! - Gapless handoff for short fade lengths
//! - Queue advancement on natural completion, without double advancement
//! - Repeat modes (Off, All, One) and shuffle with a separate play order
//! - Cache requests for naturally finished entries
//!
//! # Architecture
//!
//! `twindeck-playback` does no I/O of its own:
//! - Audio output is provided by the host through [`MediaDeck`]
//! - Song caching is provided through [`CacheStore`] (see `twindeck-cache`)
//! - Time is passed in as [`std::time::Instant`], so hosts and tests own the clock
//!
//! # Example: Basic Playback
//!
//! ```rust
//! use twindeck_playback::{
//!     DeckEvent, DeckId, DeckSource, Entry, MediaDeck, PlaybackSettings, ProgressSample,
//!     Result, Supervisor,
//! };
//! use std::time::{Duration, Instant};
//!
//! struct SilentDeck;
//!
//! impl MediaDeck for SilentDeck {
//!     fn load(&mut self, _source: &DeckSource) -> Result<()> {
//!         Ok(())
//!     }
//!     fn play(&mut self) -> Result<()> {
//!         Ok(())
//!     }
//!     fn pause(&mut self) {}
//!     fn set_volume(&mut self, _volume: f32) {}
//! }
//!
//! let mut supervisor = Supervisor::new(
//!     Box::new(SilentDeck),
//!     Box::new(SilentDeck),
//!     PlaybackSettings::default(),
//! );
//!
//! let entry = Entry {
//!     id: "42".to_string(),
//!     title: "My Song".to_string(),
//!     artist: "Artist Name".to_string(),
//!     album: None,
//!     duration: Some(Duration::from_secs(180)),
//!     stream_url: "https://music.example.com/rest/stream.view?id=42".to_string(),
//!     download_url: None,
//! };
//!
//! supervisor.replace_queue(vec![entry], 0);
//! supervisor.play()?;
//!
//! // Forward deck reports as they arrive
//! let sample = ProgressSample::new(
//!     Duration::from_secs(12),
//!     Some(Duration::from_secs(180)),
//!     Duration::from_secs(180),
//! );
//! supervisor.dispatch(DeckId::One, DeckEvent::Progress(sample), Instant::now());
//!
//! for event in supervisor.drain_events() {
//!     println!("{:?}", event);
//! }
//! # Ok::<(), twindeck_playback::PlaybackError>(())
//! ```

mod advance;
mod cache;
pub mod crossfade;
mod deck;
mod error;
pub mod events;
mod queue;
pub mod sampler;
pub mod settings;
mod shuffle;
mod supervisor;
mod timer;
pub mod types;

// Public exports
pub use advance::{Completion, DeckSlot, DeckTable};
pub use cache::{CacheStore, CacheTrigger};
pub use crossfade::{CrossfadeController, FadeCurve, FadeDecision, FadeInput};
pub use deck::{DeckEmitter, DeckEvent, MediaDeck};
pub use error::{InvariantViolation, PlaybackError, Result};
pub use events::PlaybackEvent;
pub use queue::{PlayQueue, DEFAULT_VOLUME};
pub use sampler::{Progress, ProgressSample, SAMPLE_INTERVAL};
pub use settings::{PlaybackSettings, PlayerConfig, SettingsProvider};
pub use shuffle::shuffled_order;
pub use supervisor::Supervisor;
pub use timer::{GraceTimer, GRACE_DELAY};
pub use types::{DeckId, DeckSource, DeckStatus, Entry, PlaybackState, RepeatMode};
