//! Twindeck Song Cache
//!
//! Keeps naturally finished songs on disk so later plays read a local file
//! instead of streaming.
//!
//! # Features
//!
//! - **Background downloads**: `CacheStore::store` returns immediately; the
//!   download runs on a tokio runtime and failures are only logged
//! - **Atomic files**: songs appear in the cache only once fully written
//! - **Lookup**: `CacheStore::resolve_local_path` finds `<id>.mp3`
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use twindeck_cache::SongCache;
//! use twindeck_playback::{PlayerConfig, Supervisor};
//!
//! let config = PlayerConfig::load(None)?;
//! let cache = SongCache::from_config(&config, tokio::runtime::Handle::current())?;
//!
//! let supervisor = Supervisor::new(deck_one, deck_two, config.playback.clone())
//!     .with_cache_store(Arc::new(cache));
//! ```

mod download;
mod error;
mod store;

pub use download::download_to;
pub use error::{CacheError, Result};
pub use store::{sanitize_file_name, SongCache};
