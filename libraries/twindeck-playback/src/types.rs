//! Core types for playback management

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// A playable queue entry
///
/// Carries the metadata the engine needs plus the resolved streaming URL.
/// Entries are immutable once queued; only their position in the queue moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Server-side song identifier (also names the cache file)
    pub id: String,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name (optional)
    pub album: Option<String>,

    /// Duration as reported by the server, if known
    pub duration: Option<Duration>,

    /// Streaming URL handed to a deck when the entry is not cached
    pub stream_url: String,

    /// Explicit download URL, when the backend exposes one
    pub download_url: Option<String>,
}

impl Entry {
    /// URL used to fetch the full file for caching
    ///
    /// Falls back to the stream URL with its first `stream` segment replaced
    /// by `download` (`/rest/stream.view` becomes `/rest/download.view`).
    pub fn download_url(&self) -> String {
        match &self.download_url {
            Some(url) => url.clone(),
            None => self.stream_url.replacen("stream", "download", 1),
        }
    }

    /// File name the cache stores this entry under
    pub fn cache_file_name(&self) -> String {
        format!("{}.mp3", self.id)
    }
}

/// One of the two playback decks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeckId {
    One,
    Two,
}

impl DeckId {
    /// Both decks, in table order
    pub const ALL: [DeckId; 2] = [DeckId::One, DeckId::Two];

    /// The opposite deck
    pub fn other(self) -> DeckId {
        match self {
            DeckId::One => DeckId::Two,
            DeckId::Two => DeckId::One,
        }
    }

    pub(crate) fn slot(self) -> usize {
        match self {
            DeckId::One => 0,
            DeckId::Two => 1,
        }
    }
}

impl fmt::Display for DeckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeckId::One => write!(f, "1"),
            DeckId::Two => write!(f, "2"),
        }
    }
}

/// Per-deck media status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeckStatus {
    /// Nothing loaded
    #[default]
    Idle,

    /// Source assigned, not started
    Loading,

    /// Media is running
    Playing,

    /// Stopped mid-track (user pause, halt, or deck error)
    Paused,

    /// Reached end-of-stream; the completion has not been consumed yet
    Ended,
}

/// Where a deck reads its media from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeckSource {
    /// Previously cached file
    Local(PathBuf),

    /// Remote streaming URL
    Stream(String),
}

/// Transport state requested by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Nothing playing (initial state, or queue ran out)
    Stopped,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,
}

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RepeatMode {
    /// Stop when queue ends
    #[default]
    Off,

    /// Loop entire queue
    All,

    /// Loop current track only
    One,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(stream_url: &str, download_url: Option<&str>) -> Entry {
        Entry {
            id: "song-1".to_string(),
            title: "Song".to_string(),
            artist: "Artist".to_string(),
            album: None,
            duration: Some(Duration::from_secs(180)),
            stream_url: stream_url.to_string(),
            download_url: download_url.map(str::to_string),
        }
    }

    #[test]
    fn download_url_derived_from_stream() {
        let e = entry("https://music.example.com/rest/stream.view?id=song-1", None);
        assert_eq!(
            e.download_url(),
            "https://music.example.com/rest/download.view?id=song-1"
        );
    }

    #[test]
    fn explicit_download_url_wins() {
        let e = entry(
            "https://jf.example.com/Audio/song-1/universal",
            Some("https://jf.example.com/Items/song-1/Download"),
        );
        assert_eq!(e.download_url(), "https://jf.example.com/Items/song-1/Download");
    }

    #[test]
    fn cache_file_name_uses_id() {
        let e = entry("https://x/rest/stream.view?id=song-1", None);
        assert_eq!(e.cache_file_name(), "song-1.mp3");
    }

    #[test]
    fn deck_other() {
        assert_eq!(DeckId::One.other(), DeckId::Two);
        assert_eq!(DeckId::Two.other(), DeckId::One);
        assert_eq!(DeckId::One.to_string(), "1");
    }
}
