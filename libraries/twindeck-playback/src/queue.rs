//! Play queue
//!
//! Holds the entries in natural order plus a shuffled order. The current
//! index always points into the *active* order: the shuffled one while
//! shuffle is on, the natural one otherwise.

use crate::error::{PlaybackError, Result};
use crate::shuffle::shuffled_order;
use crate::types::{Entry, RepeatMode};

/// Master volume a fresh queue starts with
pub const DEFAULT_VOLUME: f32 = 0.5;

/// Queue owned by the supervisor
#[derive(Debug, Clone)]
pub struct PlayQueue {
    /// Entries in the order they were queued
    entries: Vec<Entry>,

    /// Shuffled order (empty while shuffle is off)
    shuffled: Vec<Entry>,

    /// Logical "now playing" position in the active order
    current_index: usize,

    repeat: RepeatMode,
    shuffle: bool,

    /// Master volume in [0, 1]
    volume: f32,
}

impl PlayQueue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            shuffled: Vec::new(),
            current_index: 0,
            repeat: RepeatMode::Off,
            shuffle: false,
            volume: DEFAULT_VOLUME,
        }
    }

    /// Replace every entry and start at `start_index` of the natural order
    ///
    /// With shuffle on, the starting entry leads a freshly shuffled order.
    pub fn replace(&mut self, entries: Vec<Entry>, start_index: usize) {
        let start = if start_index < entries.len() { start_index } else { 0 };
        self.entries = entries;

        if self.shuffle {
            self.shuffled = shuffled_order(&self.entries, Some(start));
            self.current_index = 0;
        } else {
            self.shuffled.clear();
            self.current_index = start;
        }
    }

    /// Entries in play order
    pub fn entries(&self) -> &[Entry] {
        if self.shuffle {
            &self.shuffled
        } else {
            &self.entries
        }
    }

    /// Entries in the order they were queued
    pub fn natural_entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Entry at a play-order index
    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries().get(index)
    }

    /// Entry at the current index
    pub fn current(&self) -> Option<&Entry> {
        self.get(self.current_index)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index that plays after `index`
    ///
    /// Wraps to the start only under repeat all. Repeat one does not pin the
    /// successor; the supervisor replays the entry on its own deck instead.
    pub fn successor(&self, index: usize) -> Option<usize> {
        let len = self.len();
        if index >= len {
            None
        } else if index + 1 < len {
            Some(index + 1)
        } else if self.repeat == RepeatMode::All {
            Some(0)
        } else {
            None
        }
    }

    /// Whether a fade may hand off from `index` to another entry
    pub fn next_exists(&self, index: usize) -> bool {
        index < self.len() && (index + 1 < self.len() || self.repeat == RepeatMode::All)
    }

    /// Target of a user "next" skip; repeat one does not pin the pointer
    pub fn next_index(&self) -> Option<usize> {
        let len = self.len();
        if len == 0 {
            None
        } else if self.current_index + 1 < len {
            Some(self.current_index + 1)
        } else if self.repeat == RepeatMode::All {
            Some(0)
        } else {
            None
        }
    }

    /// Target of a user "previous" skip
    pub fn previous_index(&self) -> Option<usize> {
        let len = self.len();
        if len == 0 {
            None
        } else if self.current_index > 0 {
            Some(self.current_index - 1)
        } else if self.repeat == RepeatMode::All {
            Some(len - 1)
        } else {
            None
        }
    }

    /// Move the logical pointer
    ///
    /// Returns false (and leaves the pointer alone) when `index` is outside
    /// the queue, including any move on an empty queue.
    pub fn advance_to(&mut self, index: usize) -> bool {
        if index >= self.len() {
            return false;
        }
        self.current_index = index;
        true
    }

    /// Checked pointer move for callers outside the engine
    pub fn set_current_index(&mut self, index: usize) -> Result<()> {
        if self.advance_to(index) {
            Ok(())
        } else if self.is_empty() {
            Err(PlaybackError::QueueEmpty)
        } else {
            Err(PlaybackError::IndexOutOfBounds(index))
        }
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    pub fn set_repeat(&mut self, mode: RepeatMode) {
        self.repeat = mode;
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffle
    }

    /// Switch between natural and shuffled order
    ///
    /// The current entry stays current: it leads the new shuffled order, or
    /// the pointer moves to its natural position when shuffle turns off.
    /// Returns false when the flag did not change.
    pub fn set_shuffle(&mut self, shuffle: bool) -> bool {
        if self.shuffle == shuffle {
            return false;
        }

        if shuffle {
            let natural_index = (!self.entries.is_empty()).then_some(self.current_index);
            self.shuffled = shuffled_order(&self.entries, natural_index);
            self.current_index = 0;
        } else {
            let current_id = self.current().map(|e| e.id.clone());
            self.current_index = current_id
                .and_then(|id| self.entries.iter().position(|e| e.id == id))
                .unwrap_or(0);
            self.shuffled.clear();
        }

        self.shuffle = shuffle;
        true
    }

    /// Master volume `V`
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Set master volume, clamped to [0, 1]
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
        self.shuffled.clear();
        self.current_index = 0;
    }
}

impl Default for PlayQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_entry(id: &str) -> Entry {
        Entry {
            id: id.to_string(),
            title: format!("Track {}", id),
            artist: "Test Artist".to_string(),
            album: Some("Test Album".to_string()),
            duration: None,
            stream_url: format!("https://music.example.com/rest/stream.view?id={}", id),
            download_url: None,
        }
    }

    fn queue_of(ids: &[&str]) -> PlayQueue {
        let mut queue = PlayQueue::new();
        queue.replace(ids.iter().map(|id| create_test_entry(id)).collect(), 0);
        queue
    }

    #[test]
    fn create_empty_queue() {
        let queue = PlayQueue::new();
        assert_eq!(queue.len(), 0);
        assert!(queue.is_empty());
        assert!(queue.current().is_none());
        assert_eq!(queue.volume(), DEFAULT_VOLUME);
    }

    #[test]
    fn replace_starts_at_index() {
        let mut queue = PlayQueue::new();
        queue.replace(vec![create_test_entry("a"), create_test_entry("b")], 1);
        assert_eq!(queue.current_index(), 1);
        assert_eq!(queue.current().unwrap().id, "b");
    }

    #[test]
    fn replace_with_bad_start_falls_back_to_zero() {
        let mut queue = PlayQueue::new();
        queue.replace(vec![create_test_entry("a")], 5);
        assert_eq!(queue.current_index(), 0);
    }

    #[test]
    fn successor_without_repeat() {
        let queue = queue_of(&["a", "b", "c"]);
        assert_eq!(queue.successor(0), Some(1));
        assert_eq!(queue.successor(1), Some(2));
        assert_eq!(queue.successor(2), None);
        assert_eq!(queue.successor(3), None);
        assert!(!queue.next_exists(2));
    }

    #[test]
    fn successor_with_repeat_all_wraps() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.set_repeat(RepeatMode::All);
        assert_eq!(queue.successor(2), Some(0));
        assert!(queue.next_exists(2));
    }

    #[test]
    fn repeat_one_does_not_create_a_next_entry() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.set_repeat(RepeatMode::One);
        assert_eq!(queue.successor(1), Some(2));
        assert!(queue.next_exists(1));
        assert_eq!(queue.successor(2), None);
        assert!(!queue.next_exists(2));

        let mut queue = queue_of(&["a"]);
        queue.set_repeat(RepeatMode::One);
        assert_eq!(queue.successor(0), None);
        assert!(!queue.next_exists(0));
    }

    #[test]
    fn single_entry_repeat_all_hands_off_to_itself() {
        let mut queue = queue_of(&["a"]);
        assert_eq!(queue.successor(0), None);
        queue.set_repeat(RepeatMode::All);
        assert_eq!(queue.successor(0), Some(0));
    }

    #[test]
    fn empty_queue_has_no_successor() {
        let mut queue = PlayQueue::new();
        queue.set_repeat(RepeatMode::All);
        assert_eq!(queue.successor(0), None);
        assert!(!queue.next_exists(0));
    }

    #[test]
    fn advance_past_empty_queue_is_noop() {
        let mut queue = PlayQueue::new();
        assert!(!queue.advance_to(0));
        assert_eq!(queue.current_index(), 0);

        let mut queue = queue_of(&["a", "b"]);
        assert!(!queue.advance_to(2));
        assert_eq!(queue.current_index(), 0);
        assert!(queue.advance_to(1));
        assert_eq!(queue.current_index(), 1);
    }

    #[test]
    fn set_current_index_reports_bad_index() {
        let mut queue = PlayQueue::new();
        assert!(matches!(
            queue.set_current_index(0),
            Err(PlaybackError::QueueEmpty)
        ));

        let mut queue = queue_of(&["a", "b"]);
        assert!(matches!(
            queue.set_current_index(2),
            Err(PlaybackError::IndexOutOfBounds(2))
        ));
        assert!(queue.set_current_index(1).is_ok());
    }

    #[test]
    fn user_skips_ignore_repeat_one() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.set_repeat(RepeatMode::One);
        assert_eq!(queue.next_index(), Some(1));
        assert_eq!(queue.previous_index(), None);

        queue.advance_to(2);
        assert_eq!(queue.next_index(), None);
        queue.set_repeat(RepeatMode::All);
        assert_eq!(queue.next_index(), Some(0));
        queue.advance_to(0);
        assert_eq!(queue.previous_index(), Some(2));
    }

    #[test]
    fn shuffle_keeps_current_entry() {
        let mut queue = queue_of(&["a", "b", "c", "d", "e"]);
        queue.advance_to(2);

        assert!(queue.set_shuffle(true));
        assert!(queue.is_shuffled());
        assert_eq!(queue.current_index(), 0);
        assert_eq!(queue.current().unwrap().id, "c");
        assert_eq!(queue.entries().len(), 5);

        assert!(queue.set_shuffle(false));
        assert_eq!(queue.current().unwrap().id, "c");
        assert_eq!(queue.current_index(), 2);
    }

    #[test]
    fn shuffle_toggle_without_change_is_reported() {
        let mut queue = queue_of(&["a", "b"]);
        assert!(!queue.set_shuffle(false));
        assert!(queue.set_shuffle(true));
        assert!(!queue.set_shuffle(true));
    }

    #[test]
    fn replace_while_shuffled_leads_with_start() {
        let mut queue = PlayQueue::new();
        queue.set_shuffle(true);
        queue.replace(
            vec![
                create_test_entry("a"),
                create_test_entry("b"),
                create_test_entry("c"),
            ],
            1,
        );
        assert_eq!(queue.current_index(), 0);
        assert_eq!(queue.current().unwrap().id, "b");
        assert_eq!(queue.natural_entries()[1].id, "b");
    }

    #[test]
    fn volume_is_clamped() {
        let mut queue = PlayQueue::new();
        queue.set_volume(1.5);
        assert_eq!(queue.volume(), 1.0);
        queue.set_volume(-0.5);
        assert_eq!(queue.volume(), 0.0);
        queue.set_volume(f32::NAN);
        assert_eq!(queue.volume(), 0.0);
    }

    #[test]
    fn clear_resets_pointer() {
        let mut queue = queue_of(&["a", "b"]);
        queue.advance_to(1);
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.current_index(), 0);
    }
}
