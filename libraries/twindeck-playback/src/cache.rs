//! Cache trigger
//!
//! Naturally finished entries are handed to a [`CacheStore`] so the next
//! play can read them from disk. Skips and seeks never cache.

use crate::types::Entry;
use std::path::PathBuf;

/// Persistent song store provided by the host
pub trait CacheStore: Send + Sync {
    /// Persist `source_url` under `filename`; fire-and-forget
    fn store(&self, filename: &str, source_url: &str);

    /// Local file for an entry id, if it is already cached
    fn resolve_local_path(&self, id: &str) -> Option<PathBuf>;
}

/// Decides whether a finished entry goes to the cache
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheTrigger {
    enabled: bool,
}

impl CacheTrigger {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Request a store for `entry`; returns whether one was issued
    pub fn on_natural_completion(&self, entry: &Entry, store: Option<&dyn CacheStore>) -> bool {
        let Some(store) = store.filter(|_| self.enabled) else {
            return false;
        };

        if store.resolve_local_path(&entry.id).is_some() {
            tracing::debug!(id = %entry.id, "Entry already cached");
            return false;
        }

        let url = entry.download_url();
        tracing::debug!(id = %entry.id, url = %url, "Caching finished entry");
        store.store(&entry.cache_file_name(), &url);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        stored: Mutex<Vec<(String, String)>>,
        cached: HashSet<String>,
    }

    impl CacheStore for RecordingStore {
        fn store(&self, filename: &str, source_url: &str) {
            self.stored
                .lock()
                .unwrap()
                .push((filename.to_string(), source_url.to_string()));
        }

        fn resolve_local_path(&self, id: &str) -> Option<PathBuf> {
            self.cached
                .contains(id)
                .then(|| PathBuf::from(format!("/cache/{}.mp3", id)))
        }
    }

    fn entry(id: &str) -> Entry {
        Entry {
            id: id.to_string(),
            title: "Song".to_string(),
            artist: "Artist".to_string(),
            album: None,
            duration: None,
            stream_url: format!("https://music.example.com/rest/stream.view?id={}", id),
            download_url: None,
        }
    }

    #[test]
    fn stores_download_url_under_id() {
        let store = RecordingStore::default();
        let trigger = CacheTrigger::new(true);

        assert!(trigger.on_natural_completion(&entry("42"), Some(&store)));
        let stored = store.stored.lock().unwrap();
        assert_eq!(
            stored.as_slice(),
            &[(
                "42.mp3".to_string(),
                "https://music.example.com/rest/download.view?id=42".to_string()
            )]
        );
    }

    #[test]
    fn disabled_trigger_does_nothing() {
        let store = RecordingStore::default();
        let trigger = CacheTrigger::new(false);
        assert!(!trigger.on_natural_completion(&entry("1"), Some(&store)));
        assert!(store.stored.lock().unwrap().is_empty());
    }

    #[test]
    fn missing_store_does_nothing() {
        let trigger = CacheTrigger::new(true);
        assert!(!trigger.on_natural_completion(&entry("1"), None));
    }

    #[test]
    fn cached_entry_is_skipped() {
        let mut store = RecordingStore::default();
        store.cached.insert("7".to_string());
        let trigger = CacheTrigger::new(true);

        assert!(!trigger.on_natural_completion(&entry("7"), Some(&store)));
        assert!(store.stored.lock().unwrap().is_empty());
    }
}
