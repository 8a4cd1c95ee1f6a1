//! Song cache backed by a directory.

use crate::download::download_to;
use crate::error::{CacheError, Result};
use reqwest::Client;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use twindeck_playback::{CacheStore, PlayerConfig};

/// Directory of cached songs, filled by background downloads
pub struct SongCache {
    dir: PathBuf,
    http: Client,
    runtime: Handle,

    // File names with a download in progress
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl SongCache {
    /// Create a cache writing into `dir`, spawning downloads on `runtime`
    pub fn new(dir: impl Into<PathBuf>, runtime: Handle) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(300))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            dir: dir.into(),
            http,
            runtime,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    /// Create a cache at the configured cache path
    pub fn from_config(config: &PlayerConfig, runtime: Handle) -> Result<Self> {
        Self::new(config.cache_path.clone(), runtime)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where `filename` lives inside the cache
    pub fn path_for(&self, filename: &str) -> Result<PathBuf> {
        let name = sanitize_file_name(filename);
        if name.is_empty() {
            return Err(CacheError::InvalidFileName(filename.to_string()));
        }
        Ok(self.dir.join(name))
    }

    /// Download `url` into the cache as `filename` and wait for it
    pub async fn fetch(&self, filename: &str, url: &str) -> Result<PathBuf> {
        let dest = self.path_for(filename)?;
        download_to(&self.http, url, &dest).await?;
        Ok(dest)
    }

    /// Start a background download unless one for `filename` is running
    pub fn spawn_fetch(&self, filename: &str, url: &str) -> Option<JoinHandle<()>> {
        let dest = match self.path_for(filename) {
            Ok(dest) => dest,
            Err(e) => {
                warn!(error = %e, "Not caching song");
                return None;
            }
        };

        let key = filename.to_string();
        if !lock(&self.in_flight).insert(key.clone()) {
            debug!(filename = %filename, "Download already in flight");
            return None;
        }

        let http = self.http.clone();
        let url = url.to_string();
        let in_flight = Arc::clone(&self.in_flight);

        Some(self.runtime.spawn(async move {
            if let Err(e) = download_to(&http, &url, &dest).await {
                warn!(url = %url, error = %e, "Failed to cache song");
            }
            lock(&in_flight).remove(&key);
        }))
    }
}

impl CacheStore for SongCache {
    fn store(&self, filename: &str, source_url: &str) {
        let _ = self.spawn_fetch(filename, source_url);
    }

    fn resolve_local_path(&self, id: &str) -> Option<PathBuf> {
        self.path_for(&format!("{}.mp3", id))
            .ok()
            .filter(|path| path.is_file())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Reduce a file name to characters that are safe on every platform
///
/// Path separators and other punctuation become `_`; leading dots are
/// dropped so the result can never name a parent or hidden file.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    cleaned.trim_start_matches('.').to_string()
}
