//! Player settings
//!
//! Settings are loaded once (file, then `TWINDECK_*` environment overrides)
//! and injected into the supervisor. Changes are pushed with
//! `Supervisor::reload_settings`; nothing in the engine reads global state.

use crate::crossfade::FadeCurve;
use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Longest accepted crossfade, in seconds
pub const MAX_FADE_DURATION: f64 = 100.0;

/// Settings the playback engine consumes
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlaybackSettings {
    /// Crossfade length in seconds (0 disables fading)
    #[serde(default)]
    pub fade_duration: f64,

    /// Volume curve used while ramping
    #[serde(default)]
    pub fade_type: FadeCurve,

    /// Persist naturally completed tracks to the song cache
    #[serde(default)]
    pub cache_songs: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            fade_duration: 0.0,
            fade_type: FadeCurve::EqualPower,
            cache_songs: false,
        }
    }
}

impl PlaybackSettings {
    /// Reject values the controller cannot work with
    pub fn validate(&self) -> Result<()> {
        if !self.fade_duration.is_finite()
            || !(0.0..=MAX_FADE_DURATION).contains(&self.fade_duration)
        {
            return Err(PlaybackError::InvalidSetting(format!(
                "fade_duration must be within 0..={MAX_FADE_DURATION}, got {}",
                self.fade_duration
            )));
        }
        Ok(())
    }
}

/// Read-only access to the current playback settings
pub trait SettingsProvider {
    fn playback_settings(&self) -> PlaybackSettings;
}

impl SettingsProvider for PlaybackSettings {
    fn playback_settings(&self) -> PlaybackSettings {
        self.clone()
    }
}

/// Full settings document
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default)]
    pub playback: PlaybackSettings,

    /// Directory cached songs are written to
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            playback: PlaybackSettings::default(),
            cache_path: default_cache_path(),
        }
    }
}

impl SettingsProvider for PlayerConfig {
    fn playback_settings(&self) -> PlaybackSettings {
        self.playback.clone()
    }
}

impl PlayerConfig {
    /// Load settings from an optional TOML file and the environment
    ///
    /// Environment variables use the `TWINDECK_` prefix and `__` between
    /// nesting levels, e.g. `TWINDECK_PLAYBACK__FADE_DURATION=4.5`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            if path.exists() {
                settings = settings.add_source(config::File::from(path));
            } else {
                tracing::debug!(path = %path.display(), "Settings file not found, using defaults");
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("TWINDECK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: PlayerConfig = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all sections
    pub fn validate(&self) -> Result<()> {
        self.playback.validate()
    }
}

fn default_cache_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("twindeck")
        .join("song")
}
