use std::time::Duration;

use crate::song::Song;

pub const DEFAULT_BASE_URL: &str = "https://playground.4geeks.com";
pub const DEFAULT_SONGS_ENDPOINT: &str = "https://playground.4geeks.com/sound/songs";

/// Where the playlist comes from at mount time
#[derive(Debug, Clone, PartialEq)]
pub enum PlaylistSource {
    /// Fetch `{ "songs": [...] }` from `endpoint`, resolving relative URLs against `base_url`
    Remote { endpoint: String, base_url: String },
    /// Use the given songs as-is
    Static(Vec<Song>),
    /// Use [`crate::song::fallback_songs`]
    Fallback,
}

impl Default for PlaylistSource {
    fn default() -> Self {
        PlaylistSource::Remote {
            endpoint: DEFAULT_SONGS_ENDPOINT.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Player configuration, fixed for the lifetime of a mount
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    pub source: PlaylistSource,
    /// Volume applied to the media handle at mount (0.0 to 1.0)
    pub initial_volume: f32,
    /// Initial repeat flag
    pub repeat: bool,
    /// Volume delta of a single click on a volume button
    pub click_step: f32,
    /// Volume delta applied on every tick while a volume button is held
    pub hold_step: f32,
    /// Tick period of the press-and-hold timer
    pub hold_interval: Duration,
    /// Global timeout of the playlist request
    pub fetch_timeout: Duration,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            source: PlaylistSource::default(),
            initial_volume: 0.5,
            repeat: false,
            click_step: 0.05,
            hold_step: 0.1,
            hold_interval: Duration::from_millis(100),
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

impl PlayerConfig {
    pub fn with_source(mut self, source: PlaylistSource) -> Self {
        self.source = source;
        self
    }

    pub fn repeat(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn initial_volume(mut self, volume: f32) -> Self {
        self.initial_volume = volume.clamp(0.0, 1.0);
        self
    }
}
