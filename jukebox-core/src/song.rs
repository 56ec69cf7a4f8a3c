use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Identifier of a song as handed out by the songs endpoint.
///
/// The endpoint uses integers, statically configured lists are free to use
/// strings, so both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SongId {
    Number(u64),
    Text(String),
}

impl Display for SongId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SongId::Number(n) => write!(f, "{}", n),
            SongId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for SongId {
    fn from(value: u64) -> Self {
        SongId::Number(value)
    }
}

impl From<&str> for SongId {
    fn from(value: &str) -> Self {
        SongId::Text(value.to_string())
    }
}

/// A single playable entry of the playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    /// Display name shown in the playlist
    pub name: String,
    /// Fully resolved URL (or local path) handed to the media handle
    pub url: String,
}

impl Song {
    pub fn new(id: impl Into<SongId>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
        }
    }
}

impl Display for Song {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Join a possibly relative song URL onto the base address.
///
/// Absolute `http://`/`https://` URLs are returned untouched. Otherwise exactly
/// one `/` separates base and path.
pub fn resolve_url(base_url: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    let base = base_url.trim_end_matches('/');
    let path = url.trim_start_matches('/');
    format!("{}/{}", base, path)
}

/// Built-in playlist used when neither an endpoint nor a static list is configured.
///
/// Mirrors the first entries of the public songs endpoint so an offline start
/// still shows something playable once the network is back.
pub fn fallback_songs() -> Vec<Song> {
    const BASE: &str = crate::config::DEFAULT_BASE_URL;
    vec![
        Song::new(1u64, "Mario Castle", resolve_url(BASE, "/sound/files/mario/songs/castle.mp3")),
        Song::new(
            2u64,
            "Mario Star",
            resolve_url(BASE, "/sound/files/mario/songs/hurry-starman.mp3"),
        ),
        Song::new(
            3u64,
            "Mario Overworld",
            resolve_url(BASE, "/sound/files/mario/songs/overworld.mp3"),
        ),
    ]
}
