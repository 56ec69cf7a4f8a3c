use std::{thread, time::Duration};

use crossbeam_channel::{Receiver, TryRecvError, bounded};
use serde::Deserialize;

use crate::{
    error::PlaylistError,
    song::{Song, SongId, resolve_url},
};

#[derive(Debug, Deserialize)]
struct SongEntry {
    id: SongId,
    name: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct SongsResponse {
    songs: Vec<SongEntry>,
}

/// Decode a songs payload and resolve every URL against `base_url`
pub fn parse_songs(body: &str, base_url: &str) -> Result<Vec<Song>, PlaylistError> {
    let resp: SongsResponse = serde_json::from_str(body)?;
    Ok(resp
        .songs
        .into_iter()
        .map(|entry| Song {
            id: entry.id,
            name: entry.name,
            url: resolve_url(base_url, &entry.url),
        })
        .collect())
}

/// Blocking GET of the songs endpoint
pub fn fetch_songs(
    endpoint: &str,
    base_url: &str,
    timeout: Duration,
) -> Result<Vec<Song>, PlaylistError> {
    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into();

    let mut resp = agent.get(endpoint).call()?;
    if !resp.status().is_success() {
        return Err(PlaylistError::Status(resp.status().as_u16()));
    }
    let body = resp.body_mut().read_to_string()?;
    let songs = parse_songs(&body, base_url)?;
    log::info!("Songs loaded: {} entries from {}", songs.len(), endpoint);
    Ok(songs)
}

/// A playlist fetch running on a worker thread.
///
/// Dropping it abandons the fetch: the worker's answer is discarded.
pub struct PendingPlaylist {
    rx: Receiver<Result<Vec<Song>, PlaylistError>>,
}

impl PendingPlaylist {
    /// Non-blocking check for the result
    pub fn try_take(&self) -> Option<Result<Vec<Song>, PlaylistError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(PlaylistError::WorkerGone)),
        }
    }
}

/// Start fetching the songs endpoint in the background
pub fn spawn_fetch(endpoint: String, base_url: String, timeout: Duration) -> PendingPlaylist {
    let (tx, rx) = bounded(1);
    thread::spawn(move || {
        let result = fetch_songs(&endpoint, &base_url, timeout);
        if let Err(e) = &result {
            log::error!("Error fetching songs: {}", e);
        }
        if tx.send(result).is_err() {
            log::debug!("Player unmounted before the playlist arrived; dropping it");
        }
    });
    PendingPlaylist { rx }
}
