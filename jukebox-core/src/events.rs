use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::{progress::PlaybackStatus, song::Song};

/// State changes sent from the player to every subscribed view
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// The playlist is available
    PlaylistLoaded(Vec<Song>),
    /// The playlist could not be loaded; the message is meant for display
    PlaylistFailed(String),
    /// A different track became the active one
    TrackChanged { index: usize, song: Song },
    /// Transport state moved
    StatusChanged(PlaybackStatus),
    /// Repeat toggled
    RepeatChanged(bool),
    /// Volume applied to the media handle (0.0 to 1.0)
    VolumeChanged(f32),
    /// Playback position as percent plus current time and duration in seconds
    Progress { percent: f64, current: f64, duration: f64 },
    /// The media handle reported a problem with the current source
    MediaError(String),
}

/// Fan-out of player events to any number of views
#[derive(Debug, Default)]
pub struct Notifier {
    subscribers: Vec<Sender<PlayerEvent>>,
}

impl Notifier {
    pub fn subscribe(&mut self) -> Receiver<PlayerEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Subscribe and queue `initial` for the new subscriber only
    pub fn subscribe_with(&mut self, initial: Vec<PlayerEvent>) -> Receiver<PlayerEvent> {
        let (tx, rx) = unbounded();
        for event in initial {
            let _ = tx.send(event);
        }
        self.subscribers.push(tx);
        rx
    }

    /// Send to every live subscriber, forgetting the ones that went away
    pub fn notify(&mut self, event: PlayerEvent) {
        self.subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
