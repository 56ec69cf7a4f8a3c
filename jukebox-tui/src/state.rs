use jukebox_core::{PlaybackStatus, PlayerEvent, Song};
use ratatui::{
    layout::{Position, Rect},
    style::Color,
    widgets::ListState,
};
use strum::EnumIter;

/// Clickable controls of the widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Button {
    Previous,
    PlayPause,
    Next,
    Shuffle,
    Repeat,
    VolumeDown,
    VolumeUp,
}

impl Button {
    /// `Some(up)` for the volume buttons
    pub fn volume_direction(self) -> Option<bool> {
        match self {
            Button::VolumeDown => Some(false),
            Button::VolumeUp => Some(true),
            _ => None,
        }
    }
}

/// Screen areas recorded by the last draw, used to route mouse input
#[derive(Debug, Clone, Default)]
pub struct Hitboxes {
    /// Rows of the playlist (inside the border)
    pub playlist: Rect,
    pub buttons: Vec<(Button, Rect)>,
    /// Inner area of the progress gauge
    pub progress: Rect,
}

impl Hitboxes {
    pub fn button_at(&self, column: u16, row: u16) -> Option<Button> {
        let pos = Position::new(column, row);
        self.buttons
            .iter()
            .find(|(_, area)| area.contains(pos))
            .map(|(button, _)| *button)
    }

    /// Playlist row under the pointer, relative to the first visible row
    pub fn playlist_row(&self, column: u16, row: u16) -> Option<usize> {
        self.playlist
            .contains(Position::new(column, row))
            .then(|| (row - self.playlist.y) as usize)
    }

    /// Seek percentage for a pointer over the progress gauge
    pub fn progress_percent(&self, column: u16, row: u16) -> Option<f64> {
        if !self.progress.contains(Position::new(column, row)) {
            return None;
        }
        let span = self.progress.width.saturating_sub(1).max(1) as f64;
        Some(((column - self.progress.x) as f64 / span * 100.0).clamp(0.0, 100.0))
    }
}

/// What the view knows about the player, kept current from `PlayerEvent`s
pub struct ViewState {
    pub songs: Vec<Song>,
    pub current_index: Option<usize>,
    pub status: PlaybackStatus,
    pub is_repeating: bool,
    /// Current volume (0.0 to 1.0)
    pub volume: f32,
    /// Progress in percent
    pub progress: f64,
    /// Current playback position in seconds
    pub position: f64,
    /// Total duration in seconds, 0 while unknown
    pub duration: f64,
    /// Playlist error shown above the list
    pub error_message: Option<String>,
    /// Status message to display
    pub status_message: String,
    pub fetching: bool,
    pub list_state: ListState,
    pub show_log: bool,
    pub background: Color,
    pub hitboxes: Hitboxes,
    /// Volume button currently pressed with the mouse
    pub held: Option<Button>,
}

impl ViewState {
    pub fn new(background: Color, fetching: bool) -> Self {
        Self {
            songs: Vec::new(),
            current_index: None,
            status: PlaybackStatus::Idle,
            is_repeating: false,
            volume: 0.0,
            progress: 0.0,
            position: 0.0,
            duration: 0.0,
            error_message: None,
            status_message: if fetching {
                "Loading songs...".to_string()
            } else {
                "Ready".to_string()
            },
            fetching,
            list_state: ListState::default(),
            show_log: false,
            background,
            hitboxes: Hitboxes::default(),
            held: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    /// Handle an event from the player
    pub fn handle_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::PlaylistLoaded(songs) => {
                self.fetching = false;
                self.error_message = None;
                self.status_message = format!("{} songs", songs.len());
                self.songs = songs;
                if self.songs.is_empty() {
                    self.list_state.select(None);
                } else if self.list_state.selected().is_none() {
                    self.list_state.select(Some(0));
                }
            }
            PlayerEvent::PlaylistFailed(msg) => {
                self.fetching = false;
                self.status_message = "No songs available".to_string();
                self.error_message = Some(msg);
            }
            PlayerEvent::TrackChanged { index, song } => {
                self.current_index = Some(index);
                self.list_state.select(Some(index));
                self.status_message = format!("Track {}/{}: {}", index + 1, self.songs.len(), song.name);
            }
            PlayerEvent::StatusChanged(status) => {
                self.status = status;
            }
            PlayerEvent::RepeatChanged(on) => {
                self.is_repeating = on;
            }
            PlayerEvent::VolumeChanged(volume) => {
                self.volume = volume;
            }
            PlayerEvent::Progress {
                percent,
                current,
                duration,
            } => {
                self.progress = percent;
                self.position = current;
                self.duration = duration;
            }
            PlayerEvent::MediaError(msg) => {
                self.status_message = format!("Error: {}", msg);
            }
        }
    }

    // ==============================================
    // Playlist cursor
    // ==============================================

    pub fn select_next(&mut self) {
        if self.songs.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < self.songs.len() => i + 1,
            Some(i) => i,
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_prev(&mut self) {
        if self.songs.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn selected(&self) -> Option<usize> {
        self.list_state.selected()
    }

    /// Playlist index shown on a visible row
    pub fn index_for_row(&self, row: usize) -> Option<usize> {
        let index = self.list_state.offset() + row;
        (index < self.songs.len()).then_some(index)
    }
}
