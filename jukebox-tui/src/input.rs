use jukebox_core::{MediaHandle, Player};
use ratatui::crossterm::event::{KeyCode, MouseButton, MouseEvent, MouseEventKind};

use crate::state::{Button, ViewState};

/// Seek step of the arrow keys, in percent
const SEEK_STEP: f64 = 5.0;

fn press<M: MediaHandle>(button: Button, player: &mut Player<M>) {
    match button {
        Button::Previous => player.previous(),
        Button::PlayPause => player.toggle_play_pause(),
        Button::Next => player.next(),
        Button::Shuffle => player.random_track(),
        Button::Repeat => player.toggle_repeat(),
        Button::VolumeDown | Button::VolumeUp => {}
    }
}

/// Handle a key press, returns true when the app should quit
pub fn handle_key<M: MediaHandle>(
    key: KeyCode,
    state: &mut ViewState,
    player: &mut Player<M>,
) -> bool {
    match key {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Char(' ') => press(Button::PlayPause, player),
        KeyCode::Char('n') => press(Button::Next, player),
        KeyCode::Char('p') => press(Button::Previous, player),
        KeyCode::Char('s') => press(Button::Shuffle, player),
        KeyCode::Char('r') => press(Button::Repeat, player),
        KeyCode::Char('R') => {
            player.reload_playlist();
            if player.is_fetching() {
                state.fetching = true;
                state.status_message = "Loading songs...".to_string();
            }
        }
        KeyCode::Char('+') | KeyCode::Char('=') => player.volume_click(true),
        KeyCode::Char('-') => player.volume_click(false),
        KeyCode::Right => player.seek(player.progress() + SEEK_STEP),
        KeyCode::Left => player.seek(player.progress() - SEEK_STEP),
        KeyCode::Up => state.select_prev(),
        KeyCode::Down => state.select_next(),
        KeyCode::Enter => {
            if let Some(index) = state.selected() {
                player.play(index);
            }
        }
        KeyCode::Char('g') => state.show_log = !state.show_log,
        _ => {}
    }
    false
}

/// Route a mouse event to the control under the pointer.
///
/// A press on a volume button starts the continuous adjustment, the release
/// on the same button counts as a click, and leaving the button while held
/// stops the adjustment.
pub fn handle_mouse<M: MediaHandle>(
    mouse: MouseEvent,
    state: &mut ViewState,
    player: &mut Player<M>,
) {
    let (column, row) = (mouse.column, mouse.row);
    let hovered = state.hitboxes.button_at(column, row);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(button) = hovered {
                match button.volume_direction() {
                    Some(up) => {
                        player.volume_hold(up);
                        state.held = Some(button);
                    }
                    None => press(button, player),
                }
            } else if let Some(row) = state.hitboxes.playlist_row(column, row) {
                if let Some(index) = state.index_for_row(row) {
                    state.list_state.select(Some(index));
                    player.play(index);
                }
            } else if let Some(percent) = state.hitboxes.progress_percent(column, row) {
                player.seek(percent);
            }
        }
        MouseEventKind::Up(MouseButton::Left) => {
            if let Some(held) = state.held.take() {
                player.stop_continuous_adjust();
                if hovered == Some(held) {
                    if let Some(up) = held.volume_direction() {
                        player.volume_click(up);
                    }
                }
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            if let Some(held) = state.held {
                if hovered != Some(held) {
                    player.stop_continuous_adjust();
                    state.held = None;
                }
            } else if let Some(percent) = state.hitboxes.progress_percent(column, row) {
                player.seek(percent);
            }
        }
        MouseEventKind::Moved => {
            if state.held.is_some() && hovered != state.held {
                player.stop_continuous_adjust();
                state.held = None;
            }
        }
        _ => {}
    }
}
