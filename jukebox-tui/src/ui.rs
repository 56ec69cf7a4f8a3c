use jukebox_core::{PlaybackStatus, format_time};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph},
};
use strum::IntoEnumIterator;
use tui_logger::TuiLoggerWidget;

use crate::state::{Button, Hitboxes, ViewState};

/// Draw the player widget and record where its controls landed
pub fn draw(f: &mut Frame, state: &mut ViewState) {
    let root = Block::default()
        .title(" 🎵 Jukebox ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .style(Style::default().bg(state.background));
    let area = root.inner(f.area());
    f.render_widget(root, f.area());

    let error_height = if state.error_message.is_some() { 1 } else { 0 };
    let log_height = if state.show_log { 8 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(error_height), // Error message
            Constraint::Min(3),               // Playlist
            Constraint::Length(3),            // Transport + volume buttons
            Constraint::Length(3),            // Progress
            Constraint::Length(log_height),   // Log panel
            Constraint::Length(1),            // Status line
        ])
        .split(area);

    let mut hitboxes = Hitboxes::default();

    if let Some(ref msg) = state.error_message {
        let error = Paragraph::new(format!("{}  (Shift+R to retry)", msg))
            .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD));
        f.render_widget(error, chunks[0]);
    }

    hitboxes.playlist = draw_playlist(f, chunks[1], state);
    hitboxes.buttons = draw_controls(f, chunks[2], state);
    hitboxes.progress = draw_progress(f, chunks[3], state);

    if state.show_log {
        draw_log(f, chunks[4]);
    }
    draw_status(f, chunks[5], state);

    state.hitboxes = hitboxes;
}

/// Draw the song list, returns the area of its rows
fn draw_playlist(f: &mut Frame, area: Rect, state: &mut ViewState) -> Rect {
    let block = Block::default()
        .title(format!(" Playlist ({} songs) ", state.songs.len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);

    if state.songs.is_empty() {
        let placeholder = if state.fetching {
            "Loading songs..."
        } else {
            "No songs available"
        };
        let empty_msg = Paragraph::new(placeholder)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(empty_msg, area);
        return inner;
    }

    let items: Vec<ListItem> = state
        .songs
        .iter()
        .enumerate()
        .map(|(i, song)| {
            let is_current = state.current_index == Some(i);
            let prefix = if is_current { "▶ " } else { "  " };
            let style = if is_current {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(format!("{}{}. {}", prefix, i + 1, song.name)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    f.render_stateful_widget(list, area, &mut state.list_state);
    inner
}

fn button_label(button: Button, state: &ViewState) -> &'static str {
    match button {
        Button::Previous => "⏮",
        Button::PlayPause => match state.status {
            PlaybackStatus::Playing => "⏸",
            PlaybackStatus::Loading => "…",
            _ => "▶",
        },
        Button::Next => "⏭",
        Button::Shuffle => "🔀",
        Button::Repeat => "🔁",
        Button::VolumeDown => "🔉 -",
        Button::VolumeUp => "🔊 +",
    }
}

/// Draw transport and volume buttons, returns their areas
fn draw_controls(f: &mut Frame, area: Rect, state: &ViewState) -> Vec<(Button, Rect)> {
    let buttons: Vec<Button> = Button::iter().collect();
    let mut constraints: Vec<Constraint> = buttons.iter().map(|_| Constraint::Length(8)).collect();
    constraints.push(Constraint::Min(0));

    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    buttons
        .into_iter()
        .zip(cells.iter().copied())
        .map(|(button, cell)| {
            let active = match button {
                Button::Repeat => state.is_repeating,
                Button::PlayPause => state.is_playing(),
                _ => false,
            };
            let held = state.held == Some(button);
            let border_style = if active || held {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            let widget = Paragraph::new(button_label(button, state))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).border_style(border_style));
            f.render_widget(widget, cell);
            (button, cell)
        })
        .collect()
}

/// Draw the time display and seek gauge, returns the gauge's inner area
fn draw_progress(f: &mut Frame, area: Rect, state: &ViewState) -> Rect {
    let label = format!(
        "{} / {}",
        format_time(state.position),
        format_time(state.duration)
    );
    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);

    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::DarkGray))
        .percent(state.progress.clamp(0.0, 100.0) as u16)
        .label(label);

    f.render_widget(gauge, area);
    inner
}

fn draw_log(f: &mut Frame, area: Rect) {
    let log_widget = TuiLoggerWidget::default()
        .block(
            Block::default()
                .title(" 📋 Log ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .style(Style::default().fg(Color::White));

    f.render_widget(log_widget, area);
}

/// Draw the one-line status and key help
fn draw_status(f: &mut Frame, area: Rect, state: &ViewState) {
    let status_style = if state.error_message.is_some() {
        Style::default().fg(Color::Red)
    } else if state.is_playing() {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Yellow)
    };

    let line = Line::from(vec![
        Span::styled(format!("{} ", state.status), status_style),
        Span::raw(format!(
            "| {} | Vol: {:3.0}% | ",
            state.status_message,
            state.volume * 100.0
        )),
        Span::styled("[Space]", Style::default().fg(Color::Yellow)),
        Span::raw(" Play  "),
        Span::styled("[N/P]", Style::default().fg(Color::Yellow)),
        Span::raw(" Next/Prev  "),
        Span::styled("[S/R]", Style::default().fg(Color::Yellow)),
        Span::raw(" Shuffle/Repeat  "),
        Span::styled("[+/-]", Style::default().fg(Color::Yellow)),
        Span::raw(" Vol  "),
        Span::styled("[←/→]", Style::default().fg(Color::Yellow)),
        Span::raw(" Seek  "),
        Span::styled("[G]", Style::default().fg(Color::Magenta)),
        Span::raw(" Log  "),
        Span::styled("[Q]", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ]);

    f.render_widget(Paragraph::new(line), area);
}
