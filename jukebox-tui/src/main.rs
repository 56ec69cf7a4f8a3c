//! `jukebox`: a terminal audio player widget.
//!
//! Fetches a song list from a songs endpoint (or uses the built-in list with
//! `--offline`) and plays it through the default audio output.

use std::io;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use jukebox_core::{
    Player, PlayerConfig, PlaylistSource,
    config::{DEFAULT_BASE_URL, DEFAULT_SONGS_ENDPOINT},
    engine::AudioEngine,
};
use ratatui::{
    backend::CrosstermBackend,
    crossterm::{
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    style::Color,
};

mod input;
mod state;
mod ui;

use state::ViewState;

/// Upper bound between two ticks of the player
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(name = "jukebox", version, about = "Terminal audio player widget")]
struct Args {
    /// Songs endpoint returning `{ "songs": [{ "id", "name", "url" }] }`
    #[arg(long, default_value = DEFAULT_SONGS_ENDPOINT)]
    endpoint: String,

    /// Base address relative song URLs are resolved against
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Use the built-in playlist instead of fetching one
    #[arg(long)]
    offline: bool,

    /// Start with repeat enabled
    #[arg(long)]
    repeat: bool,

    /// Initial volume (0.0 to 1.0)
    #[arg(long, default_value_t = 0.5)]
    volume: f32,

    /// Background colour, a name or `#rrggbb`
    #[arg(long, default_value = "#282828", value_parser = parse_color)]
    background: Color,
}

fn parse_color(s: &str) -> Result<Color, String> {
    s.parse::<Color>()
        .map_err(|_| format!("unknown colour '{}'", s))
}

impl Args {
    fn player_config(&self) -> PlayerConfig {
        let source = if self.offline {
            PlaylistSource::Fallback
        } else {
            PlaylistSource::Remote {
                endpoint: self.endpoint.clone(),
                base_url: self.base_url.clone(),
            }
        };
        PlayerConfig::default()
            .with_source(source)
            .repeat(self.repeat)
            .initial_volume(self.volume)
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tui_logger for the log panel
    tui_logger::init_logger(log::LevelFilter::Debug)
        .map_err(|e| anyhow::anyhow!("Failed to init tui_logger: {:?}", e))?;
    tui_logger::set_default_level(log::LevelFilter::Debug);

    log::info!("Starting Jukebox");

    let engine = AudioEngine::try_new_default().context("Failed to open audio output")?;
    log::debug!("Using output device {}", engine.device_name());
    let player = Player::mount(engine, args.player_config());

    run_tui(player, args.background)
}

fn run_tui(mut player: Player<AudioEngine>, background: Color) -> anyhow::Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut player, background);

    // Release timers and listeners before the terminal goes back
    player.unmount();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn event_loop(
    terminal: &mut ratatui::Terminal<CrosstermBackend<io::Stdout>>,
    player: &mut Player<AudioEngine>,
    background: Color,
) -> anyhow::Result<()> {
    let events = player.subscribe();
    let mut state = ViewState::new(background, player.is_fetching());

    loop {
        player.tick(Instant::now());

        // Apply player state changes
        while let Ok(event) = events.try_recv() {
            state.handle_event(event);
        }

        terminal.draw(|f| ui::draw(f, &mut state))?;

        let timeout = player
            .next_timer_due()
            .map(|due| due.saturating_duration_since(Instant::now()))
            .unwrap_or(POLL_INTERVAL)
            .min(POLL_INTERVAL);

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if input::handle_key(key.code, &mut state, player) {
                        break;
                    }
                }
                Event::Mouse(mouse) => input::handle_mouse(mouse, &mut state, player),
                _ => {}
            }
        }
    }

    Ok(())
}
