use std::time::Instant;

use crossbeam_channel::Receiver;
use rand::Rng;

use crate::{
    config::{PlayerConfig, PlaylistSource},
    error::PlaylistError,
    events::{Notifier, PlayerEvent},
    media::{MediaEvent, MediaHandle},
    playlist::{self, PendingPlaylist},
    progress::{self, PlaybackStatus},
    song::{self, Song},
    timer::RepeatingTimer,
};

/// Subscription to the media handle's time-update and ended events for one track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Listeners {
    track: usize,
    looping: bool,
}

/// The player widget's state and controller.
///
/// All mutation happens on the caller's thread: input handlers call the
/// transport/volume/seek methods, and the host loop calls [`Player::tick`]
/// to apply the playlist fetch result, media events and timer ticks.
pub struct Player<M: MediaHandle> {
    media: M,
    config: PlayerConfig,
    songs: Vec<Song>,
    error: Option<String>,
    current_index: Option<usize>,
    /// URL last handed to the media handle
    loaded_url: Option<String>,
    is_playing: bool,
    is_repeating: bool,
    volume: f32,
    progress: f64,
    status: PlaybackStatus,
    /// Start playback when the loading track becomes ready
    autostart: bool,
    listeners: Option<Listeners>,
    volume_timer: Option<RepeatingTimer<f32>>,
    pending_playlist: Option<PendingPlaylist>,
    notifier: Notifier,
    mounted: bool,
}

impl<M: MediaHandle> Player<M> {
    /// Set up the player on top of `media` and start obtaining the playlist
    pub fn mount(media: M, config: PlayerConfig) -> Self {
        let mut player = Self {
            media,
            songs: Vec::new(),
            error: None,
            current_index: None,
            loaded_url: None,
            is_playing: false,
            is_repeating: config.repeat,
            volume: config.initial_volume.clamp(0.0, 1.0),
            progress: 0.0,
            status: PlaybackStatus::Idle,
            autostart: false,
            listeners: None,
            volume_timer: None,
            pending_playlist: None,
            notifier: Notifier::default(),
            mounted: true,
            config,
        };

        player.media.set_volume(player.volume);
        player.media.set_looping(player.is_repeating);
        player.load_playlist();
        log::info!("Player mounted");
        player
    }

    /// Release timers, listeners and the pending fetch. Idempotent.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.stop_continuous_adjust();
        self.detach_listeners();
        self.pending_playlist = None;
        self.autostart = false;
        self.media.pause();
        self.is_playing = false;
        self.mounted = false;
        log::info!("Player unmounted");
    }

    /// Receive every future state change, preceded by a snapshot of the current state
    pub fn subscribe(&mut self) -> Receiver<PlayerEvent> {
        let snapshot = self.snapshot();
        self.notifier.subscribe_with(snapshot)
    }

    fn snapshot(&self) -> Vec<PlayerEvent> {
        let mut events = Vec::new();
        match &self.error {
            Some(msg) => events.push(PlayerEvent::PlaylistFailed(msg.clone())),
            None if !self.songs.is_empty() => {
                events.push(PlayerEvent::PlaylistLoaded(self.songs.clone()))
            }
            None => {}
        }
        if let Some(song) = self.current_song() {
            events.push(PlayerEvent::TrackChanged {
                index: self.current_index.unwrap_or_default(),
                song: song.clone(),
            });
        }
        events.push(PlayerEvent::StatusChanged(self.status));
        events.push(PlayerEvent::RepeatChanged(self.is_repeating));
        events.push(PlayerEvent::VolumeChanged(self.volume));
        events.push(PlayerEvent::Progress {
            percent: self.progress,
            current: self.media.current_time(),
            duration: self.duration(),
        });
        events
    }

    /// Drain the playlist fetch, media events and the volume timer
    pub fn tick(&mut self, now: Instant) {
        if !self.mounted {
            return;
        }

        let fetched = self.pending_playlist.as_ref().and_then(|p| p.try_take());
        if let Some(result) = fetched {
            self.pending_playlist = None;
            self.apply_playlist(result);
        }

        while let Some(event) = self.media.poll_event() {
            self.handle_media_event(event);
        }

        if let Some(delta) = self.volume_timer.as_mut().and_then(|t| t.poll(now)) {
            self.adjust_volume(delta);
        }
    }

    // ==============================================
    // Playlist
    // ==============================================

    fn load_playlist(&mut self) {
        match &self.config.source {
            PlaylistSource::Remote { endpoint, base_url } => {
                log::info!("Fetching songs from {}", endpoint);
                self.pending_playlist = Some(playlist::spawn_fetch(
                    endpoint.clone(),
                    base_url.clone(),
                    self.config.fetch_timeout,
                ));
            }
            PlaylistSource::Static(songs) => {
                let songs = songs.clone();
                self.apply_playlist(Ok(songs));
            }
            PlaylistSource::Fallback => self.apply_playlist(Ok(song::fallback_songs())),
        }
    }

    /// Issue the playlist request again (no-op for static sources or while one is in flight)
    pub fn reload_playlist(&mut self) {
        if !self.mounted || self.pending_playlist.is_some() {
            return;
        }
        if matches!(self.config.source, PlaylistSource::Remote { .. }) {
            self.load_playlist();
        }
    }

    pub fn is_fetching(&self) -> bool {
        self.pending_playlist.is_some()
    }

    fn apply_playlist(&mut self, result: Result<Vec<Song>, PlaylistError>) {
        match result {
            Ok(songs) => {
                self.error = None;
                self.songs = songs;
                let loaded_at = self
                    .loaded_url
                    .as_deref()
                    .and_then(|url| self.songs.iter().position(|s| s.url == url));
                if self.loaded_url.is_some() && loaded_at.is_none() {
                    self.release_track();
                }
                self.current_index = match (loaded_at, self.current_index) {
                    (Some(i), _) => Some(i),
                    _ if self.songs.is_empty() => None,
                    (None, Some(i)) if i < self.songs.len() => Some(i),
                    _ => Some(0),
                };
                if let (Some(listeners), Some(index)) = (self.listeners, loaded_at) {
                    if listeners.track != index {
                        self.attach_listeners(index);
                    }
                }
                log::info!("Playlist ready with {} songs", self.songs.len());
                self.notifier
                    .notify(PlayerEvent::PlaylistLoaded(self.songs.clone()));
                if let Some(index) = self.current_index {
                    let song = self.songs[index].clone();
                    self.notifier.notify(PlayerEvent::TrackChanged { index, song });
                }
            }
            Err(e) => {
                let message = e.user_message();
                log::error!("{}", message);
                self.error = Some(message.clone());
                self.notifier.notify(PlayerEvent::PlaylistFailed(message));
            }
        }
    }

    // ==============================================
    // Transport
    // ==============================================

    /// Load and start the track at `index`; out-of-range indices are ignored
    pub fn play(&mut self, index: usize) {
        let Some(song) = self.songs.get(index).cloned() else {
            log::debug!("Ignoring play({}) with {} songs", index, self.songs.len());
            return;
        };

        self.media.pause();
        self.media.set_current_time(0.0);
        self.detach_listeners();
        self.media.set_source(&song.url);
        self.loaded_url = Some(song.url.clone());
        self.current_index = Some(index);
        self.attach_listeners(index);
        self.media.load();

        self.autostart = true;
        self.is_playing = false;
        self.progress = 0.0;
        log::info!("Loading track {}: {}", index + 1, song.name);
        self.notifier.notify(PlayerEvent::TrackChanged { index, song });
        self.notifier.notify(PlayerEvent::Progress {
            percent: 0.0,
            current: 0.0,
            duration: 0.0,
        });
        self.set_status(PlaybackStatus::Loading);
    }

    pub fn toggle_play_pause(&mut self) {
        match self.status {
            PlaybackStatus::Idle => {
                if let Some(index) = self.current_index {
                    self.play(index);
                }
            }
            PlaybackStatus::Loading => {
                self.autostart = !self.autostart;
                log::debug!("Autostart after load: {}", self.autostart);
            }
            PlaybackStatus::Playing => {
                self.media.pause();
                self.is_playing = false;
                self.set_status(PlaybackStatus::Paused);
            }
            PlaybackStatus::Paused => {
                self.media.play();
                self.is_playing = true;
                self.set_status(PlaybackStatus::Playing);
            }
        }
    }

    /// Play the following track; no-op on the last one
    pub fn next(&mut self) {
        if let Some(index) = self.current_index {
            if index + 1 < self.songs.len() {
                self.play(index + 1);
            }
        }
    }

    /// Play the preceding track; no-op on the first one
    pub fn previous(&mut self) {
        if let Some(index) = self.current_index {
            if index > 0 {
                self.play(index - 1);
            }
        }
    }

    /// Play a uniformly random track, possibly the current one again
    pub fn random_track(&mut self) {
        if self.songs.is_empty() {
            return;
        }
        let index = rand::rng().random_range(0..self.songs.len());
        self.play(index);
    }

    pub fn toggle_repeat(&mut self) {
        self.is_repeating = !self.is_repeating;
        if let Some(index) = self.current_index {
            self.detach_listeners();
            self.attach_listeners(index);
        } else {
            self.media.set_looping(self.is_repeating);
        }
        log::info!("Repeat {}", if self.is_repeating { "on" } else { "off" });
        self.notifier
            .notify(PlayerEvent::RepeatChanged(self.is_repeating));
    }

    /// Stop and forget the loaded track, back to `Idle`
    fn release_track(&mut self) {
        log::info!("Loaded track left the playlist, stopping");
        self.media.pause();
        self.detach_listeners();
        self.loaded_url = None;
        self.autostart = false;
        self.is_playing = false;
        self.progress = 0.0;
        self.notifier.notify(PlayerEvent::Progress {
            percent: 0.0,
            current: 0.0,
            duration: 0.0,
        });
        self.set_status(PlaybackStatus::Idle);
    }

    fn set_status(&mut self, status: PlaybackStatus) {
        if self.status != status {
            log::debug!("Playback {} -> {}", self.status, status);
            self.status = status;
            self.notifier.notify(PlayerEvent::StatusChanged(status));
        }
    }

    // ==============================================
    // Media events
    // ==============================================

    fn attach_listeners(&mut self, track: usize) {
        self.media.set_looping(self.is_repeating);
        self.listeners = Some(Listeners {
            track,
            looping: self.is_repeating,
        });
    }

    fn detach_listeners(&mut self) {
        self.listeners = None;
    }

    pub fn has_listeners(&self) -> bool {
        self.listeners.is_some()
    }

    /// React to one media event. [`Player::tick`] feeds this from the handle.
    pub fn handle_media_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::CanPlayThrough => {
                if self.status != PlaybackStatus::Loading {
                    return;
                }
                if self.autostart {
                    self.autostart = false;
                    self.media.play();
                    self.is_playing = true;
                    self.set_status(PlaybackStatus::Playing);
                } else {
                    self.set_status(PlaybackStatus::Paused);
                }
                self.update_progress();
            }
            MediaEvent::TimeUpdate => {
                if self.listeners.is_some() {
                    self.update_progress();
                }
            }
            MediaEvent::Ended => {
                let Some(listeners) = self.listeners else {
                    return;
                };
                if listeners.looping {
                    // The handle restarts the track itself
                    return;
                }
                if listeners.track + 1 < self.songs.len() {
                    self.next();
                } else {
                    self.media.pause();
                    self.is_playing = false;
                    self.set_status(PlaybackStatus::Paused);
                }
            }
            MediaEvent::Error(msg) => {
                log::warn!("Media error: {}", msg);
                if self.status == PlaybackStatus::Loading {
                    self.autostart = false;
                    self.is_playing = false;
                    self.set_status(PlaybackStatus::Idle);
                }
                self.notifier.notify(PlayerEvent::MediaError(msg));
            }
        }
    }

    // ==============================================
    // Volume
    // ==============================================

    /// Add `delta` to the handle's volume, clamped to 0.0..=1.0
    pub fn adjust_volume(&mut self, delta: f32) {
        if delta.is_nan() {
            return;
        }
        let current = self.media.volume();
        let current = if current.is_finite() { current } else { self.volume };
        let volume = (current + delta).clamp(0.0, 1.0);
        self.media.set_volume(volume);
        self.volume = volume;
        self.notifier.notify(PlayerEvent::VolumeChanged(volume));
    }

    /// Single click on a volume button
    pub fn volume_click(&mut self, up: bool) {
        let step = self.config.click_step;
        self.adjust_volume(if up { step } else { -step });
    }

    /// Press-and-hold on a volume button
    pub fn volume_hold(&mut self, up: bool) {
        let step = self.config.hold_step;
        self.start_continuous_adjust(if up { step } else { -step });
    }

    pub fn start_continuous_adjust(&mut self, delta: f32) {
        self.start_continuous_adjust_at(delta, Instant::now());
    }

    /// Replace any running volume timer with one adjusting by `delta` every hold interval
    pub fn start_continuous_adjust_at(&mut self, delta: f32, now: Instant) {
        self.stop_continuous_adjust();
        self.volume_timer = Some(RepeatingTimer::start(self.config.hold_interval, delta, now));
    }

    pub fn stop_continuous_adjust(&mut self) {
        if self.volume_timer.take().is_some() {
            log::debug!("Volume timer cancelled");
        }
    }

    pub fn is_adjusting_volume(&self) -> bool {
        self.volume_timer.is_some()
    }

    /// When the host loop should tick next for the volume timer
    pub fn next_timer_due(&self) -> Option<Instant> {
        self.volume_timer.as_ref().map(|t| t.next_due())
    }

    // ==============================================
    // Progress
    // ==============================================

    /// Jump to `percent` (0 to 100) of the current track; ignored while the duration is unknown
    pub fn seek(&mut self, percent: f64) {
        match progress::seek_target(percent, self.media.duration()) {
            Some(seconds) => {
                self.media.set_current_time(seconds);
                self.update_progress();
            }
            None => log::debug!("Ignoring seek to {}% without a known duration", percent),
        }
    }

    fn update_progress(&mut self) {
        let current = self.media.current_time();
        let duration = self.duration();
        self.progress = progress::percent(current, duration);
        self.notifier.notify(PlayerEvent::Progress {
            percent: self.progress,
            current,
            duration,
        });
    }

    // ==============================================
    // Accessors
    // ==============================================

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current_song(&self) -> Option<&Song> {
        self.current_index.and_then(|i| self.songs.get(i))
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_repeating(&self) -> bool {
        self.is_repeating
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Playback position in percent (0 to 100)
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn current_time(&self) -> f64 {
        self.media.current_time()
    }

    /// Duration in seconds, 0 while unknown
    pub fn duration(&self) -> f64 {
        let duration = self.media.duration();
        if duration.is_finite() && duration > 0.0 { duration } else { 0.0 }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn media_mut(&mut self) -> &mut M {
        &mut self.media
    }
}

impl<M: MediaHandle> Drop for Player<M> {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use super::*;
    use crate::{
        media::fake::FakeMedia,
        playlist::tests::{serve_once, serve_sequence},
    };

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn songs(n: usize) -> Vec<Song> {
        (0..n)
            .map(|i| Song::new(i as u64, format!("Song {}", i), format!("https://x.test/{}.mp3", i)))
            .collect()
    }

    fn player_with(n: usize) -> Player<FakeMedia> {
        init_logger();
        let config = PlayerConfig::default().with_source(PlaylistSource::Static(songs(n)));
        Player::mount(FakeMedia::new(), config)
    }

    /// Let the fake handle report ready and apply it
    fn ready(player: &mut Player<FakeMedia>) {
        player.media_mut().duration = 200.0;
        player.media_mut().emit(MediaEvent::CanPlayThrough);
        player.tick(Instant::now());
    }

    fn tick_until(player: &mut Player<FakeMedia>, done: impl Fn(&Player<FakeMedia>) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done(player) {
            assert!(Instant::now() < deadline, "condition not reached");
            player.tick(Instant::now());
            thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn mount_applies_initial_volume_and_static_playlist() {
        let player = player_with(3);
        assert_eq!(player.media().volume, 0.5);
        assert_eq!(player.songs().len(), 3);
        assert_eq!(player.current_index(), Some(0));
        assert_eq!(player.status(), PlaybackStatus::Idle);
        assert!(!player.is_playing());
    }

    #[test]
    fn fallback_source_uses_builtin_songs() {
        init_logger();
        let config = PlayerConfig::default().with_source(PlaylistSource::Fallback);
        let player = Player::mount(FakeMedia::new(), config);
        assert_eq!(player.songs(), song::fallback_songs().as_slice());
    }

    #[test]
    fn empty_playlist_has_no_current_index() {
        let mut player = player_with(0);
        assert_eq!(player.current_index(), None);
        player.play(0);
        player.next();
        player.previous();
        player.random_track();
        player.toggle_play_pause();
        assert_eq!(player.media().loads, 0);
        assert_eq!(player.status(), PlaybackStatus::Idle);
    }

    #[test]
    fn play_every_valid_index() {
        let mut player = player_with(4);
        for i in 0..4 {
            player.play(i);
            assert_eq!(player.status(), PlaybackStatus::Loading);
            ready(&mut player);
            assert_eq!(player.current_index(), Some(i));
            assert!(player.is_playing());
            assert_eq!(player.status(), PlaybackStatus::Playing);
            assert_eq!(
                player.media().source.as_deref(),
                Some(format!("https://x.test/{}.mp3", i).as_str())
            );
        }
    }

    #[test]
    fn play_pauses_rewinds_then_loads() {
        let mut player = player_with(2);
        player.play(1);
        assert_eq!(
            player.media().calls,
            vec!["pause", "seek 0", "src https://x.test/1.mp3", "load"]
        );
        assert!(!player.media().playing);
    }

    #[test]
    fn out_of_range_play_is_ignored() {
        let mut player = player_with(2);
        player.play(1);
        ready(&mut player);
        player.play(5);
        assert_eq!(player.current_index(), Some(1));
        assert_eq!(player.media().loads, 1);
        assert!(player.is_playing());
    }

    #[test]
    fn next_and_previous_stop_at_bounds() {
        let mut player = player_with(3);
        player.previous();
        assert_eq!(player.media().loads, 0);

        player.play(2);
        player.next();
        assert_eq!(player.current_index(), Some(2));
        assert_eq!(player.media().loads, 1);

        player.previous();
        assert_eq!(player.current_index(), Some(1));
        player.previous();
        assert_eq!(player.current_index(), Some(0));
        player.previous();
        assert_eq!(player.current_index(), Some(0));
        assert_eq!(player.media().loads, 3);
    }

    #[test]
    fn toggle_play_pause_flips_state() {
        let mut player = player_with(2);
        player.toggle_play_pause();
        assert_eq!(player.status(), PlaybackStatus::Loading);
        ready(&mut player);
        assert!(player.is_playing());

        player.toggle_play_pause();
        assert!(!player.is_playing());
        assert!(!player.media().playing);
        assert_eq!(player.status(), PlaybackStatus::Paused);

        player.toggle_play_pause();
        assert!(player.is_playing());
        assert!(player.media().playing);
        assert_eq!(player.status(), PlaybackStatus::Playing);
    }

    #[test]
    fn toggle_while_loading_cancels_autostart() {
        let mut player = player_with(2);
        player.play(0);
        player.toggle_play_pause();
        ready(&mut player);
        assert!(!player.is_playing());
        assert!(!player.media().playing);
        assert_eq!(player.status(), PlaybackStatus::Paused);
    }

    #[test]
    fn random_track_stays_in_range() {
        let mut player = player_with(5);
        for _ in 0..20 {
            player.random_track();
            let index = player.current_index().unwrap();
            assert!(index < 5);
        }
        assert_eq!(player.media().loads, 20);
    }

    #[test]
    fn repeat_flag_follows_every_track_change() {
        let mut player = player_with(3);
        player.toggle_repeat();
        assert!(player.is_repeating());
        assert!(player.media().looping);

        player.play(1);
        assert!(player.media().looping);

        player.toggle_repeat();
        assert!(!player.media().looping);
        player.next();
        assert!(!player.media().looping);
    }

    #[test]
    fn ended_without_repeat_advances() {
        let mut player = player_with(3);
        player.play(0);
        ready(&mut player);
        player.media_mut().emit(MediaEvent::Ended);
        player.tick(Instant::now());
        assert_eq!(player.current_index(), Some(1));
        assert_eq!(player.status(), PlaybackStatus::Loading);
    }

    #[test]
    fn ended_with_repeat_keeps_index() {
        let config = PlayerConfig::default()
            .with_source(PlaylistSource::Static(songs(3)))
            .repeat(true);
        let mut player = Player::mount(FakeMedia::new(), config);
        player.play(0);
        ready(&mut player);
        player.media_mut().emit(MediaEvent::Ended);
        player.tick(Instant::now());
        assert_eq!(player.current_index(), Some(0));
        assert_eq!(player.media().loads, 1);
        assert!(player.is_playing());
    }

    #[test]
    fn ended_on_last_track_stops() {
        let mut player = player_with(2);
        player.play(1);
        ready(&mut player);
        player.media_mut().emit(MediaEvent::Ended);
        player.tick(Instant::now());
        assert_eq!(player.current_index(), Some(1));
        assert!(!player.is_playing());
        assert_eq!(player.status(), PlaybackStatus::Paused);
        assert!(!player.media().playing);
        assert_eq!(player.media().calls.last().map(String::as_str), Some("pause"));
    }

    #[test]
    fn time_updates_need_listeners() {
        let mut player = player_with(2);
        player.media_mut().current_time = 10.0;
        player.media_mut().duration = 100.0;
        player.handle_media_event(MediaEvent::TimeUpdate);
        assert_eq!(player.progress(), 0.0);

        player.play(0);
        ready(&mut player);
        player.media_mut().current_time = 50.0;
        player.handle_media_event(MediaEvent::TimeUpdate);
        assert_eq!(player.progress(), 25.0);
    }

    #[test]
    fn progress_is_zero_for_unknown_duration() {
        let mut player = player_with(1);
        player.play(0);
        player.media_mut().current_time = 10.0;
        player.media_mut().duration = f64::NAN;
        player.handle_media_event(MediaEvent::TimeUpdate);
        assert_eq!(player.progress(), 0.0);
        assert_eq!(player.duration(), 0.0);
    }

    #[test]
    fn seek_half_of_200s() {
        let mut player = player_with(1);
        player.play(0);
        ready(&mut player);
        player.seek(50.0);
        assert_eq!(player.media().current_time, 100.0);
        assert_eq!(player.progress(), 50.0);
    }

    #[test]
    fn seek_without_duration_is_ignored() {
        let mut player = player_with(1);
        player.play(0);
        player.media_mut().calls.clear();
        player.seek(50.0);
        assert!(player.media().calls.is_empty());
    }

    #[test]
    fn media_error_while_loading_returns_to_idle() {
        let mut player = player_with(2);
        let rx = player.subscribe();
        player.play(1);
        player.media_mut().emit(MediaEvent::Error("decode failed".into()));
        player.tick(Instant::now());
        assert_eq!(player.status(), PlaybackStatus::Idle);
        assert!(!player.is_playing());
        assert!(
            rx.try_iter()
                .any(|e| e == PlayerEvent::MediaError("decode failed".into()))
        );
    }

    #[test]
    fn volume_is_always_clamped() {
        let mut player = player_with(1);
        for delta in [0.3, 5.0, -0.2, -100.0, f32::INFINITY, f32::NEG_INFINITY, 0.05] {
            player.adjust_volume(delta);
            let v = player.media().volume;
            assert!((0.0..=1.0).contains(&v), "volume {} after {}", v, delta);
            assert_eq!(v, player.volume());
        }
        player.adjust_volume(f32::NAN);
        assert!((0.0..=1.0).contains(&player.volume()));
    }

    #[test]
    fn volume_click_uses_small_step() {
        let mut player = player_with(1);
        player.volume_click(true);
        assert!((player.volume() - 0.55).abs() < 1e-6);
        player.volume_click(false);
        player.volume_click(false);
        assert!((player.volume() - 0.45).abs() < 1e-6);
    }

    #[test]
    fn restarting_continuous_adjust_keeps_one_timer() {
        let mut player = player_with(1);
        let start = Instant::now();
        player.start_continuous_adjust_at(0.1, start);
        player.start_continuous_adjust_at(0.1, start);
        assert!(player.is_adjusting_volume());

        player.tick(start + Duration::from_millis(100));
        assert!((player.volume() - 0.6).abs() < 1e-6);

        player.tick(start + Duration::from_millis(200));
        assert!((player.volume() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn new_continuous_adjust_replaces_direction() {
        let mut player = player_with(1);
        let start = Instant::now();
        player.start_continuous_adjust_at(0.1, start);
        player.start_continuous_adjust_at(-0.1, start);
        player.tick(start + Duration::from_millis(100));
        assert!((player.volume() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn stop_continuous_adjust_is_idempotent() {
        let mut player = player_with(1);
        let start = Instant::now();
        player.start_continuous_adjust_at(0.1, start);
        player.stop_continuous_adjust();
        player.stop_continuous_adjust();
        assert!(!player.is_adjusting_volume());
        assert_eq!(player.next_timer_due(), None);

        player.tick(start + Duration::from_millis(500));
        assert_eq!(player.volume(), 0.5);
    }

    #[test]
    fn holding_saturates_at_full_volume() {
        let mut player = player_with(1);
        let start = Instant::now();
        player.volume_hold(true);
        for i in 1..=20u32 {
            player.tick(start + Duration::from_millis(100) * i + Duration::from_millis(5));
        }
        assert_eq!(player.volume(), 1.0);
    }

    #[test]
    fn subscribers_get_snapshot_then_changes() {
        let mut player = player_with(2);
        let rx = player.subscribe();
        let snapshot: Vec<_> = rx.try_iter().collect();
        assert!(matches!(snapshot[0], PlayerEvent::PlaylistLoaded(ref s) if s.len() == 2));
        assert!(snapshot.contains(&PlayerEvent::VolumeChanged(0.5)));

        player.toggle_repeat();
        assert_eq!(rx.try_recv().unwrap(), PlayerEvent::RepeatChanged(true));
    }

    #[test]
    fn late_subscriber_sees_current_progress() {
        let mut player = player_with(2);
        player.play(0);
        ready(&mut player);
        player.media_mut().current_time = 50.0;
        player.handle_media_event(MediaEvent::TimeUpdate);

        let rx = player.subscribe();
        let snapshot: Vec<_> = rx.try_iter().collect();
        assert!(snapshot.contains(&PlayerEvent::Progress {
            percent: 25.0,
            current: 50.0,
            duration: 200.0,
        }));
    }

    #[test]
    fn unmount_releases_timer_and_listeners() {
        let mut player = player_with(2);
        player.play(0);
        ready(&mut player);
        player.start_continuous_adjust(0.1);

        player.unmount();
        assert!(!player.is_mounted());
        assert!(!player.is_adjusting_volume());
        assert!(!player.has_listeners());
        assert!(!player.media().playing);

        // second call is harmless
        player.unmount();
    }

    #[test]
    fn fetched_playlist_is_applied_on_tick() {
        init_logger();
        let base = serve_once(
            "200 OK",
            r#"{"songs":[{"id":1,"name":"Mario Castle","url":"/sound/castle.mp3"}]}"#,
            Duration::ZERO,
        );
        let config = PlayerConfig::default().with_source(PlaylistSource::Remote {
            endpoint: format!("{}/sound/songs", base),
            base_url: base.clone(),
        });
        let mut player = Player::mount(FakeMedia::new(), config);
        assert!(player.songs().is_empty());

        tick_until(&mut player, |p| !p.is_fetching());
        assert_eq!(player.songs().len(), 1);
        assert_eq!(player.songs()[0].url, format!("{}/sound/castle.mp3", base));
        assert_eq!(player.current_index(), Some(0));
        assert_eq!(player.error(), None);
    }

    #[test]
    fn failed_fetch_leaves_empty_playlist_and_message() {
        init_logger();
        let base = serve_once("404 Not Found", "{}", Duration::ZERO);
        let config = PlayerConfig::default().with_source(PlaylistSource::Remote {
            endpoint: format!("{}/sound/songs", base),
            base_url: base,
        });
        let mut player = Player::mount(FakeMedia::new(), config);
        let rx = player.subscribe();

        tick_until(&mut player, |p| !p.is_fetching());
        assert!(player.songs().is_empty());
        assert_eq!(player.current_index(), None);
        let message = player.error().unwrap();
        assert!(message.starts_with("Error fetching songs:"), "{}", message);
        assert!(rx.try_iter().any(|e| matches!(e, PlayerEvent::PlaylistFailed(_))));

        // still interactive
        player.toggle_play_pause();
        player.next();
        player.adjust_volume(0.1);
        assert!((player.volume() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn late_playlist_after_unmount_is_discarded() {
        init_logger();
        let base = serve_once(
            "200 OK",
            r#"{"songs":[{"id":1,"name":"a","url":"/a.mp3"}]}"#,
            Duration::from_millis(200),
        );
        let config = PlayerConfig::default().with_source(PlaylistSource::Remote {
            endpoint: format!("{}/sound/songs", base),
            base_url: base,
        });
        let mut player = Player::mount(FakeMedia::new(), config);
        player.unmount();
        assert!(!player.is_fetching());

        thread::sleep(Duration::from_millis(400));
        player.tick(Instant::now());
        assert!(player.songs().is_empty());
    }

    fn remote_player(base: &str) -> Player<FakeMedia> {
        init_logger();
        let config = PlayerConfig::default().with_source(PlaylistSource::Remote {
            endpoint: format!("{}/sound/songs", base),
            base_url: base.to_string(),
        });
        Player::mount(FakeMedia::new(), config)
    }

    const THREE_SONGS: &str = r#"{"songs":[
        {"id":1,"name":"a","url":"/a.mp3"},
        {"id":2,"name":"b","url":"/b.mp3"},
        {"id":3,"name":"c","url":"/c.mp3"}
    ]}"#;

    #[test]
    fn reload_after_failure_clears_the_error() {
        let base = serve_sequence(vec![
            ("500 Internal Server Error", "{}"),
            ("200 OK", THREE_SONGS),
        ]);
        let mut player = remote_player(&base);
        tick_until(&mut player, |p| !p.is_fetching());
        assert!(player.error().is_some());

        player.reload_playlist();
        assert!(player.is_fetching());
        tick_until(&mut player, |p| !p.is_fetching());
        assert_eq!(player.error(), None);
        assert_eq!(player.songs().len(), 3);
        assert_eq!(player.current_index(), Some(0));
    }

    #[test]
    fn failed_reload_keeps_the_songs() {
        let base = serve_sequence(vec![("200 OK", THREE_SONGS), ("503 Service Unavailable", "")]);
        let mut player = remote_player(&base);
        tick_until(&mut player, |p| !p.is_fetching());
        player.play(1);
        ready(&mut player);

        player.reload_playlist();
        tick_until(&mut player, |p| !p.is_fetching());
        assert!(player.error().unwrap().contains("503"));
        assert_eq!(player.songs().len(), 3);
        assert_eq!(player.current_index(), Some(1));
        assert_eq!(player.status(), PlaybackStatus::Playing);
    }

    #[test]
    fn reload_is_ignored_while_fetching() {
        let base = serve_once("200 OK", THREE_SONGS, Duration::from_millis(200));
        let mut player = remote_player(&base);
        assert!(player.is_fetching());
        // a second request would find nobody listening
        player.reload_playlist();
        tick_until(&mut player, |p| !p.is_fetching());
        assert_eq!(player.error(), None);
        assert_eq!(player.songs().len(), 3);
    }

    #[test]
    fn reload_does_nothing_for_static_sources() {
        let mut player = player_with(2);
        player.reload_playlist();
        assert!(!player.is_fetching());
        assert_eq!(player.songs().len(), 2);
    }

    #[test]
    fn reload_that_drops_the_playing_track_stops_it() {
        let base = serve_sequence(vec![
            ("200 OK", THREE_SONGS),
            ("200 OK", r#"{"songs":[{"id":1,"name":"a","url":"/a.mp3"}]}"#),
        ]);
        let mut player = remote_player(&base);
        tick_until(&mut player, |p| !p.is_fetching());
        player.play(2);
        ready(&mut player);
        assert!(player.is_playing());

        player.reload_playlist();
        tick_until(&mut player, |p| !p.is_fetching());
        assert_eq!(player.songs().len(), 1);
        assert_eq!(player.current_index(), Some(0));
        assert_eq!(player.status(), PlaybackStatus::Idle);
        assert!(!player.is_playing());
        assert!(!player.media().playing);
        assert!(!player.has_listeners());

        // Idle toggle loads the new current track
        player.toggle_play_pause();
        assert_eq!(player.media().source.as_deref(), Some(format!("{}/a.mp3", base).as_str()));
    }

    #[test]
    fn reload_follows_the_playing_track_to_its_new_index() {
        let base = serve_sequence(vec![
            ("200 OK", THREE_SONGS),
            ("200 OK", r#"{"songs":[{"id":3,"name":"c","url":"/c.mp3"},{"id":1,"name":"a","url":"/a.mp3"}]}"#),
        ]);
        let mut player = remote_player(&base);
        tick_until(&mut player, |p| !p.is_fetching());
        player.play(2);
        ready(&mut player);

        player.reload_playlist();
        tick_until(&mut player, |p| !p.is_fetching());
        assert_eq!(player.current_index(), Some(0));
        assert_eq!(player.status(), PlaybackStatus::Playing);
        assert!(player.media().playing);

        // ended now advances from the new position
        player.media_mut().emit(MediaEvent::Ended);
        player.tick(Instant::now());
        assert_eq!(player.current_index(), Some(1));
    }
}
