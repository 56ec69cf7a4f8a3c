/// Transport state of the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display)]
pub enum PlaybackStatus {
    /// Nothing loaded yet
    #[default]
    Idle,
    /// Source assigned, waiting for the media handle to be ready
    Loading,
    Playing,
    Paused,
}

fn known(seconds: f64) -> Option<f64> {
    (seconds.is_finite() && seconds > 0.0).then_some(seconds)
}

/// Playback position as a percentage of the duration, 0 when the duration is unknown
pub fn percent(current: f64, duration: f64) -> f64 {
    match known(duration) {
        Some(duration) if current.is_finite() => (current / duration * 100.0).clamp(0.0, 100.0),
        _ => 0.0,
    }
}

/// Time in seconds a seek to `percent` lands on, `None` when the duration is unknown
pub fn seek_target(percent: f64, duration: f64) -> Option<f64> {
    let duration = known(duration)?;
    let percent = if percent.is_nan() { 0.0 } else { percent.clamp(0.0, 100.0) };
    Some(percent / 100.0 * duration)
}

/// Format seconds as `m:ss`
pub fn format_time(seconds: f64) -> String {
    let seconds = if seconds.is_finite() && seconds > 0.0 { seconds } else { 0.0 };
    let mins = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    format!("{}:{:02}", mins, secs)
}
