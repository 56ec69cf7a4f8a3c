/// Signals emitted by a media handle
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Playback position moved
    TimeUpdate,
    /// The current source played to its end (never emitted while looping)
    Ended,
    /// The loaded source can play through without stalling
    CanPlayThrough,
    /// The source could not be fetched or decoded
    Error(String),
}

/// The playback capability the player drives.
///
/// Audio fetching and decoding live entirely behind this trait. Implementors
/// queue their events and hand them out through [`MediaHandle::poll_event`],
/// which the player drains from its tick.
pub trait MediaHandle {
    /// Assign a new source. Events still queued for the previous source are discarded.
    fn set_source(&mut self, url: &str);

    /// Begin loading the current source; `CanPlayThrough` follows once ready
    fn load(&mut self);

    fn play(&mut self);

    fn pause(&mut self);

    /// Playback position in seconds
    fn current_time(&self) -> f64;

    /// Reposition playback, in seconds
    fn set_current_time(&mut self, seconds: f64);

    /// Duration in seconds, `f64::NAN` while unknown
    fn duration(&self) -> f64;

    fn volume(&self) -> f32;

    fn set_volume(&mut self, volume: f32);

    fn set_looping(&mut self, looping: bool);

    fn is_looping(&self) -> bool;

    /// Next pending event, if any
    fn poll_event(&mut self) -> Option<MediaEvent>;
}
