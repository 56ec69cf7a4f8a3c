use std::{
    collections::VecDeque,
    thread,
    time::{Duration, Instant},
};

use anyhow::Context;
use crossbeam_channel::{Receiver, TryRecvError, bounded};
use rodio::{
    OutputStream, OutputStreamBuilder, Sink,
    cpal::{
        self,
        traits::{DeviceTrait, HostTrait},
    },
};

use crate::{
    media::{MediaEvent, MediaHandle},
    source::DecodedTrack,
};

/// How often a playing engine reports its position
const TIME_UPDATE_INTERVAL: Duration = Duration::from_millis(250);
/// Upper bound for a downloaded source
const MAX_SOURCE_BYTES: u64 = 64 * 1024 * 1024;
/// Give up on a download that has not finished by then
const LOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// rodio-backed media handle playing one source at a time on the default output device
pub struct AudioEngine {
    _stream: OutputStream,
    sink: Sink,
    device_name: String,
    source: Option<String>,
    loading: Option<Receiver<anyhow::Result<DecodedTrack>>>,
    track: Option<DecodedTrack>,
    wants_play: bool,
    looping: bool,
    volume: f32,
    finished: bool,
    events: VecDeque<MediaEvent>,
    last_time_update: Option<Instant>,
}

impl AudioEngine {
    pub fn try_new_default() -> anyhow::Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .context("No default output device found")?;

        let device_name = device.name().unwrap_or_else(|_| "(unknown)".to_string());

        let stream_builder = OutputStreamBuilder::from_device(device)
            .context("cannot create output stream builder from device")?;

        let stream = stream_builder.open_stream().context("Cannot create stream output")?;

        let sink = Sink::connect_new(stream.mixer());
        sink.pause();
        log::info!("Audio output: {}", device_name);

        Ok(AudioEngine {
            _stream: stream,
            sink,
            device_name,
            source: None,
            loading: None,
            track: None,
            wants_play: false,
            looping: false,
            volume: 1.0,
            finished: false,
            events: VecDeque::new(),
            last_time_update: None,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    fn append_current(&mut self) {
        if let Some(track) = &self.track {
            self.sink.append(track.create_source());
            self.finished = false;
        }
        if self.wants_play {
            self.sink.play();
        } else {
            self.sink.pause();
        }
    }

    fn poll_loading(&mut self) {
        let Some(rx) = &self.loading else {
            return;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err(anyhow::anyhow!("loader stopped unexpectedly")),
        };
        self.loading = None;

        match result {
            Ok(track) => {
                log::info!(
                    "Source ready ({:.1}s)",
                    track.position_tracker().duration_seconds()
                );
                self.track = Some(track);
                self.append_current();
                self.events.push_back(MediaEvent::CanPlayThrough);
            }
            Err(e) => {
                log::error!("Failed to load source: {:#}", e);
                self.events.push_back(MediaEvent::Error(format!("{:#}", e)));
            }
        }
    }

    fn poll_playback(&mut self) {
        let Some(track) = &self.track else {
            return;
        };

        if self.sink.empty() {
            if self.looping {
                track.position_tracker().reset();
                self.append_current();
            } else if !self.finished {
                self.finished = true;
                self.events.push_back(MediaEvent::TimeUpdate);
                self.events.push_back(MediaEvent::Ended);
            }
            return;
        }

        if !self.wants_play {
            return;
        }
        let now = Instant::now();
        let due = self
            .last_time_update
            .is_none_or(|last| now.duration_since(last) >= TIME_UPDATE_INTERVAL);
        if due {
            self.last_time_update = Some(now);
            self.events.push_back(MediaEvent::TimeUpdate);
        }
    }
}

/// Download (or read from disk) and decode a source; runs on a loader thread
fn fetch_and_decode(url: &str, timeout: Duration) -> anyhow::Result<DecodedTrack> {
    let bytes = if url.starts_with("http://") || url.starts_with("https://") {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        let mut resp = agent
            .get(url)
            .call()
            .with_context(|| format!("request {}", url))?;
        resp.body_mut()
            .with_config()
            .limit(MAX_SOURCE_BYTES)
            .read_to_vec()
            .with_context(|| format!("read {}", url))?
    } else {
        std::fs::read(url).with_context(|| format!("Failed to open {}", url))?
    };
    DecodedTrack::decode(bytes)
}

impl MediaHandle for AudioEngine {
    fn set_source(&mut self, url: &str) {
        self.source = Some(url.to_string());
        self.loading = None;
        self.track = None;
        self.sink.clear();
        self.finished = false;
        self.events.clear();
        self.last_time_update = None;
    }

    fn load(&mut self) {
        let Some(url) = self.source.clone() else {
            return;
        };
        let (tx, rx) = bounded(1);
        thread::spawn(move || {
            log::debug!("Loading {}", url);
            let _ = tx.send(fetch_and_decode(&url, LOAD_TIMEOUT));
        });
        self.loading = Some(rx);
    }

    fn play(&mut self) {
        self.wants_play = true;
        if self.finished {
            if let Some(track) = &self.track {
                track.position_tracker().reset();
            }
            self.append_current();
        }
        self.sink.play();
    }

    fn pause(&mut self) {
        self.wants_play = false;
        self.sink.pause();
    }

    fn current_time(&self) -> f64 {
        self.track
            .as_ref()
            .map(|t| t.position_tracker().position_seconds())
            .unwrap_or(0.0)
    }

    fn set_current_time(&mut self, seconds: f64) {
        let Some(track) = &self.track else {
            return;
        };
        track.position_tracker().seek_to_seconds(seconds);
        if self.finished && !track.position_tracker().is_at_end() {
            self.append_current();
        }
    }

    fn duration(&self) -> f64 {
        self.track
            .as_ref()
            .map(|t| t.position_tracker().duration_seconds())
            .unwrap_or(f64::NAN)
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.sink.set_volume(self.volume);
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn is_looping(&self) -> bool {
        self.looping
    }

    fn poll_event(&mut self) -> Option<MediaEvent> {
        if self.events.is_empty() {
            self.poll_loading();
            self.poll_playback();
        }
        self.events.pop_front()
    }
}
