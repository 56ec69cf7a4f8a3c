use std::{
    io::Cursor,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use anyhow::Context;
use rodio::{Decoder, Source};

/// Shared position tracker between the playing source and the engine
#[derive(Clone, Debug)]
pub struct PositionTracker {
    /// Current sample position (atomic for thread-safe access)
    position: Arc<AtomicUsize>,
    /// Total number of samples
    total_samples: usize,
    sample_rate: u32,
    channels: u16,
}

impl PositionTracker {
    pub fn new(total_samples: usize, sample_rate: u32, channels: u16) -> Self {
        Self {
            position: Arc::new(AtomicUsize::new(0)),
            total_samples,
            sample_rate,
            channels: channels.max(1),
        }
    }

    /// Get current position in seconds
    pub fn position_seconds(&self) -> f64 {
        let pos = self.position.load(Ordering::Relaxed);
        let frames = pos / (self.channels as usize);
        if self.sample_rate == 0 {
            return 0.0;
        }
        (frames as f64) / (self.sample_rate as f64)
    }

    /// Get total duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        let frames = self.total_samples / (self.channels as usize);
        if self.sample_rate == 0 {
            return 0.0;
        }
        (frames as f64) / (self.sample_rate as f64)
    }

    /// Set position from seconds, snapped to a frame boundary
    pub fn seek_to_seconds(&self, seconds: f64) {
        let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        let frames = (seconds * (self.sample_rate as f64)) as usize;
        let sample_pos = (frames * (self.channels as usize)).min(self.total_samples);
        self.position.store(sample_pos, Ordering::Relaxed);
    }

    /// Reset position to start
    pub fn reset(&self) {
        self.position.store(0, Ordering::Relaxed);
    }

    pub fn is_at_end(&self) -> bool {
        self.position.load(Ordering::Relaxed) >= self.total_samples
    }
}

/// A fully decoded track kept in memory so it can be replayed and seeked freely
pub struct DecodedTrack {
    samples: Arc<Vec<f32>>,
    sample_rate: u32,
    channels: u16,
    position: PositionTracker,
}

impl DecodedTrack {
    /// Decode an encoded audio file (mp3, ogg, flac, wav...) held in memory
    pub fn decode(bytes: Vec<u8>) -> anyhow::Result<Self> {
        let start_time = Instant::now();

        let decoder =
            Decoder::new(Cursor::new(bytes)).context("Failed to decode the audio source")?;
        let sample_rate = decoder.sample_rate();
        let channels = decoder.channels();

        log::debug!("Starting full decode with rodio.");
        let samples: Vec<f32> = decoder.collect();
        log::debug!(
            "Decoded {} samples ({} Hz, {} ch) in {:?}",
            samples.len(),
            sample_rate,
            channels,
            start_time.elapsed()
        );

        Ok(Self::from_samples(samples, sample_rate, channels))
    }

    pub fn from_samples(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        let position = PositionTracker::new(samples.len(), sample_rate, channels);
        Self {
            samples: Arc::new(samples),
            sample_rate,
            channels,
            position,
        }
    }

    pub fn position_tracker(&self) -> &PositionTracker {
        &self.position
    }

    /// Create a rodio Source reading from the shared buffer at the tracked position
    pub fn create_source(&self) -> BufferedSource {
        BufferedSource {
            samples: Arc::clone(&self.samples),
            sample_rate: self.sample_rate,
            channels: self.channels,
            position: self.position.clone(),
        }
    }
}

/// A buffered audio source that implements rodio's Source trait
pub struct BufferedSource {
    samples: Arc<Vec<f32>>,
    sample_rate: u32,
    channels: u16,
    position: PositionTracker,
}

impl Iterator for BufferedSource {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let pos = self.position.position.load(Ordering::Relaxed);
        let sample = self.samples.get(pos).copied()?;
        self.position.position.store(pos + 1, Ordering::Relaxed);
        Some(sample)
    }
}

impl Source for BufferedSource {
    fn current_span_len(&self) -> Option<usize> {
        let pos = self.position.position.load(Ordering::Relaxed);
        Some(self.samples.len().saturating_sub(pos))
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f64(self.position.duration_seconds()))
    }
}
