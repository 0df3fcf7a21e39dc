//! Audio playback to speakers

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};

use crate::playback::AudioSink;
use crate::speech::CancelToken;
use crate::{Error, Result};

/// Grace period after the last sample before the stream is dropped
const DRAIN: Duration = Duration::from_millis(100);

const POLL: Duration = Duration::from_millis(20);

/// Default output device at its native rate
///
/// Streams are not `Send`, so each playback opens its stream on a blocking
/// thread.
#[derive(Debug, Clone)]
pub struct CpalSink {
    config: StreamConfig,
}

impl CpalSink {
    /// Probe the default output device
    ///
    /// # Errors
    ///
    /// Returns `Playback` error if no usable output device exists
    pub fn open() -> Result<Self> {
        let device = default_output()?;

        let native = device
            .default_output_config()
            .map_err(|e| Error::Playback(e.to_string()))?
            .sample_rate();

        let supported = device
            .supported_output_configs()
            .map_err(|e| Error::Playback(e.to_string()))?
            .find(|c| {
                c.sample_format() == cpal::SampleFormat::F32
                    && c.min_sample_rate() <= native
                    && c.max_sample_rate() >= native
            })
            .ok_or_else(|| Error::Playback("no f32 output config at native rate".to_string()))?;

        let config = supported.with_sample_rate(native).config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = config.sample_rate.0,
            channels = config.channels,
            "audio playback initialized"
        );

        Ok(Self { config })
    }

    /// Shared handle for a [`PlaybackEngine`](crate::playback::PlaybackEngine) factory
    ///
    /// # Errors
    ///
    /// Returns `Playback` error if no usable output device exists
    pub fn shared() -> Result<Arc<dyn AudioSink>> {
        Ok(Arc::new(Self::open()?))
    }
}

#[async_trait]
impl AudioSink for CpalSink {
    fn sample_rate(&self) -> u32 {
        let SampleRate(rate) = self.config.sample_rate;
        rate
    }

    async fn play(&self, samples: Vec<f32>, stop: CancelToken) -> Result<bool> {
        if samples.is_empty() {
            return Ok(true);
        }

        let config = self.config.clone();
        tokio::task::spawn_blocking(move || play_blocking(&config, samples, &stop))
            .await
            .map_err(|e| Error::Playback(format!("playback task failed: {e}")))?
    }
}

fn default_output() -> Result<cpal::Device> {
    cpal::default_host()
        .default_output_device()
        .ok_or_else(|| Error::Playback("no output device available".to_string()))
}

/// Play samples on the current thread until done or stopped
fn play_blocking(config: &StreamConfig, samples: Vec<f32>, stop: &CancelToken) -> Result<bool> {
    let device = default_output()?;
    let channels = usize::from(config.channels.max(1));
    let total = samples.len();

    let position = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicBool::new(false));
    let callback_position = Arc::clone(&position);
    let callback_finished = Arc::clone(&finished);

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let mut pos = callback_position.load(Ordering::Relaxed);
                for frame in data.chunks_mut(channels) {
                    let sample = samples.get(pos).copied().unwrap_or(0.0);
                    frame.fill(sample);
                    if pos < samples.len() {
                        pos += 1;
                    }
                }
                callback_position.store(pos, Ordering::Relaxed);
                if pos >= samples.len() {
                    callback_finished.store(true, Ordering::Release);
                }
            },
            |err| {
                tracing::error!(error = %err, "audio playback error");
            },
            None,
        )
        .map_err(|e| Error::Playback(e.to_string()))?;

    stream.play().map_err(|e| Error::Playback(e.to_string()))?;

    let duration_ms = (total as u64 * 1000) / u64::from(config.sample_rate.0.max(1));
    let timeout = Duration::from_millis(duration_ms) + Duration::from_millis(500);
    let start = Instant::now();

    let mut completed = true;
    while !finished.load(Ordering::Acquire) {
        if stop.is_cancelled() {
            completed = false;
            break;
        }
        if start.elapsed() > timeout {
            tracing::warn!(
                played = position.load(Ordering::Relaxed),
                total,
                "playback timed out"
            );
            break;
        }
        std::thread::sleep(POLL);
    }

    if completed {
        std::thread::sleep(DRAIN);
    }
    drop(stream);

    tracing::debug!(samples = total, completed, "playback complete");
    Ok(completed)
}
