//! Playback engine
//!
//! Decodes synthesis payloads, applies the playback-rate compensation and
//! renders them to a lazily opened audio sink. One playback at a time; the
//! future returned by [`PlaybackEngine::play`] resolving is the completion
//! signal, whether the audio ran out or was stopped.

mod decode;
mod rate;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

pub use decode::{DecodedAudio, decode_audio, decode_base64};
pub use rate::{NOMINAL_SAMPLE_RATE, RATE_DAMPING, playback_rate, render};

use crate::speech::CancelToken;
use crate::{Error, Result};

/// An audio output device
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Native rate of the output device
    fn sample_rate(&self) -> u32;

    /// Play mono samples at the device rate until done or `stop` fires
    ///
    /// Returns `true` if the samples ran to the end.
    async fn play(&self, samples: Vec<f32>, stop: CancelToken) -> Result<bool>;
}

/// Opens the session's audio output on first use
pub type SinkFactory = Box<dyn Fn() -> Result<Arc<dyn AudioSink>> + Send + Sync>;

/// Outcome of one playback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackReport {
    /// Rate reported by the decoder
    pub decoded_rate: u32,

    /// Native rate of the output device
    pub device_rate: u32,

    /// Compensation applied, see [`playback_rate`]
    pub playback_rate: f64,

    /// Frames handed to the sink
    pub frames: usize,

    /// `false` if playback was stopped early
    pub completed: bool,
}

/// Plays synthesized speech for one session
pub struct PlaybackEngine {
    factory: SinkFactory,
    sink: tokio::sync::Mutex<Option<Arc<dyn AudioSink>>>,
    active: Mutex<Option<CancelToken>>,
}

impl PlaybackEngine {
    #[must_use]
    pub fn new(factory: SinkFactory) -> Self {
        Self {
            factory,
            sink: tokio::sync::Mutex::new(None),
            active: Mutex::new(None),
        }
    }

    /// Decode and play one base64 payload, resolving when playback ends
    ///
    /// # Errors
    ///
    /// Returns `Playback` error if another playback is active, the payload
    /// cannot be decoded, or the sink fails
    pub async fn play(&self, audio_base64: &str) -> Result<PlaybackReport> {
        let (_claim, stop) = self.claim()?;

        let sink = self.sink().await?;
        let device_rate = sink.sample_rate();
        let rate = playback_rate(device_rate);

        let payload = audio_base64.to_owned();
        let (decoded_rate, rendered) = tokio::task::spawn_blocking(move || {
            let audio = decode_audio(&decode_base64(&payload)?)?;
            let rendered = render(&audio, device_rate, rate)?;
            Ok::<_, Error>((audio.sample_rate, rendered))
        })
        .await
        .map_err(|e| Error::Playback(format!("decode task failed: {e}")))??;

        let frames = rendered.len();
        tracing::debug!(
            decoded_rate,
            device_rate,
            playback_rate = rate,
            frames,
            "starting playback"
        );

        let completed = sink.play(rendered, stop).await?;

        tracing::debug!(completed, "playback finished");
        Ok(PlaybackReport {
            decoded_rate,
            device_rate,
            playback_rate: rate,
            frames,
            completed,
        })
    }

    /// Stop the active playback, if any
    ///
    /// The pending [`play`](Self::play) still resolves. Returns `true` if
    /// something was playing.
    pub fn stop(&self) -> bool {
        lock(&self.active).as_ref().is_some_and(|stop| {
            stop.cancel();
            true
        })
    }

    /// Whether a playback is in flight
    #[must_use]
    pub fn is_playing(&self) -> bool {
        lock(&self.active).is_some()
    }

    /// Stop playback and release the audio output
    pub async fn close(&self) {
        self.stop();
        if self.sink.lock().await.take().is_some() {
            tracing::debug!("audio output closed");
        }
    }

    fn claim(&self) -> Result<(ActiveClaim<'_>, CancelToken)> {
        let mut active = lock(&self.active);
        if active.is_some() {
            return Err(Error::Playback("playback already in progress".to_string()));
        }
        let stop = CancelToken::new();
        *active = Some(stop.clone());
        Ok((ActiveClaim(&self.active), stop))
    }

    async fn sink(&self) -> Result<Arc<dyn AudioSink>> {
        let mut slot = self.sink.lock().await;
        if let Some(sink) = slot.as_ref() {
            return Ok(Arc::clone(sink));
        }

        let sink = (self.factory)()?;
        tracing::debug!(sample_rate = sink.sample_rate(), "audio output opened");
        *slot = Some(Arc::clone(&sink));
        Ok(sink)
    }
}

/// Clears the active slot when a playback resolves or is dropped
struct ActiveClaim<'a>(&'a Mutex<Option<CancelToken>>);

impl Drop for ActiveClaim<'_> {
    fn drop(&mut self) {
        lock(self.0).take();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
