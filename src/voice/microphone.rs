//! Microphone recognizer: cpal capture, endpointing, cloud STT

use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::capture::{AudioCapture, samples_to_wav};
use super::endpoint::UtteranceDetector;
use super::stt::SpeechToText;
use crate::speech::{CancelToken, RecognitionSettings, SpeechRecognizer, Transcript};
use crate::{Error, Result};

const POLL: Duration = Duration::from_millis(50);

/// Recognizes one spoken utterance from the default microphone
pub struct MicrophoneRecognizer {
    stt: SpeechToText,
    max_wait: Duration,
    max_utterance: Duration,
}

impl MicrophoneRecognizer {
    #[must_use]
    pub const fn new(stt: SpeechToText) -> Self {
        Self {
            stt,
            max_wait: Duration::from_secs(8),
            max_utterance: Duration::from_secs(30),
        }
    }

    /// How long to wait for speech to start before giving up
    #[must_use]
    pub const fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }
}

#[async_trait]
impl SpeechRecognizer for MicrophoneRecognizer {
    fn name(&self) -> &'static str {
        "microphone"
    }

    async fn check_available(&self) -> Result<()> {
        tokio::task::spawn_blocking(|| AudioCapture::new().map(drop))
            .await
            .map_err(|e| Error::SpeechUnavailable(e.to_string()))?
    }

    async fn recognize(
        &self,
        settings: &RecognitionSettings,
        cancel: &CancelToken,
    ) -> Result<Transcript> {
        tracing::debug!(
            locale = %settings.locale,
            provider = self.stt.provider().as_str(),
            "listening on microphone"
        );

        let cancel = cancel.clone();
        let (max_wait, max_utterance) = (self.max_wait, self.max_utterance);
        let recorded =
            tokio::task::spawn_blocking(move || record_utterance(&cancel, max_wait, max_utterance))
                .await
                .map_err(|e| Error::SpeechUnavailable(e.to_string()))??;

        let Some((samples, sample_rate)) = recorded else {
            return Err(Error::SpeechUnavailable("capture cancelled".to_string()));
        };

        let wav = samples_to_wav(&samples, sample_rate)?;
        let result = self.stt.transcribe(&wav).await?;

        Ok(Transcript {
            text: result.text,
            confidence: result.confidence,
        })
    }
}

/// Record until the utterance ends; `None` if cancelled
fn record_utterance(
    cancel: &CancelToken,
    max_wait: Duration,
    max_utterance: Duration,
) -> Result<Option<(Vec<f32>, u32)>> {
    let mut capture = AudioCapture::new()?;
    let sample_rate = capture.sample_rate();
    let mut detector = UtteranceDetector::new(sample_rate);

    capture.start()?;
    let started = Instant::now();

    loop {
        std::thread::sleep(POLL);

        if cancel.is_cancelled() {
            return Ok(None);
        }

        let chunk = capture.take_buffer();
        if !chunk.is_empty() && detector.process(&chunk) {
            break;
        }

        let elapsed = started.elapsed();
        if !detector.heard_speech() && elapsed > max_wait {
            return Err(Error::SpeechUnavailable("no speech detected".to_string()));
        }
        if elapsed > max_wait + max_utterance {
            tracing::debug!("utterance hit length cap");
            break;
        }
    }

    capture.stop();
    let utterance = detector.take_utterance();
    if utterance.is_empty() {
        return Err(Error::SpeechUnavailable("no speech detected".to_string()));
    }

    tracing::debug!(samples = utterance.len(), sample_rate, "utterance recorded");
    Ok(Some((utterance, sample_rate)))
}
