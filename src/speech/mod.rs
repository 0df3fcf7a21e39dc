//! Speech capture
//!
//! Transcribes one utterance at a time through an injected recognizer.
//! The recognizer decides where audio comes from (typed text, microphone +
//! STT, a test double); capture only enforces single-shot semantics and
//! explicit cancellation.

mod cancel;
mod text;

use std::sync::Arc;

use async_trait::async_trait;

pub use cancel::CancelToken;
pub use text::TextRecognizer;

use crate::{Error, Result};

/// Recognition settings: one utterance, final results only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionSettings {
    pub continuous: bool,
    pub interim_results: bool,
    pub locale: String,
    pub max_alternatives: u8,
}

impl RecognitionSettings {
    /// Single-utterance, final-only settings for a locale
    #[must_use]
    pub fn single_utterance(locale: &str) -> Self {
        Self {
            continuous: false,
            interim_results: false,
            locale: locale.to_string(),
            max_alternatives: 1,
        }
    }
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self::single_utterance("en-US")
    }
}

/// Top recognition hypothesis for one utterance
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub text: String,
    pub confidence: Option<f32>,
}

impl Transcript {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: None,
        }
    }
}

/// A speech recognition capability
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Check that the capability exists and is permitted
    ///
    /// Default implementation assumes it is always available.
    async fn check_available(&self) -> Result<()> {
        Ok(())
    }

    /// Recognize one utterance
    ///
    /// Implementations may watch `cancel` to release resources early; the
    /// caller stops waiting as soon as it fires either way.
    async fn recognize(
        &self,
        settings: &RecognitionSettings,
        cancel: &CancelToken,
    ) -> Result<Transcript>;
}

/// Single-shot speech capture over an injected recognizer
#[derive(Clone)]
pub struct SpeechCapture {
    recognizer: Arc<dyn SpeechRecognizer>,
    settings: RecognitionSettings,
}

impl SpeechCapture {
    #[must_use]
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>, settings: RecognitionSettings) -> Self {
        Self {
            recognizer,
            settings,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &RecognitionSettings {
        &self.settings
    }

    /// Capability detection, run before a session connects
    ///
    /// # Errors
    ///
    /// Returns `SpeechUnavailable` if the recognizer cannot be used
    pub async fn check_available(&self) -> Result<()> {
        self.recognizer
            .check_available()
            .await
            .map_err(into_speech_unavailable)
    }

    /// Capture one utterance
    ///
    /// Returns `Ok(None)` if `cancel` fired before a transcript arrived.
    ///
    /// # Errors
    ///
    /// Returns `SpeechUnavailable` if recognition failed or heard nothing
    pub async fn listen(&self, cancel: &CancelToken) -> Result<Option<Transcript>> {
        if cancel.is_cancelled() {
            return Ok(None);
        }

        tracing::debug!(
            recognizer = self.recognizer.name(),
            locale = %self.settings.locale,
            "listening"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!("capture cancelled");
                Ok(None)
            }
            result = self.recognizer.recognize(&self.settings, cancel) => {
                let transcript = result.map_err(into_speech_unavailable)?;
                let text = transcript.text.trim();
                if text.is_empty() {
                    return Err(Error::SpeechUnavailable("no speech detected".to_string()));
                }

                tracing::info!(transcript = %text, "speech recognized");
                Ok(Some(Transcript {
                    text: text.to_string(),
                    confidence: transcript.confidence,
                }))
            }
        }
    }
}

fn into_speech_unavailable(err: Error) -> Error {
    match err {
        Error::SpeechUnavailable(_) => err,
        other => Error::SpeechUnavailable(other.to_string()),
    }
}
