//! Speech synthesis relay: reply text → base64 audio

use async_trait::async_trait;
use url::Url;

use crate::{Error, Result};

/// Audio for one assistant reply
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    /// Base64 (standard alphabet) encoded audio container
    pub audio_base64: String,

    /// Latency reported by the synthesis service
    pub reported_latency_ms: Option<f64>,
}

/// A text-to-speech service
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize one reply; no batching, no partial results
    async fn synthesize(&self, text: &str) -> Result<Synthesis>;
}

/// Synthesis relay over HTTP
#[derive(Debug, Clone)]
pub struct SynthesisRelay {
    client: reqwest::Client,
    url: Url,
}

#[derive(serde::Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
}

#[derive(serde::Deserialize)]
struct TtsResponse {
    #[serde(default)]
    audio_base64: Option<String>,
    #[serde(default)]
    latency_ms: Option<f64>,
}

impl SynthesisRelay {
    #[must_use]
    pub const fn new(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl SpeechSynthesizer for SynthesisRelay {
    async fn synthesize(&self, text: &str) -> Result<Synthesis> {
        tracing::debug!(chars = text.len(), "requesting speech synthesis");

        let response = self
            .client
            .post(self.url.clone())
            .json(&TtsRequest { text })
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "synthesis request failed");
                Error::Synthesis(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "synthesis error");
            return Err(Error::Synthesis(format!(
                "synthesis endpoint returned {status}"
            )));
        }

        let body: TtsResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse synthesis response");
            Error::Synthesis(format!("malformed synthesis response: {e}"))
        })?;

        let audio_base64 = body
            .audio_base64
            .filter(|audio| !audio.is_empty())
            .ok_or_else(|| Error::Synthesis("response missing audio_base64".to_string()))?;

        tracing::info!(
            audio_chars = audio_base64.len(),
            reported_latency_ms = ?body.latency_ms,
            "synthesis complete"
        );

        Ok(Synthesis {
            audio_base64,
            reported_latency_ms: body.latency_ms,
        })
    }
}
