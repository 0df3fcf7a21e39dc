//! HTTP relays to the voice backend
//!
//! Three black-box endpoints under one base URL:
//! - `GET  health`        readiness probe
//! - `POST groq-chat`     transcript + context → reply
//! - `POST cartesia-tts`  text → base64 audio

mod chat;
mod health;
mod synthesis;

pub use chat::{ChatExchange, ChatRelay, ChatService};
pub use health::{HealthCheck, HealthProbe, HealthStatus};
pub use synthesis::{SpeechSynthesizer, Synthesis, SynthesisRelay};

use url::Url;

use crate::config::ApiConfig;
use crate::{Error, Result};

/// Shared HTTP client and base URL for the backend relays
#[derive(Debug, Clone)]
pub struct Backend {
    client: reqwest::Client,
    base_url: Url,
}

impl Backend {
    /// Build the shared client
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        tracing::debug!(
            base_url = %config.base_url,
            timeout_secs = config.request_timeout.as_secs(),
            "backend client initialized"
        );

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Resolve an endpoint name under the base URL
    ///
    /// # Errors
    ///
    /// Returns error if the name does not form a valid URL
    pub fn endpoint(&self, name: &str) -> Result<Url> {
        self.base_url
            .join(name)
            .map_err(|e| Error::Config(format!("invalid endpoint {name}: {e}")))
    }

    /// Chat relay bound to `groq-chat`
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint URL is invalid
    pub fn chat_relay(&self) -> Result<ChatRelay> {
        Ok(ChatRelay::new(self.client.clone(), self.endpoint("groq-chat")?))
    }

    /// Synthesis relay bound to `cartesia-tts`
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint URL is invalid
    pub fn synthesis_relay(&self) -> Result<SynthesisRelay> {
        Ok(SynthesisRelay::new(
            self.client.clone(),
            self.endpoint("cartesia-tts")?,
        ))
    }

    /// Health probe bound to `health`
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint URL is invalid
    pub fn health_probe(&self) -> Result<HealthProbe> {
        Ok(HealthProbe::new(self.client.clone(), self.endpoint("health")?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_join_under_base() {
        let backend =
            Backend::new(&ApiConfig::new("http://localhost:9500/api/v1/ultra-low-latency").unwrap())
                .unwrap();

        assert_eq!(
            backend.endpoint("groq-chat").unwrap().as_str(),
            "http://localhost:9500/api/v1/ultra-low-latency/groq-chat"
        );
        assert_eq!(
            backend.endpoint("health").unwrap().as_str(),
            "http://localhost:9500/api/v1/ultra-low-latency/health"
        );
    }
}
