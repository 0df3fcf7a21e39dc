//! Readiness probe for the voice backend

use async_trait::async_trait;
use url::Url;

use crate::{Error, Result};

/// Backend readiness as reported by the health endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
pub struct HealthStatus {
    /// Primary TTS provider configured; the backend falls back when false
    #[serde(default)]
    pub cartesia_available: bool,

    #[serde(default)]
    pub groq_available: Option<bool>,

    #[serde(default)]
    pub status: Option<String>,
}

/// A readiness check run before a session connects
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Probe the backend
    ///
    /// Any failure means the service is unavailable.
    async fn probe(&self) -> Result<HealthStatus>;
}

/// Health probe over HTTP
#[derive(Debug, Clone)]
pub struct HealthProbe {
    client: reqwest::Client,
    url: Url,
}

impl HealthProbe {
    #[must_use]
    pub const fn new(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl HealthCheck for HealthProbe {
    async fn probe(&self) -> Result<HealthStatus> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| Error::ServiceUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ServiceUnavailable(format!(
                "health endpoint returned {status}"
            )));
        }

        let health: HealthStatus = response
            .json()
            .await
            .map_err(|e| Error::ServiceUnavailable(format!("malformed health response: {e}")))?;

        if health.cartesia_available {
            tracing::info!("synthesis service available");
        } else {
            tracing::warn!("primary synthesis provider unavailable, backend will fall back");
        }

        Ok(health)
    }
}
