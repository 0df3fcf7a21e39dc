//! Chat relay: transcript + context → reply

use std::time::{Duration, Instant};

use async_trait::async_trait;
use url::Url;

use crate::session::RelayContext;
use crate::session::turn::duration_ms;
use crate::{Error, Result};

/// Reply from one chat round-trip
#[derive(Debug, Clone, PartialEq)]
pub struct ChatExchange {
    /// Assistant reply text
    pub reply: String,

    /// Wall-clock time from dispatch to parsed response, measured here
    pub latency: Duration,

    /// Latency the server claims; logged only, never surfaced
    pub server_latency_ms: Option<f64>,
}

impl ChatExchange {
    #[must_use]
    pub fn latency_ms(&self) -> u64 {
        duration_ms(self.latency)
    }
}

/// A chat round-trip service
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Send one transcript with the session context
    async fn send(&self, transcript: &str, context: &RelayContext<'_>) -> Result<ChatExchange>;
}

/// Chat relay over HTTP
#[derive(Debug, Clone)]
pub struct ChatRelay {
    client: reqwest::Client,
    url: Url,
}

#[derive(serde::Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    patient_name: &'a str,
    context: &'a RelayContext<'a>,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    response: String,
    #[serde(default)]
    latency_ms: Option<f64>,
}

impl ChatRelay {
    #[must_use]
    pub const fn new(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl ChatService for ChatRelay {
    async fn send(&self, transcript: &str, context: &RelayContext<'_>) -> Result<ChatExchange> {
        let request = ChatRequest {
            message: transcript,
            patient_name: &context.patient.patient_name,
            context,
        };

        tracing::debug!(chars = transcript.len(), "sending chat relay request");
        let started = Instant::now();

        let response = self
            .client
            .post(self.url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "chat relay request failed");
                Error::Relay(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "chat relay error");
            return Err(Error::Relay(format!("chat endpoint returned {status}")));
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse chat response");
            Error::Relay(format!("malformed chat response: {e}"))
        })?;
        let latency = started.elapsed();

        tracing::info!(
            latency_ms = duration_ms(latency),
            server_latency_ms = ?body.latency_ms,
            "chat relay complete"
        );

        Ok(ChatExchange {
            reply: body.response,
            latency,
            server_latency_ms: body.latency_ms,
        })
    }
}
