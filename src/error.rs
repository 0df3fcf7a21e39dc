//! Error types for the RadiantCompass voice pipeline

use serde::Serialize;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the voice pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// Speech recognition capability missing, denied, or heard nothing
    #[error("speech unavailable: {0}")]
    SpeechUnavailable(String),

    /// Health probe failed at connect time
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Chat round-trip failed
    #[error("relay error: {0}")]
    Relay(String),

    /// Speech synthesis round-trip failed
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Audio decode or playback failed
    #[error("playback error: {0}")]
    Playback(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text provider error
    #[error("STT error: {0}")]
    Stt(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Failure categories recorded on the session when a step goes wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Capture could not produce a transcript
    SpeechUnavailable,
    /// Backend not reachable at connect time
    ServiceUnavailable,
    /// Chat relay failed
    Relay,
    /// Synthesis relay failed
    Synthesis,
    /// Decode or playback failed
    Playback,
}

impl Error {
    /// Map this error onto the session failure taxonomy
    ///
    /// Device and provider errors surface where they happen: audio device
    /// problems during capture and STT failures count as speech being
    /// unavailable, everything transport-level without context is a relay
    /// failure.
    #[must_use]
    pub const fn failure_kind(&self) -> FailureKind {
        match self {
            Self::SpeechUnavailable(_) | Self::Stt(_) | Self::Audio(_) => {
                FailureKind::SpeechUnavailable
            }
            Self::ServiceUnavailable(_) | Self::Config(_) => FailureKind::ServiceUnavailable,
            Self::Synthesis(_) => FailureKind::Synthesis,
            Self::Playback(_) => FailureKind::Playback,
            Self::Relay(_)
            | Self::Io(_)
            | Self::Http(_)
            | Self::Serialization(_)
            | Self::Toml(_) => FailureKind::Relay,
        }
    }
}
