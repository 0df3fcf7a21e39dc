//! RadiantCompass - voice companion for the rare-disease patient journey
//!
//! The library drives a voice conversation with Dr. Maya, one turn at a
//! time:
//! - Speech capture through an injected recognizer (typed text, microphone)
//! - Chat and speech-synthesis relays to the voice backend
//! - Playback with the fixed playback-rate compensation
//! - A session state machine that never lets turns overlap
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  VoiceSession                        │
//! │  Idle ⇄ Listening → Processing → Speaking → Idle     │
//! └───────┬──────────────┬───────────────┬───────────────┘
//!         │              │               │
//! ┌───────▼──────┐ ┌─────▼────────┐ ┌────▼──────────────┐
//! │ SpeechCapture│ │ Chat / TTS   │ │  PlaybackEngine   │
//! │ text │ mic   │ │ relays (HTTP)│ │ decode → rate fix │
//! └──────────────┘ └──────────────┘ └───────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod journey;
pub mod playback;
pub mod relay;
pub mod session;
pub mod speech;
pub mod symptoms;
pub mod voice;

pub use config::Config;
pub use error::{Error, FailureKind, Result};
pub use playback::{PlaybackEngine, PlaybackReport, playback_rate};
pub use relay::Backend;
pub use session::{
    PatientContext, SessionEvent, SessionOptions, SessionPhase, SessionServices, SessionState,
    Toggle, VoiceSession,
};
pub use speech::{CancelToken, SpeechCapture, SpeechRecognizer};
