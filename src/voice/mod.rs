//! Voice hardware and provider bindings
//!
//! Microphone capture with energy endpointing, Whisper/Deepgram
//! transcription, and the speaker sink used by the playback engine.

mod capture;
mod endpoint;
mod microphone;
mod playback;
mod stt;

pub use capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
pub use endpoint::{EndpointState, UtteranceDetector};
pub use microphone::MicrophoneRecognizer;
pub use playback::CpalSink;
pub use stt::{SpeechToText, SttProvider, SttResult};
