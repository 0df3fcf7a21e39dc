//! Utterance endpointing
//!
//! Decides when a single spoken utterance has ended using RMS energy: speech
//! starts above a threshold and ends after a run of silence.

use std::time::Duration;

/// Minimum RMS energy to count as speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Shortest utterance worth transcribing
const MIN_SPEECH: Duration = Duration::from_millis(300);

/// Trailing silence that ends an utterance
const END_SILENCE: Duration = Duration::from_millis(800);

/// Endpointer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointState {
    /// Waiting for speech
    Waiting,
    /// Speech detected, accumulating
    InSpeech,
    /// Speech followed by enough silence
    Complete,
}

/// Detects the end of one utterance in a live sample stream
#[derive(Debug)]
pub struct UtteranceDetector {
    state: EndpointState,
    speech_buffer: Vec<f32>,
    silence_counter: usize,
    min_speech_samples: usize,
    end_silence_samples: usize,
}

impl UtteranceDetector {
    /// Create a detector for samples at `sample_rate`
    #[must_use]
    pub fn new(sample_rate: u32) -> Self {
        Self {
            state: EndpointState::Waiting,
            speech_buffer: Vec::new(),
            silence_counter: 0,
            min_speech_samples: samples_for(MIN_SPEECH, sample_rate),
            end_silence_samples: samples_for(END_SILENCE, sample_rate),
        }
    }

    /// Feed a block of samples; returns `true` once the utterance is complete
    pub fn process(&mut self, samples: &[f32]) -> bool {
        let energy = calculate_energy(samples);
        let is_speech = energy > ENERGY_THRESHOLD;

        match self.state {
            EndpointState::Waiting => {
                if is_speech {
                    self.state = EndpointState::InSpeech;
                    self.speech_buffer.clear();
                    self.speech_buffer.extend_from_slice(samples);
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech detected");
                }
            }
            EndpointState::InSpeech => {
                self.speech_buffer.extend_from_slice(samples);

                if is_speech {
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                if self.silence_counter > self.end_silence_samples {
                    if self.speech_buffer.len() > self.min_speech_samples + self.silence_counter {
                        tracing::debug!(samples = self.speech_buffer.len(), "utterance complete");
                        self.state = EndpointState::Complete;
                    } else {
                        // A click or cough, not speech
                        tracing::trace!("speech too short, resetting");
                        self.reset();
                    }
                }
            }
            EndpointState::Complete => {}
        }

        self.state == EndpointState::Complete
    }

    /// Whether any speech has been heard yet
    #[must_use]
    pub fn heard_speech(&self) -> bool {
        self.state != EndpointState::Waiting
    }

    /// Take the captured utterance and reset
    pub fn take_utterance(&mut self) -> Vec<f32> {
        let utterance = std::mem::take(&mut self.speech_buffer);
        self.reset();
        utterance
    }

    /// Reset to waiting
    pub fn reset(&mut self) {
        self.state = EndpointState::Waiting;
        self.speech_buffer.clear();
        self.silence_counter = 0;
    }

    #[must_use]
    pub const fn state(&self) -> EndpointState {
        self.state
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn samples_for(duration: Duration, sample_rate: u32) -> usize {
    (duration.as_secs_f64() * f64::from(sample_rate)) as usize
}

/// RMS energy of audio samples
#[allow(clippy::cast_precision_loss)]
fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
