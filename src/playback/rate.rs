//! Playback-rate compensation and rendering
//!
//! The synthesis service emits audio at a fixed nominal rate. Playback is
//! slowed by `nominal / device` and then by a fixed damping factor, regardless
//! of the rate the decoder reports. Both constants are empirical; changing
//! either makes speech audibly wrong on devices not running at 22050 Hz.

use rubato::{FastFixedIn, PolynomialDegree, Resampler};

use super::DecodedAudio;
use crate::{Error, Result};

/// Rate the synthesis service encodes at
pub const NOMINAL_SAMPLE_RATE: u32 = 22_050;

/// Fixed damping applied after the rate ratio
pub const RATE_DAMPING: f64 = 0.95;

const CHUNK_SIZE: usize = 1024;

/// Playback rate for an output device running at `output_rate` Hz
#[must_use]
pub fn playback_rate(output_rate: u32) -> f64 {
    f64::from(NOMINAL_SAMPLE_RATE) / f64::from(output_rate) * RATE_DAMPING
}

/// Render decoded audio for a device, applying a playback rate
///
/// Mirrors a buffer source: samples are first brought to the device rate,
/// then stretched by `1 / rate`.
///
/// # Errors
///
/// Returns error if the rates are not positive or resampling fails
pub fn render(audio: &DecodedAudio, device_rate: u32, rate: f64) -> Result<Vec<f32>> {
    if device_rate == 0 || audio.sample_rate == 0 {
        return Err(Error::Playback(format!(
            "invalid sample rates: decoded {} Hz, device {device_rate} Hz",
            audio.sample_rate
        )));
    }
    if !rate.is_finite() || rate <= 0.0 {
        return Err(Error::Playback(format!("invalid playback rate {rate}")));
    }

    let ratio = f64::from(device_rate) / (f64::from(audio.sample_rate) * rate);
    resample(&audio.samples, ratio)
}

/// Resample mono samples by an output/input frame ratio
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn resample(samples: &[f32], ratio: f64) -> Result<Vec<f32>> {
    if samples.is_empty() || (ratio - 1.0).abs() < f64::EPSILON {
        return Ok(samples.to_vec());
    }

    let mut resampler =
        FastFixedIn::<f32>::new(ratio, 1.0, PolynomialDegree::Cubic, CHUNK_SIZE, 1)
            .map_err(|e| Error::Playback(format!("resampler init failed: {e}")))?;

    let expected = (samples.len() as f64 * ratio).ceil() as usize;
    let delay = resampler.output_delay();
    let mut output = Vec::with_capacity(expected + delay);

    let mut chunks = samples.chunks_exact(CHUNK_SIZE);
    for chunk in chunks.by_ref() {
        let wave_in: [&[f32]; 1] = [chunk];
        let frames = resampler
            .process(&wave_in[..], None)
            .map_err(|e| Error::Playback(format!("resample failed: {e}")))?;
        output.extend_from_slice(&frames[0]);
    }

    let tail = chunks.remainder();
    if !tail.is_empty() {
        let wave_in: [&[f32]; 1] = [tail];
        let frames = resampler
            .process_partial(Some(&wave_in[..]), None)
            .map_err(|e| Error::Playback(format!("resample failed: {e}")))?;
        output.extend_from_slice(&frames[0]);
    }

    // Flush what the resampler is still holding back
    while output.len() < expected + delay {
        let frames = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(|e| Error::Playback(format!("resample failed: {e}")))?;
        if frames[0].is_empty() {
            break;
        }
        output.extend_from_slice(&frames[0]);
    }

    let start = delay.min(output.len());
    let end = (start + expected).min(output.len());
    Ok(output[start..end].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_playback_rate_invariant() {
        assert_close(playback_rate(22_050), 0.95);
        assert_close(playback_rate(44_100), 0.475);
        assert_close(playback_rate(48_000), 22_050.0 / 48_000.0 * 0.95);
        assert_close(playback_rate(48_000), 0.436_406_25);
    }

    #[test]
    fn test_playback_rate_ignores_decoded_rate() {
        // Only the device rate matters
        let audio = DecodedAudio {
            samples: vec![0.0; 2205],
            sample_rate: 44_100,
            channels: 1,
        };
        let rate = playback_rate(22_050);
        let rendered = render(&audio, 22_050, rate).unwrap();
        // 2205 frames at 44.1k → 1102.5 at 22.05k → /0.95
        let expected = (2205.0_f64 * 22_050.0 / (44_100.0 * 0.95)).ceil();
        assert!((rendered.len() as f64 - expected).abs() <= 2.0);
    }

    #[test]
    fn test_render_stretches_by_inverse_rate() {
        let audio = DecodedAudio {
            samples: (0..22_050).map(|i| (i as f32 * 0.01).sin() * 0.3).collect(),
            sample_rate: 22_050,
            channels: 1,
        };

        let rendered = render(&audio, 48_000, playback_rate(48_000)).unwrap();
        // One second at 22.05k played at rate r on a 48k device lasts 1/r seconds
        let expected = 48_000.0 / playback_rate(48_000);
        let actual = rendered.len() as f64;
        assert!(
            (actual - expected).abs() / expected < 0.01,
            "expected ~{expected} frames, got {actual}"
        );
    }

    #[test]
    fn test_render_rejects_zero_device_rate() {
        let audio = DecodedAudio {
            samples: vec![0.0; 10],
            sample_rate: 22_050,
            channels: 1,
        };
        assert!(matches!(render(&audio, 0, 1.0), Err(Error::Playback(_))));
    }
}
