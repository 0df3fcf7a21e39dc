//! Base64 payload → PCM samples

use std::io::Cursor;

use base64::Engine;

use crate::{Error, Result};

/// Mono PCM decoded from one synthesis payload
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Samples in [-1.0, 1.0], down-mixed to mono
    pub samples: Vec<f32>,

    /// Rate the decoder reports
    pub sample_rate: u32,

    /// Channel count before down-mixing
    pub channels: u16,
}

impl DecodedAudio {
    /// Duration at the decoded rate, in milliseconds
    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.samples.len() as u64 * 1000) / u64::from(self.sample_rate)
    }
}

/// Decode a base64 payload into raw container bytes
///
/// # Errors
///
/// Returns `Playback` error if the payload is not valid base64
pub fn decode_base64(audio_base64: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(audio_base64.trim())
        .map_err(|e| Error::Playback(format!("invalid base64 audio: {e}")))
}

/// Decode container bytes (MP3 or WAV) into mono PCM
///
/// # Errors
///
/// Returns `Playback` error if no audio can be decoded
pub fn decode_audio(bytes: &[u8]) -> Result<DecodedAudio> {
    let audio = if bytes.starts_with(b"RIFF") {
        decode_wav(bytes)?
    } else {
        decode_mp3(bytes)?
    };

    if audio.samples.is_empty() {
        return Err(Error::Playback("no audio frames decoded".to_string()));
    }

    Ok(audio)
}

/// Decode MP3 bytes to mono f32 samples
fn decode_mp3(mp3_data: &[u8]) -> Result<DecodedAudio> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut samples = Vec::new();
    let mut sample_rate = 0;
    let mut channels = 0;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                // First frame sets the stream format
                if sample_rate == 0 {
                    sample_rate = u32::try_from(frame.sample_rate).unwrap_or(0);
                    channels = u16::try_from(frame.channels).unwrap_or(1);
                }
                let frame_channels = frame.channels.max(1);
                samples.extend(downmix_i16(&frame.data, frame_channels));
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Playback(format!("MP3 decode error: {e}"))),
        }
    }

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels,
    })
}

/// Decode WAV bytes to mono f32 samples
fn decode_wav(wav_data: &[u8]) -> Result<DecodedAudio> {
    let mut reader = hound::WavReader::new(Cursor::new(wav_data))
        .map_err(|e| Error::Playback(format!("WAV decode error: {e}")))?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::Playback(format!("WAV decode error: {e}")))?,
        hound::SampleFormat::Int => {
            let scale = int_scale(spec.bits_per_sample);
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| int_to_f32(v, scale)))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| Error::Playback(format!("WAV decode error: {e}")))?
        }
    };

    let samples = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame_len(frame))
        .collect();

    Ok(DecodedAudio {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

fn downmix_i16(data: &[i16], channels: usize) -> Vec<f32> {
    data.chunks(channels)
        .map(|frame| {
            let sum: f32 = frame.iter().map(|&s| f32::from(s) / 32768.0).sum();
            sum / frame_len(frame)
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn frame_len<T>(frame: &[T]) -> f32 {
    frame.len().max(1) as f32
}

fn int_scale(bits_per_sample: u16) -> f32 {
    let bits = i32::from(bits_per_sample.clamp(8, 32)) - 1;
    2.0_f32.powi(bits)
}

#[allow(clippy::cast_precision_loss)]
fn int_to_f32(value: i32, scale: f32) -> f32 {
    (value as f32 / scale).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_wav_decodes_to_mono() {
        // Two stereo frames
        let bytes = wav_bytes(&[16384, 0, -16384, -16384], 22_050, 2);
        let audio = decode_audio(&bytes).unwrap();

        assert_eq!(audio.sample_rate, 22_050);
        assert_eq!(audio.channels, 2);
        assert_eq!(audio.samples.len(), 2);
        assert!((audio.samples[0] - 0.25).abs() < 1e-4);
        assert!((audio.samples[1] + 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_base64_payload_roundtrip_through_decoder() {
        let bytes = wav_bytes(&[0, 1000, -1000, 0], 22_050, 1);
        let payload = base64::engine::general_purpose::STANDARD.encode(&bytes);

        let decoded = decode_base64(&payload).unwrap();
        let audio = decode_audio(&decoded).unwrap();
        assert_eq!(audio.samples.len(), 4);
    }

    #[test]
    fn test_invalid_base64_is_playback_error() {
        let err = decode_base64("not*base64!").unwrap_err();
        assert!(matches!(err, Error::Playback(_)));
    }

    #[test]
    fn test_garbage_bytes_decode_nothing() {
        let err = decode_audio(&[0x00, 0x01, 0x02, 0x03, 0x04]).unwrap_err();
        assert!(matches!(err, Error::Playback(_)));
    }

    #[test]
    fn test_duration() {
        let audio = DecodedAudio {
            samples: vec![0.0; 11_025],
            sample_rate: 22_050,
            channels: 1,
        };
        assert_eq!(audio.duration_ms(), 500);
    }
}
