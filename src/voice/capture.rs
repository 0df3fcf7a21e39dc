//! Audio capture from microphone

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SampleRate, SizedSample, Stream, StreamConfig};

use crate::{Error, Result};

/// Preferred capture rate for speech
pub const SAMPLE_RATE: u32 = 16000;

/// Captures mono audio from the default input device
///
/// Holds a live cpal stream, so it stays on the thread that created it.
pub struct AudioCapture {
    device: Device,
    config: StreamConfig,
    format: SampleFormat,
    buffer: Arc<Mutex<Vec<f32>>>,
    stream: Option<Stream>,
}

impl AudioCapture {
    /// Open the default input device
    ///
    /// Prefers 16 kHz f32; falls back to the device's default config, whose
    /// integer samples are converted in the stream callback.
    ///
    /// # Errors
    ///
    /// Returns `SpeechUnavailable` if there is no usable input device
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::SpeechUnavailable("no input device available".to_string()))?;

        let preferred = device
            .supported_input_configs()
            .map_err(|e| Error::SpeechUnavailable(e.to_string()))?
            .find(|c| {
                c.sample_format() == SampleFormat::F32
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .map(|c| c.with_sample_rate(SampleRate(SAMPLE_RATE)));

        let supported = match preferred {
            Some(config) => config,
            None => device
                .default_input_config()
                .map_err(|e| Error::SpeechUnavailable(e.to_string()))?,
        };
        let format = supported.sample_format();
        if !is_supported_format(format) {
            return Err(Error::SpeechUnavailable(format!(
                "unsupported input sample format {format}"
            )));
        }
        let config = supported.config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = config.sample_rate.0,
            channels = config.channels,
            format = %format,
            "audio capture initialized"
        );

        Ok(Self {
            device,
            config,
            format,
            buffer: Arc::new(Mutex::new(Vec::new())),
            stream: None,
        })
    }

    /// Start capturing audio
    ///
    /// # Errors
    ///
    /// Returns `SpeechUnavailable` if the stream cannot be started, which is
    /// how a denied microphone permission surfaces
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let stream = match self.format {
            SampleFormat::I16 => self.build_stream::<i16>(),
            SampleFormat::U16 => self.build_stream::<u16>(),
            _ => self.build_stream::<f32>(),
        }?;

        stream
            .play()
            .map_err(|e| Error::SpeechUnavailable(e.to_string()))?;
        self.stream = Some(stream);

        tracing::debug!("audio capture started");
        Ok(())
    }

    fn build_stream<T>(&self) -> Result<Stream>
    where
        T: SizedSample,
        f32: FromSample<T>,
    {
        let buffer = Arc::clone(&self.buffer);
        let channels = usize::from(self.config.channels.max(1));

        self.device
            .build_input_stream(
                &self.config,
                move |data: &[T], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend(data.chunks(channels).map(mono));
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| Error::SpeechUnavailable(e.to_string()))
    }

    /// Stop capturing audio
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            tracing::debug!("audio capture stopped");
        }
    }

    /// Take the samples captured since the last call
    #[must_use]
    pub fn take_buffer(&self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }

    /// Check if currently capturing
    #[must_use]
    pub const fn is_capturing(&self) -> bool {
        self.stream.is_some()
    }

    /// Rate of the captured (mono) samples
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Formats the capture callback can convert to f32
const fn is_supported_format(format: SampleFormat) -> bool {
    matches!(format, SampleFormat::F32 | SampleFormat::I16 | SampleFormat::U16)
}

/// Average one interleaved frame down to a single f32 sample
#[allow(clippy::cast_precision_loss)]
fn mono<T>(frame: &[T]) -> f32
where
    T: Copy,
    f32: FromSample<T>,
{
    frame.iter().map(|s| f32::from_sample_(*s)).sum::<f32>() / frame.len().max(1) as f32
}

/// Convert f32 samples to WAV bytes for STT APIs
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_to_wav_header_and_length() {
        let samples = vec![0.0, 0.5, -0.5, 1.0];
        let wav = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

        assert_eq!(&wav[..4], b"RIFF");
        let reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().sample_rate, SAMPLE_RATE);
        assert_eq!(reader.len(), 4);
    }

    #[test]
    fn test_mono_averages_channels() {
        assert!((mono(&[0.5_f32, -0.5]) - 0.0).abs() < f32::EPSILON);
        assert!((mono(&[0.25_f32]) - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_integer_frames_are_normalized() {
        assert!(mono(&[0_i16, 0]).abs() < f32::EPSILON);
        assert!((mono(&[i16::MIN, i16::MIN]) + 1.0).abs() < f32::EPSILON);
        assert!((mono(&[i16::MAX]) - 1.0).abs() < 1e-4);

        assert!(mono(&[32768_u16]).abs() < f32::EPSILON);
        assert!((mono(&[0_u16, 0]) + 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_supported_formats() {
        assert!(is_supported_format(SampleFormat::F32));
        assert!(is_supported_format(SampleFormat::I16));
        assert!(is_supported_format(SampleFormat::U16));
        assert!(!is_supported_format(SampleFormat::I32));
        assert!(!is_supported_format(SampleFormat::F64));
    }
}
