// Parley — Voice recorder
//
// Wraps microphone capture for voice messages. The microphone is an
// exclusive resource: one recording at a time, gated by start/stop, and the
// device is released on every exit path (stop, failed upload, drop — the
// cpal stream closes when the handle is dropped).
//
// Samples are buffered as mono f32 at the device's native rate and encoded
// to 16-bit WAV for upload when the recording ends.

use std::io::Cursor;
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use hound::{SampleFormat, WavSpec, WavWriter};
use log::{debug, error, info};
use parking_lot::Mutex;

use crate::atoms::error::{ClientError, ClientResult};

pub struct VoiceRecorder {
    /// Live input stream while recording; `None` when idle. Dropping it
    /// stops capture and releases the device.
    stream: Option<cpal::Stream>,
    samples: Arc<Mutex<Vec<f32>>>,
    channels: u16,
    sample_rate: u32,
}

impl Default for VoiceRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceRecorder {
    pub fn new() -> Self {
        VoiceRecorder {
            stream: None,
            samples: Arc::new(Mutex::new(Vec::new())),
            channels: 1,
            sample_rate: 0,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.stream.is_some()
    }

    /// Sample rate of the last (or current) recording.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Acquire the default input device and start buffering samples.
    /// Fails if a recording is already active or no device is available.
    pub fn start(&mut self) -> ClientResult<()> {
        if self.stream.is_some() {
            return Err(ClientError::Audio("recording already in progress".into()));
        }

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| ClientError::Audio("no input device available".into()))?;
        let supported = device
            .default_input_config()
            .map_err(|e| ClientError::Audio(format!("failed to query input config: {}", e)))?;

        self.channels = supported.channels();
        self.sample_rate = supported.sample_rate().0;
        self.samples.lock().clear();

        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        let err_fn = |err| error!("[recorder] input stream error: {}", err);

        let stream = match sample_format {
            cpal::SampleFormat::F32 => {
                let samples = Arc::clone(&self.samples);
                device.build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        samples.lock().extend_from_slice(data);
                    },
                    err_fn,
                    None,
                )
            }
            cpal::SampleFormat::I16 => {
                let samples = Arc::clone(&self.samples);
                device.build_input_stream(
                    &config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        let mut buf = samples.lock();
                        buf.extend(data.iter().map(|&s| s as f32 / i16::MAX as f32));
                    },
                    err_fn,
                    None,
                )
            }
            cpal::SampleFormat::U16 => {
                let samples = Arc::clone(&self.samples);
                device.build_input_stream(
                    &config,
                    move |data: &[u16], _: &cpal::InputCallbackInfo| {
                        let mut buf = samples.lock();
                        buf.extend(
                            data.iter()
                                .map(|&s| (s as f32 - 32768.0) / 32768.0),
                        );
                    },
                    err_fn,
                    None,
                )
            }
            other => {
                return Err(ClientError::Audio(format!(
                    "unsupported input sample format: {:?}",
                    other
                )))
            }
        }
        .map_err(|e| ClientError::Audio(format!("failed to open input stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| ClientError::Audio(format!("failed to start capture: {}", e)))?;

        info!(
            "[recorder] recording started ({} Hz, {} channel(s))",
            self.sample_rate, self.channels
        );
        self.stream = Some(stream);
        Ok(())
    }

    /// Stop recording and return the captured mono samples.
    /// Calling this while idle is a no-op and returns `None`.
    pub fn stop(&mut self) -> Option<Vec<f32>> {
        let stream = self.stream.take()?;
        drop(stream); // closes the stream, releases the device

        let raw = std::mem::take(&mut *self.samples.lock());
        let mono = if self.channels > 1 {
            downmix_to_mono(&raw, self.channels)
        } else {
            raw
        };
        debug!("[recorder] recording stopped ({} samples)", mono.len());
        Some(mono)
    }

    /// Stop and discard any active recording without keeping samples.
    pub fn cancel(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            self.samples.lock().clear();
            debug!("[recorder] recording cancelled");
        }
    }
}

/// Average interleaved frames down to one channel.
fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    let channels = channels as usize;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

// ── WAV encoding ───────────────────────────────────────────────────────

/// Encode mono f32 samples as a 16-bit PCM WAV blob for upload.
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> ClientResult<Vec<u8>> {
    if samples.is_empty() {
        return Err(ClientError::Audio("no audio was recorded".into()));
    }

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut buffer = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut buffer, spec)
            .map_err(|e| ClientError::Audio(format!("failed to create WAV writer: {}", e)))?;
        for &sample in samples {
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| ClientError::Audio(format!("failed to write sample: {}", e)))?;
        }
        writer
            .finalize()
            .map_err(|e| ClientError::Audio(format!("failed to finalize WAV: {}", e)))?;
    }

    Ok(buffer.into_inner())
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_while_idle_is_a_noop() {
        let mut recorder = VoiceRecorder::new();
        assert!(!recorder.is_recording());
        assert!(recorder.stop().is_none());
        // And again — still nothing, still no panic.
        assert!(recorder.stop().is_none());
        recorder.cancel();
    }

    #[test]
    fn downmix_averages_interleaved_frames() {
        let stereo = [0.5, -0.5, 1.0, 0.0, -1.0, -1.0];
        assert_eq!(downmix_to_mono(&stereo, 2), vec![0.0, 0.5, -1.0]);
    }

    #[test]
    fn wav_blob_has_riff_header_and_expected_length() {
        let samples = vec![0.0f32; 160];
        let wav = samples_to_wav(&samples, 16_000).unwrap();
        assert_eq!(&wav[..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        // 44-byte canonical header + 2 bytes per sample.
        assert_eq!(wav.len(), 44 + samples.len() * 2);
    }

    #[test]
    fn wav_encoding_rejects_empty_clip() {
        assert!(samples_to_wav(&[], 16_000).is_err());
    }

    #[test]
    fn wav_samples_are_clamped() {
        let wav = samples_to_wav(&[2.0, -2.0], 8_000).unwrap();
        let data = &wav[44..];
        let first = i16::from_le_bytes([data[0], data[1]]);
        let second = i16::from_le_bytes([data[2], data[3]]);
        assert_eq!(first, 32767);
        assert_eq!(second, -32768);
    }
}
