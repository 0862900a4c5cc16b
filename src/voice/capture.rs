//! Microphone capture for spoken questions

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};

use crate::{Error, Result};

/// Sample rate for audio capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// Filename for the captured question inside the cache directory
const CLIP_FILENAME: &str = "question.wav";

/// A finished recording on disk, ready for transcription
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Path to the WAV file
    pub path: PathBuf,
    /// Recording length in milliseconds
    pub duration_ms: u64,
}

/// Captures audio from the default input device
///
/// One recording session at a time: `start` tears down any session
/// left over from a previous turn, `stop` finalizes the clip to disk.
pub struct AudioCapture {
    cache_dir: PathBuf,
    config: Option<StreamConfig>,
    buffer: Arc<Mutex<Vec<f32>>>,
    stream: Option<Stream>,
    started_at: Option<Instant>,
}

impl AudioCapture {
    /// Create a capture instance writing clips under `cache_dir`
    #[must_use]
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
            config: None,
            buffer: Arc::new(Mutex::new(Vec::new())),
            stream: None,
            started_at: None,
        }
    }

    /// Start a new recording session
    ///
    /// Any session still open from a previous turn is discarded first;
    /// teardown failures are swallowed so a stale stream can never
    /// block a fresh recording.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Permission`] when no input device is available
    /// (on desktop platforms this is how a denied microphone shows up)
    /// and [`Error::Audio`] when the stream cannot be opened.
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            tracing::debug!("discarding stale capture session");
            self.stream = None;
            self.started_at = None;
        }
        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }

        let host = cpal::default_host();
        let device = host.default_input_device().ok_or_else(|| {
            Error::Permission("no input device available (microphone access denied?)".to_string())
        })?;

        let config = match &self.config {
            Some(config) => config.clone(),
            None => {
                let supported = device
                    .supported_input_configs()
                    .map_err(|e| Error::Audio(e.to_string()))?
                    .find(|c| {
                        c.channels() == 1
                            && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                            && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
                    })
                    .ok_or_else(|| Error::Audio("no suitable audio config found".to_string()))?;

                let config = supported.with_sample_rate(SampleRate(SAMPLE_RATE)).config();
                self.config = Some(config.clone());
                config
            }
        };

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            "starting capture"
        );

        let buffer = Arc::clone(&self.buffer);
        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        self.stream = Some(stream);
        self.started_at = Some(Instant::now());

        Ok(())
    }

    /// Stop the current session and write the clip to disk
    ///
    /// Returns `Ok(None)` when no session is active, so a double
    /// release is harmless.
    ///
    /// # Errors
    ///
    /// Returns error if WAV encoding or the file write fails
    pub fn stop(&mut self) -> Result<Option<AudioClip>> {
        let Some(stream) = self.stream.take() else {
            return Ok(None);
        };
        drop(stream);

        let duration_ms = self
            .started_at
            .take()
            .map(|t| u64::try_from(t.elapsed().as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);

        let samples = self
            .buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default();

        let wav = samples_to_wav(&samples, SAMPLE_RATE)?;
        std::fs::create_dir_all(&self.cache_dir)?;
        let path = self.cache_dir.join(CLIP_FILENAME);
        std::fs::write(&path, wav)?;

        tracing::debug!(
            path = %path.display(),
            duration_ms,
            samples = samples.len(),
            "capture stopped"
        );

        Ok(Some(AudioClip { path, duration_ms }))
    }

    /// Check if a recording session is active
    #[must_use]
    pub const fn is_recording(&self) -> bool {
        self.stream.is_some()
    }
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
            // Convert f32 [-1.0, 1.0] to i16
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
    fn wav_header_present() {
        let samples = vec![0.0_f32; 160];
        let wav = samples_to_wav(&samples, SAMPLE_RATE).unwrap();
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
    }

    #[test]
    fn wav_clamps_out_of_range_samples() {
        let samples = vec![2.0_f32, -2.0];
        let wav = samples_to_wav(&samples, SAMPLE_RATE).unwrap();
        assert!(!wav.is_empty());
    }

    #[test]
    fn stop_without_start_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut capture = AudioCapture::new(dir.path());
        assert!(capture.stop().unwrap().is_none());
        assert!(!capture.is_recording());
    }
}
