//! Speaker playback of synthesized replies

use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream};

use crate::{Error, Result};

/// Sample rate assumed when an MP3 frame does not report one
const FALLBACK_SAMPLE_RATE: u32 = 24000;

/// A running playback stream
///
/// Dropping the handle stops the audio. Replies are short, so there
/// is no pause or seek; a new turn simply supersedes the old stream.
pub struct AudioHandle {
    #[allow(dead_code)]
    stream: Stream,
    finished: Arc<AtomicBool>,
}

impl AudioHandle {
    /// Check whether the clip has played to the end
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }
}

/// Plays reply clips to the default output device
///
/// Fire-and-forget: `play_file` returns as soon as the stream is
/// running, and starting a new clip drops whatever was playing.
#[derive(Default)]
pub struct PlaybackController {
    current: Option<AudioHandle>,
}

impl PlaybackController {
    /// Create a playback controller with no active stream
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode an MP3 file and start playing it
    ///
    /// Any clip still playing is stopped first.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, decoded, or the
    /// output device cannot be opened
    pub fn play_file(&mut self, path: &Path) -> Result<()> {
        let mp3 = std::fs::read(path)?;
        let (samples, sample_rate) = decode_mp3(&mp3)?;

        tracing::debug!(
            path = %path.display(),
            samples = samples.len(),
            sample_rate,
            "starting playback"
        );

        self.stop();
        self.current = Some(start_stream(samples, sample_rate)?);
        Ok(())
    }

    /// Stop the current clip, if any
    pub fn stop(&mut self) {
        if self.current.take().is_some() {
            tracing::debug!("playback stopped");
        }
    }

    /// Check whether a clip is still playing
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.current.as_ref().is_some_and(|h| !h.is_finished())
    }
}

/// Build and start an output stream over decoded samples
fn start_stream(samples: Vec<f32>, sample_rate: u32) -> Result<AudioHandle> {
    if samples.is_empty() {
        return Err(Error::Audio("nothing to play".to_string()));
    }

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

    let supported = device
        .supported_output_configs()
        .map_err(|e| Error::Audio(e.to_string()))?
        .find(|c| {
            c.channels() <= 2
                && c.min_sample_rate() <= SampleRate(sample_rate)
                && c.max_sample_rate() >= SampleRate(sample_rate)
        })
        .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))?;

    let config = supported.with_sample_rate(SampleRate(sample_rate)).config();
    let channels = config.channels as usize;

    let samples = Arc::new(Mutex::new(samples));
    let position = Arc::new(Mutex::new(0usize));
    let finished = Arc::new(AtomicBool::new(false));
    let finished_cb = Arc::clone(&finished);

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let Ok(samples) = samples.lock() else {
                    return;
                };
                let Ok(mut pos) = position.lock() else {
                    return;
                };

                for frame in data.chunks_mut(channels) {
                    let sample = if *pos < samples.len() {
                        let s = samples[*pos];
                        *pos += 1;
                        s
                    } else {
                        finished_cb.store(true, Ordering::Relaxed);
                        0.0
                    };

                    for out in frame.iter_mut() {
                        *out = sample;
                    }
                }
            },
            |err| {
                tracing::error!(error = %err, "audio playback error");
            },
            None,
        )
        .map_err(|e| Error::Audio(e.to_string()))?;

    stream.play().map_err(|e| Error::Audio(e.to_string()))?;

    Ok(AudioHandle { stream, finished })
}

/// Decode MP3 bytes to mono f32 samples
fn decode_mp3(mp3_data: &[u8]) -> Result<(Vec<f32>, u32)> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut samples = Vec::new();
    let mut sample_rate = FALLBACK_SAMPLE_RATE;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                #[allow(clippy::cast_sign_loss)]
                if frame.sample_rate > 0 {
                    sample_rate = frame.sample_rate as u32;
                }

                if frame.channels == 2 {
                    // Stereo: average channels
                    samples.extend(frame.data.chunks(2).map(|chunk| {
                        let left = f32::from(chunk[0]) / 32768.0;
                        let right = f32::from(chunk.get(1).copied().unwrap_or(chunk[0])) / 32768.0;
                        f32::midpoint(left, right)
                    }));
                } else {
                    samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
                }
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
        }
    }

    Ok((samples, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_of_garbage_yields_no_samples() {
        // Bytes with no MP3 sync word decode to nothing
        let (samples, _) = decode_mp3(&[0x00, 0x01, 0x02, 0x03]).unwrap();
        assert!(samples.is_empty());
    }

    #[test]
    fn idle_controller_is_not_playing() {
        let controller = PlaybackController::new();
        assert!(!controller.is_playing());
    }
}
