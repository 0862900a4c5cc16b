//! Voice processing: capture, transcription, synthesis, playback

pub mod capture;
pub mod model;
pub mod playback;
pub mod stt;
pub mod tts;

pub use capture::{AudioCapture, AudioClip, SAMPLE_RATE, samples_to_wav};
pub use model::{VoiceModelClient, VoiceModelOptions, Visibility};
pub use playback::{AudioHandle, PlaybackController};
pub use stt::SpeechTranscriber;
pub use tts::VoiceSynthesizer;
