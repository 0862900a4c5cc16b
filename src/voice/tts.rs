//! Text-to-speech in a chef's voice

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Error, Result};

/// Filename for the synthesized reply inside the cache directory
///
/// Each turn overwrites the previous reply; only the most recent one
/// is ever played back.
const REPLY_FILENAME: &str = "tts.mp3";

/// Request body for the Fish Audio TTS endpoint
#[derive(serde::Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    reference_id: &'a str,
    format: &'a str,
}

/// Synthesizes reply text into audio via Fish Audio
pub struct VoiceSynthesizer {
    client: reqwest::Client,
    api_key: String,
    format: String,
    cache_dir: PathBuf,
}

impl VoiceSynthesizer {
    /// Create a new synthesizer writing replies under `cache_dir`
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client
    /// cannot be built
    pub fn new(
        api_key: String,
        format: String,
        cache_dir: &Path,
        timeout: Duration,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "Fish Audio API key required for synthesis".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            format,
            cache_dir: cache_dir.to_path_buf(),
        })
    }

    /// Synthesize `text` in the voice identified by `voice_id`
    ///
    /// # Errors
    ///
    /// Returns error if the API call fails or returns non-audio
    pub async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>> {
        tracing::debug!(
            voice_id = %voice_id,
            chars = text.len(),
            "starting synthesis"
        );

        let request = TtsRequest {
            text,
            reference_id: voice_id,
            format: &self.format,
        };

        let response = self
            .client
            .post("https://api.fish.audio/v1/tts")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "synthesis request failed");
                Error::Synthesis(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "synthesis API error");
            return Err(Error::Synthesis(format!(
                "Fish Audio API error {status}: {body}"
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| Error::Synthesis(e.to_string()))?
            .to_vec();
        if audio.is_empty() {
            return Err(Error::Synthesis("empty audio response".to_string()));
        }

        tracing::debug!(audio_bytes = audio.len(), "synthesis complete");
        Ok(audio)
    }

    /// Synthesize `text` and write the reply clip to its fixed path
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or the file write fails
    pub async fn synthesize_to_file(&self, text: &str, voice_id: &str) -> Result<PathBuf> {
        let audio = self.synthesize(text, voice_id).await?;

        tokio::fs::create_dir_all(&self.cache_dir).await?;
        let path = self.cache_dir.join(REPLY_FILENAME);
        tokio::fs::write(&path, &audio).await?;

        tracing::debug!(path = %path.display(), "reply clip written");
        Ok(path)
    }
}
