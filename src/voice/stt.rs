//! Speech-to-text for recorded questions

use std::path::Path;
use std::time::Duration;

use crate::{Error, Result};

/// Response from OpenAI Whisper transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Transcribes recorded clips to text via OpenAI Whisper
pub struct SpeechTranscriber {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl SpeechTranscriber {
    /// Create a new transcriber
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client
    /// cannot be built
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for transcription".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            model,
        })
    }

    /// Transcribe a WAV clip from disk
    ///
    /// Returns an empty string when no speech was detected; callers
    /// treat that as "nothing asked", not a failure.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or the API call fails
    pub async fn transcribe_file(&self, path: &Path) -> Result<String> {
        let audio = tokio::fs::read(path).await?;
        self.transcribe(&audio).await
    }

    /// Transcribe WAV audio bytes to text
    ///
    /// # Errors
    ///
    /// Returns error if transcription fails
    pub async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), "starting transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Transcription(e.to_string()))?,
            )
            .text("model", self.model.clone());

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "transcription request failed");
                Error::Transcription(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "transcription API error");
            return Err(Error::Transcription(format!(
                "Whisper API error {status}: {body}"
            )));
        }

        let result: WhisperResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse transcription response");
            Error::Transcription(format!("malformed transcription response: {e}"))
        })?;

        let text = result.text.trim().to_string();
        if text.is_empty() {
            tracing::info!("no speech detected in clip");
        } else {
            tracing::info!(transcript = %text, "transcription complete");
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_api_key() {
        let result = SpeechTranscriber::new(
            String::new(),
            "whisper-1".to_string(),
            Duration::from_secs(30),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn request_failure_surfaces_as_transcription_error() {
        // A 1ms client timeout guarantees the request itself fails,
        // whatever the network looks like.
        let transcriber = SpeechTranscriber::new(
            "sk-test".to_string(),
            "whisper-1".to_string(),
            Duration::from_millis(1),
        )
        .unwrap();

        let err = transcriber.transcribe(&[0u8; 64]).await.unwrap_err();
        assert!(matches!(err, Error::Transcription(_)), "got {err:?}");
    }
}
