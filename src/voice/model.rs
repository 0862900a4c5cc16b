//! Custom voice model creation on Fish Audio

use std::fmt;
use std::time::Duration;

use crate::{Error, Result};

/// Who can discover a trained voice model
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Private,
    Unlisted,
    Public,
}

impl Visibility {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Unlisted => "unlist",
            Self::Public => "public",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for training a new voice model
#[derive(Debug, Default)]
pub struct VoiceModelOptions {
    pub title: String,
    pub description: Option<String>,
    pub visibility: Visibility,
    pub enhance_audio_quality: bool,
}

/// Response from the Fish Audio model creation endpoint
#[derive(serde::Deserialize)]
struct CreateModelResponse {
    #[serde(rename = "_id")]
    id: String,
}

/// Creates custom voice models from reference audio
pub struct VoiceModelClient {
    client: reqwest::Client,
    api_key: String,
}

impl VoiceModelClient {
    /// Create a new model client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client
    /// cannot be built
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "Fish Audio API key required for voice training".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self { client, api_key })
    }

    /// Train a voice model from a reference recording
    ///
    /// Returns the provider-assigned model id, which doubles as the
    /// `voice_id` used for synthesis.
    ///
    /// # Errors
    ///
    /// Returns error if the upload or training request fails
    pub async fn create(&self, sample: Vec<u8>, options: &VoiceModelOptions) -> Result<String> {
        tracing::debug!(
            title = %options.title,
            sample_bytes = sample.len(),
            "creating voice model"
        );

        let mut form = reqwest::multipart::Form::new()
            .part(
                "voices",
                reqwest::multipart::Part::bytes(sample)
                    .file_name("sample.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Synthesis(e.to_string()))?,
            )
            .text("title", options.title.clone())
            .text("type", "tts")
            .text("train_mode", "fast")
            .text("visibility", options.visibility.as_str())
            .text(
                "enhance_audio_quality",
                if options.enhance_audio_quality {
                    "true"
                } else {
                    "false"
                },
            );

        if let Some(description) = &options.description {
            form = form.text("description", description.clone());
        }

        let response = self
            .client
            .post("https://api.fish.audio/model")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "voice model request failed");
                Error::Synthesis(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "voice model API error");
            return Err(Error::Synthesis(format!(
                "Fish Audio model API error {status}: {body}"
            )));
        }

        let result: CreateModelResponse = response
            .json()
            .await
            .map_err(|e| Error::Synthesis(format!("malformed model response: {e}")))?;
        tracing::info!(model_id = %result.id, "voice model created");
        Ok(result.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_wire_values() {
        assert_eq!(Visibility::Private.as_str(), "private");
        assert_eq!(Visibility::Unlisted.as_str(), "unlist");
        assert_eq!(Visibility::Public.as_str(), "public");
    }

    #[test]
    fn model_id_from_response() {
        let response: CreateModelResponse =
            serde_json::from_str(r#"{"_id": "abc123", "title": "Nonna"}"#).unwrap();
        assert_eq!(response.id, "abc123");
    }

    #[tokio::test]
    async fn request_failure_surfaces_as_synthesis_error() {
        // A 1ms client timeout guarantees the request itself fails,
        // whatever the network looks like.
        let client = VoiceModelClient::new("fa-test".to_string(), Duration::from_millis(1)).unwrap();
        let options = VoiceModelOptions {
            title: "Nonna".to_string(),
            ..VoiceModelOptions::default()
        };

        let err = client.create(vec![0u8; 64], &options).await.unwrap_err();
        assert!(matches!(err, Error::Synthesis(_)), "got {err:?}");
    }
}
