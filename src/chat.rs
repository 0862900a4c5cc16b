//! Chat-completion client
//!
//! One-shot requests to the hosted chat-completion service. Used for chef
//! replies, recipe generation, and ingredient vision analysis.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// A role-tagged chat message
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    role: &'static str,
    content: Content,
}

impl ChatMessage {
    /// System message with plain text content
    #[must_use]
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: Content::Text(text.into()),
        }
    }

    /// User message with plain text content
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: Content::Text(text.into()),
        }
    }

    /// User message carrying an instruction plus an inline image
    #[must_use]
    pub fn user_with_image(text: impl Into<String>, data_url: String) -> Self {
        Self {
            role: "user",
            content: Content::Parts(vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: data_url },
                },
            ]),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum Content {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Client for the hosted chat-completion service
pub struct ChatClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl ChatClient {
    /// Create a new chat client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot
    /// be built
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for chat completions".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            client,
            api_key,
            model,
        })
    }

    /// Send a one-shot completion request
    ///
    /// Returns `Ok(None)` when the service succeeds but produces no
    /// content; callers treat that as a normal "no reply" abort, not a
    /// failure.
    ///
    /// # Errors
    ///
    /// Returns `Error::Generation` on network/auth failure or a
    /// non-success status
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        json_mode: bool,
    ) -> Result<Option<String>> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            response_format: json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let response = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Generation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "chat completion error");
            return Err(Error::Generation(format!(
                "chat completion error {status}: {body}"
            )));
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Generation(format!("malformed completion response: {e}")))?;

        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty());

        tracing::debug!(
            has_content = content.is_some(),
            model = %self.model,
            "completion received"
        );
        Ok(content)
    }
}
