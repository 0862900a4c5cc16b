//! Ingredient detection from photos
//!
//! Sends an ingredient photo to the vision-capable chat model and parses
//! the JSON ingredient list back out.

use base64::Engine;
use serde::Deserialize;

use crate::chat::{ChatClient, ChatMessage};
use crate::prompt::INGREDIENT_SCAN_PROMPT;
use crate::{Error, Result};

#[derive(Deserialize)]
struct ScanResponse {
    #[serde(default)]
    ingredients: Vec<String>,
}

/// Detects food ingredients visible in a photo
pub struct IngredientScanner<'a> {
    chat: &'a ChatClient,
}

impl<'a> IngredientScanner<'a> {
    /// Create a scanner over an existing chat client
    #[must_use]
    pub const fn new(chat: &'a ChatClient) -> Self {
        Self { chat }
    }

    /// Check if MIME type is a supported image format
    fn is_supported_image(mime_type: &str) -> bool {
        matches!(mime_type, "image/png" | "image/jpeg" | "image/webp")
    }

    /// Analyze a photo and return the detected ingredient names
    ///
    /// An empty list is a valid outcome (no food in frame).
    ///
    /// # Errors
    ///
    /// Returns `Error::Vision` on unsupported format, service failure, or
    /// an unparseable response
    pub async fn scan(&self, image: &[u8], mime_type: &str) -> Result<Vec<String>> {
        if !Self::is_supported_image(mime_type) {
            return Err(Error::Vision(format!(
                "unsupported image type: {mime_type}"
            )));
        }

        let base64_data = base64::engine::general_purpose::STANDARD.encode(image);
        let data_url = format!("data:{mime_type};base64,{base64_data}");

        let messages = [ChatMessage::user_with_image(
            INGREDIENT_SCAN_PROMPT,
            data_url,
        )];

        let content = self
            .chat
            .complete(&messages, true)
            .await
            .map_err(|e| match e {
                Error::Generation(msg) => Error::Vision(msg),
                other => other,
            })?;

        let Some(raw) = content else {
            tracing::debug!("vision model returned no content");
            return Ok(Vec::new());
        };

        let parsed: ScanResponse = serde_json::from_str(&raw)
            .map_err(|e| Error::Vision(format!("unparseable ingredient list: {e}")))?;

        tracing::info!(count = parsed.ingredients.len(), "ingredients detected");
        Ok(parsed.ingredients)
    }
}
