//! Recipe image lookup
//!
//! Best-effort title search against the hosted recipe-image service; a
//! missing image is never an error for callers that attach images to
//! freshly generated recipes.

use std::time::Duration;

use serde::Deserialize;

use crate::{Error, Result};

const SEARCH_URL: &str = "https://api.spoonacular.com/recipes/complexSearch";

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct SearchResult {
    image: Option<String>,
}

/// Looks up a representative image URL for a recipe title
pub struct ImageSearch {
    client: reqwest::Client,
    api_key: String,
}

impl ImageSearch {
    /// Create a new image search client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot
    /// be built
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "Spoonacular API key required for image lookup".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::Http)?;

        Ok(Self { client, api_key })
    }

    /// Find an image URL for a recipe title
    ///
    /// Returns `Ok(None)` when the service has no match.
    ///
    /// # Errors
    ///
    /// Returns `Error::ImageSearch` on network failure or non-success
    /// status
    pub async fn find(&self, title: &str) -> Result<Option<String>> {
        let url = format!(
            "{SEARCH_URL}?query={}&number=1&apiKey={}",
            urlencoding::encode(title),
            self.api_key
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::ImageSearch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ImageSearch(format!(
                "image search error {status}: {body}"
            )));
        }

        let result: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::ImageSearch(e.to_string()))?;

        let image = result.results.into_iter().next().and_then(|r| r.image);
        tracing::debug!(title, found = image.is_some(), "image lookup");
        Ok(image)
    }
}
