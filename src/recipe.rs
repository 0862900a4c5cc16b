//! Recipe data model
//!
//! `Recipe` is the persisted/displayed shape; `RecipeContext` is the
//! immutable per-turn snapshot the voice pipeline works from.

use serde::{Deserialize, Serialize};

/// A generated or saved recipe
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recipe {
    /// Recipe title
    pub title: String,

    /// Short description
    #[serde(default)]
    pub description: String,

    /// Ingredient list
    #[serde(default)]
    pub ingredients: Vec<String>,

    /// Ordered cooking steps
    #[serde(default)]
    pub steps: Vec<String>,

    /// Image URL from the recipe-image lookup, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// User rating (1-5), if rated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

impl Recipe {
    /// Document id derived from the title: lowercase, whitespace collapsed
    /// to underscores
    #[must_use]
    pub fn slug(&self) -> String {
        self.title
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .to_lowercase()
    }

    /// Snapshot this recipe at a step index for one conversation turn
    #[must_use]
    pub fn context_at(&self, step_index: usize) -> RecipeContext {
        RecipeContext {
            title: self.title.clone(),
            description: self.description.clone(),
            steps: self.steps.clone(),
            step_index: step_index.min(self.steps.len().saturating_sub(1)),
        }
    }
}

/// Immutable recipe snapshot supplied to a conversation turn
///
/// If the cook advances to another step mid-turn, the in-flight turn keeps
/// answering against the snapshot it was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeContext {
    /// Recipe title
    pub title: String,

    /// Short description
    pub description: String,

    /// Full ordered step list
    pub steps: Vec<String>,

    /// Zero-based index of the step the cook is on
    pub step_index: usize,
}

impl RecipeContext {
    /// Text of the current step, empty for a step-less recipe
    #[must_use]
    pub fn current_step(&self) -> &str {
        self.steps
            .get(self.step_index)
            .map_or("", String::as_str)
    }
}

/// Normalize a chat-completion payload into a list of recipes
///
/// The generation prompt asks for `{"recipes": [...]}`, but models drift;
/// a bare array and a single recipe object are both accepted.
///
/// # Errors
///
/// Returns error if the payload is not valid JSON in any accepted shape
pub fn parse_recipes(raw: &str) -> crate::Result<Vec<Recipe>> {
    let value: serde_json::Value = serde_json::from_str(raw)?;

    let recipes = if let Some(list) = value.get("recipes").and_then(|r| r.as_array()) {
        list.clone()
    } else if let Some(list) = value.as_array() {
        list.clone()
    } else if value.is_object() {
        vec![value]
    } else {
        return Err(crate::Error::Generation(format!(
            "unrecognized recipe payload: {raw}"
        )));
    };

    recipes
        .into_iter()
        .map(|v| serde_json::from_value(v).map_err(crate::Error::from))
        .collect()
}
