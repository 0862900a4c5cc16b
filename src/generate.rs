//! Recipe generation
//!
//! One-shot completion over the user's ingredients and dish goal, JSON
//! output normalized into `Recipe` values, then best-effort image lookup
//! per recipe.

use crate::chat::{ChatClient, ChatMessage};
use crate::images::ImageSearch;
use crate::prompt::build_recipe_prompt;
use crate::recipe::{self, Recipe};
use crate::store::Profile;
use crate::{Error, Result};

/// Generates recipes from an ingredient list
pub struct RecipeGenerator<'a> {
    chat: &'a ChatClient,
    images: Option<&'a ImageSearch>,
}

impl<'a> RecipeGenerator<'a> {
    /// Create a generator; pass `None` for images to skip lookup entirely
    #[must_use]
    pub const fn new(chat: &'a ChatClient, images: Option<&'a ImageSearch>) -> Self {
        Self { chat, images }
    }

    /// Generate recipes for the given ingredients
    ///
    /// Dietary restrictions and allergies from `profile` become hard
    /// constraints in the prompt. Image lookup failures are logged and
    /// leave `image_url` unset; they never fail generation.
    ///
    /// # Errors
    ///
    /// Returns `Error::Generation` when the completion fails, returns no
    /// content, or returns unparseable JSON
    pub async fn generate(
        &self,
        ingredients: &str,
        dish_goal: Option<&str>,
        profile: Option<&Profile>,
    ) -> Result<Vec<Recipe>> {
        let prompt = build_recipe_prompt(ingredients, dish_goal, profile);
        let messages = [ChatMessage::user(prompt)];

        let content = self
            .chat
            .complete(&messages, true)
            .await?
            .ok_or_else(|| Error::Generation("no content in recipe response".to_string()))?;

        let mut recipes = recipe::parse_recipes(&content)?;
        tracing::info!(count = recipes.len(), "recipes generated");

        if let Some(images) = self.images {
            for recipe in &mut recipes {
                match images.find(&recipe.title).await {
                    Ok(url) => recipe.image_url = url,
                    Err(e) => {
                        tracing::warn!(title = %recipe.title, error = %e, "image lookup failed");
                    }
                }
            }
        }

        Ok(recipes)
    }
}
