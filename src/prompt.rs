//! System prompt builders
//!
//! Pure functions: identical inputs always yield identical output strings.

use crate::persona::Persona;
use crate::recipe::RecipeContext;
use crate::store::Profile;

/// Build the chef system prompt for one conversation turn
///
/// Embeds the persona's fixed prompt template verbatim, the recipe title,
/// the single current step, and the full ordered step list so the chef can
/// answer questions that reach beyond the current step.
#[must_use]
pub fn build_chef_prompt(persona: &Persona, ctx: &RecipeContext) -> String {
    format!(
        "{}\n\nRecipe Title: {}\nCurrent Step ({}): {}\n\nFull Steps:\n{}",
        persona.prompt,
        ctx.title,
        ctx.step_index + 1,
        ctx.current_step(),
        ctx.steps.join("\n"),
    )
}

/// Build the recipe-generation prompt
///
/// Dietary restrictions and allergies from the user profile are injected as
/// hard constraints; an empty profile adds nothing.
#[must_use]
pub fn build_recipe_prompt(
    ingredients: &str,
    dish_goal: Option<&str>,
    profile: Option<&Profile>,
) -> String {
    let dietary_note = profile.map_or_else(String::new, |p| {
        let dietary = p
            .dietary
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|d| format!("Dietary restrictions: {d}. "))
            .unwrap_or_default();
        let allergies = p
            .allergies
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|a| format!("Allergies to avoid: {a}. "))
            .unwrap_or_default();

        if dietary.is_empty() && allergies.is_empty() {
            String::new()
        } else {
            format!(
                "\n\nIMPORTANT: {dietary}{allergies}All recipes MUST comply with \
                 these restrictions and avoid any allergens."
            )
        }
    });

    format!(
        "You are a world-class chef. You must create 5 recipes using ONLY these ingredients:\n\n\
         {ingredients}\n\n\
         User request (may be empty):\n\
         {}{dietary_note}\n\n\
         Your job:\n\
         - try to use the ingredients provided; you don't have to use all of them, \
         and you can add a few extras only if needed\n\
         - If a user request is provided, shape the recipes around that theme\n\
         - If no request is provided, just create the best and most realistic recipes\n\
         - Don't get too creative; the recipes must be plausible and actually cookable\n\n\
         Return JSON in exactly this format:\n\
         {{\n  \"recipes\": [\n    {{\n      \"title\": \"\",\n      \"description\": \"\",\n      \
         \"ingredients\": [],\n      \"steps\": []\n    }}\n  ]\n}}",
        dish_goal.filter(|g| !g.is_empty()).unwrap_or("None"),
    )
}

/// Instruction sent with an ingredient photo to the vision model
pub const INGREDIENT_SCAN_PROMPT: &str = "Identify the food ingredients visible in this photo.\n\
     Return ONLY JSON:\n{\n  \"ingredients\": [\"item1\", \"item2\", ...]\n}";
