//! Recipe parsing and prompt construction integration tests

use souschef::prompt::{build_chef_prompt, build_recipe_prompt};
use souschef::{Profile, Recipe, parse_recipes, builtin_personas};

const WRAPPED: &str = r#"{
    "recipes": [
        {
            "title": "Lemon Chicken",
            "description": "Bright and quick",
            "ingredients": ["chicken", "lemon", "garlic"],
            "steps": ["Season the chicken.", "Sear and finish with lemon."]
        },
        {
            "title": "Chicken Rice Bowl",
            "description": "One pot comfort",
            "ingredients": ["chicken", "rice"],
            "steps": ["Cook rice.", "Top with chicken."]
        }
    ]
}"#;

#[test]
fn wrapped_object_parses_to_all_recipes() {
    let recipes = parse_recipes(WRAPPED).unwrap();
    assert_eq!(recipes.len(), 2);
    assert_eq!(recipes[0].title, "Lemon Chicken");
    assert_eq!(recipes[1].steps.len(), 2);
}

#[test]
fn bare_array_and_single_object_both_parse() {
    let array = r#"[{"title": "Toast", "description": "", "ingredients": ["bread"], "steps": ["Toast it."]}]"#;
    assert_eq!(parse_recipes(array).unwrap().len(), 1);

    let single = r#"{"title": "Toast", "description": "", "ingredients": ["bread"], "steps": ["Toast it."]}"#;
    assert_eq!(parse_recipes(single).unwrap().len(), 1);
}

#[test]
fn non_json_reply_is_an_error() {
    assert!(parse_recipes("Sorry, I can't help with that.").is_err());
}

#[test]
fn slug_is_lowercase_with_underscores() {
    let recipes = parse_recipes(WRAPPED).unwrap();
    assert_eq!(recipes[0].slug(), "lemon_chicken");
    assert_eq!(recipes[1].slug(), "chicken_rice_bowl");
}

#[test]
fn context_clamps_step_index_to_last_step() {
    let recipe: Recipe = serde_json::from_str(
        r#"{"title": "Soup", "description": "", "ingredients": [], "steps": ["Chop.", "Simmer."]}"#,
    )
    .unwrap();

    let ctx = recipe.context_at(99);
    assert_eq!(ctx.step_index, 1);
    assert_eq!(ctx.current_step(), "Simmer.");
}

#[test]
fn chef_prompt_carries_persona_and_current_step() {
    let chef = &builtin_personas()[0];
    let recipes = parse_recipes(WRAPPED).unwrap();
    let ctx = recipes[0].context_at(1);

    let prompt = build_chef_prompt(chef, &ctx);

    assert!(prompt.starts_with(&chef.prompt));
    assert!(prompt.contains("Recipe Title: Lemon Chicken"));
    assert!(prompt.contains("Current Step (2): Sear and finish with lemon."));
    assert!(prompt.contains("Season the chicken."));
}

#[test]
fn dietary_profile_shapes_the_generation_prompt() {
    let profile = Profile {
        dietary: Some("vegetarian".to_string()),
        allergies: Some("peanuts".to_string()),
        ..Profile::default()
    };

    let with = build_recipe_prompt("tofu, rice", None, Some(&profile));
    assert!(with.contains("vegetarian"));
    assert!(with.contains("peanuts"));

    let without = build_recipe_prompt("tofu, rice", None, None);
    assert!(!without.contains("vegetarian"));
}
