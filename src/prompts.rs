use serde_json::{json, Value};

use crate::workflow::state::RecipeFeature;

pub const SEARCH_INSTRUCTIONS: &str = r#"You will be given a message requesting recipe information.
Your task is to generate a concise search query for recipe retrieval.

Instructions:
1. Analyze the message to identify:
   - Main ingredients
   - Cooking styles
   - Dietary restrictions
   - Preferences
2. Return ONLY a search query string (3-10 words)
3. DO NOT include any explanations or additional text
4. Focus on recipe-specific keywords

Example input: "I want to make a vegetarian pasta dish with mushrooms for dinner"
Example output: vegetarian mushroom pasta recipe

Provide ONLY the search query without any additional text or explanation."#;

/// Instructions for summarizing `count` search results into structured features.
pub fn feature_instructions(count: usize) -> String {
    format!(
        r#"You will receive the top {count} recipes from a web search. For each recipe, extract and structure the following information:
1. dish_name: The name of the dish
2. key_ingredients: A list of the main ingredients used in the recipe
3. cooking_style: (Optional) The style or method of cooking (e.g., baked, grilled, stir-fried)

Keep the recipes in the order they are given.
Return exactly {count} recipes in the "results" field."#
    )
}

/// Instructions for classifying free-text feedback on the current suggestions.
pub fn feedback_instructions(features: &[RecipeFeature], feedback: &str) -> String {
    let options = features
        .iter()
        .enumerate()
        .map(|(i, feature)| {
            let style = feature.cooking_style.as_deref().unwrap_or("unspecified");
            format!(
                "{}. {} (ingredients: {}; style: {})",
                i,
                feature.dish_name,
                feature.key_ingredients.join(", "),
                style
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let last = features.len().saturating_sub(1);

    format!(
        r#"Process the user feedback on the suggested recipes.

Current recipes (zero-based index):
{options}

User feedback: {feedback}

Instructions:
1. If the user expresses satisfaction with any recipe, return its index (0 to {last}) in the "like" field.
   Users count options from 1, so "option 1" means index 0.
2. If the user wants modifications or different recipes, explain what they want instead in the "dislike" field,
   phrased as a new recipe request.
3. Be strict about recipe selection - only set "like" if there's clear positive feedback."#
    )
}

pub fn features_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "results": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "dish_name": { "type": "STRING", "description": "Name of the dish" },
                        "key_ingredients": {
                            "type": "ARRAY",
                            "items": { "type": "STRING" },
                            "description": "List of key ingredients"
                        },
                        "cooking_style": {
                            "type": "STRING",
                            "nullable": true,
                            "description": "Style of cooking (if applicable)"
                        }
                    },
                    "required": ["dish_name", "key_ingredients"]
                }
            }
        },
        "required": ["results"]
    })
}

pub fn selection_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "like": {
                "type": "INTEGER",
                "nullable": true,
                "description": "Index of the liked recipe. Null if none liked."
            },
            "dislike": {
                "type": "STRING",
                "nullable": true,
                "description": "Explanation of why all recipes were disliked. Null if a recipe was liked."
            }
        }
    })
}
