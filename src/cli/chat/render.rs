use std::io::Write;

use color_print::cformat;
use eyre::Result;

use super::favorites::FavoriteRecipe;
use crate::workflow::state::{Recipe, RecipeFeature};

const PREVIEW_CHARS: usize = 300;

pub fn recipe_features(output: &mut dyn Write, features: &[RecipeFeature]) -> Result<()> {
    writeln!(output, "{}", cformat!("<bold>Recipe Suggestions</bold>"))?;
    for (i, feature) in features.iter().enumerate() {
        writeln!(output)?;
        writeln!(
            output,
            "{}",
            cformat!("<cyan><bold>Recipe {}:</bold> {}</cyan>", i + 1, feature.dish_name)
        )?;
        feature_details(output, feature)?;
    }
    Ok(())
}

pub fn selected_recipe(output: &mut dyn Write, recipe: &Recipe, feature: &RecipeFeature) -> Result<()> {
    writeln!(output, "{}", cformat!("<green><bold>Your Selected Recipe</bold></green>"))?;
    writeln!(output, "{}", cformat!("<bold>{}</bold>", feature.dish_name))?;
    feature_details(output, feature)?;
    writeln!(output)?;
    recipe_card(output, recipe, None)
}

/// Name, source link and content; `limit` truncates the content for previews.
pub fn recipe_card(output: &mut dyn Write, recipe: &Recipe, limit: Option<usize>) -> Result<()> {
    writeln!(output, "{}", cformat!("<bold>{}</bold>", recipe.name))?;
    writeln!(output, "{}", cformat!("<underline>{}</underline>", recipe.url))?;
    match limit {
        Some(limit) => writeln!(output, "{}", preview(&recipe.content, limit))?,
        None => writeln!(output, "{}", recipe.content)?,
    }
    Ok(())
}

pub fn favorites(output: &mut dyn Write, favorites: &[FavoriteRecipe]) -> Result<()> {
    if favorites.is_empty() {
        writeln!(output, "No favorite recipes yet!")?;
        return Ok(());
    }

    writeln!(output, "{}", cformat!("<bold>Favorite Recipes</bold>"))?;
    for (i, favorite) in favorites.iter().enumerate() {
        writeln!(output)?;
        writeln!(
            output,
            "{}",
            cformat!(
                "<yellow>{}.</yellow> <dim>saved {}</dim>",
                i + 1,
                favorite.saved_at.format("%Y-%m-%d %H:%M")
            )
        )?;
        recipe_card(output, &favorite.recipe, Some(PREVIEW_CHARS))?;
    }
    Ok(())
}

fn feature_details(output: &mut dyn Write, feature: &RecipeFeature) -> Result<()> {
    writeln!(output, "  Key ingredients:")?;
    for ingredient in &feature.key_ingredients {
        writeln!(output, "  - {}", ingredient)?;
    }
    if let Some(style) = &feature.cooking_style {
        writeln!(output, "  Cooking style: {}", style)?;
    }
    Ok(())
}

fn preview(content: &str, limit: usize) -> String {
    if content.chars().count() <= limit {
        return content.to_string();
    }
    let truncated: String = content.chars().take(limit).collect();
    format!("{}...", truncated.trim_end())
}
