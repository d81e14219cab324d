use std::sync::Arc;

use serde::Deserialize;
use tracing::{error, info, warn};

use super::state::{ConversationState, Recipe, RecipeFeature};
use crate::cache::ResultCache;
use crate::llm::{ChatModel, LlmError};
use crate::prompts::{feature_instructions, features_schema};

#[derive(Debug, Deserialize)]
struct FeatureResponse {
    results: Vec<RecipeFeature>,
}

/// Summarizes each retrieved recipe into structured key features.
pub struct FeatureExtractor {
    model: Arc<dyn ChatModel>,
    cache: Arc<dyn ResultCache<Vec<RecipeFeature>>>,
}

impl FeatureExtractor {
    pub fn new(
        model: Arc<dyn ChatModel>,
        cache: Arc<dyn ResultCache<Vec<RecipeFeature>>>,
    ) -> Self {
        Self { model, cache }
    }

    /// Replace the state's features with one entry per recipe. On failure
    /// both lists are emptied so they stay index-aligned.
    pub async fn extract(&self, state: &mut ConversationState) {
        info!("Starting feature extraction");

        if state.recipes.is_empty() {
            state.features = Vec::new();
            return;
        }

        let formatted = format_recipes(&state.recipes);
        match self.cached_extract(&formatted, state.recipes.len()).await {
            Ok(features) => {
                state.features = features;
                info!("Feature extraction completed");
            }
            Err(e) => {
                error!("Error in feature extraction: {}", e);
                state.clear_results();
            }
        }
    }

    async fn cached_extract(
        &self,
        formatted: &str,
        expected: usize,
    ) -> Result<Vec<RecipeFeature>, LlmError> {
        if let Some(features) = self.cache.get(formatted) {
            info!("Using cached feature extraction");
            return Ok(features);
        }

        info!("Performing feature extraction for {} recipes", expected);
        let value = self
            .model
            .complete_structured(&feature_instructions(expected), formatted, &features_schema())
            .await?;

        let response: FeatureResponse =
            serde_json::from_value(value).map_err(|e| LlmError::ParseError(e.to_string()))?;
        let features = align_features(response.results, expected)?;

        self.cache.insert(formatted, features.clone());
        Ok(features)
    }
}

fn align_features(
    mut features: Vec<RecipeFeature>,
    expected: usize,
) -> Result<Vec<RecipeFeature>, LlmError> {
    if features.len() < expected {
        return Err(LlmError::ParseError(format!(
            "expected {} recipe features, got {}",
            expected,
            features.len()
        )));
    }

    if features.len() > expected {
        warn!(
            "Model returned {} features for {} recipes, truncating",
            features.len(),
            expected
        );
        features.truncate(expected);
    }

    Ok(features)
}

pub fn format_recipes(recipes: &[Recipe]) -> String {
    recipes
        .iter()
        .map(|recipe| format!("Recipe: {}\nContent: {}", recipe.name, recipe.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::cache::{NoCache, TtlCache, DEFAULT_TTL};
    use crate::testing::{features_reply, recipe, ScriptedModel};

    fn state_with(names: &[&str]) -> ConversationState {
        let mut state = ConversationState::from_message("eggs");
        state.recipes = names.iter().map(|name| recipe(name)).collect();
        state
    }

    #[test]
    fn test_format_recipes() {
        let formatted = format_recipes(&[recipe("Omelette"), recipe("Crepes")]);
        assert_eq!(
            formatted,
            "Recipe: Omelette\nContent: How to make Omelette\n\nRecipe: Crepes\nContent: How to make Crepes"
        );
    }

    #[tokio::test]
    async fn test_empty_recipes_skip_model() {
        let model = Arc::new(ScriptedModel::new());
        let extractor = FeatureExtractor::new(model.clone(), Arc::new(NoCache));
        let mut state = state_with(&[]);

        extractor.extract(&mut state).await;

        assert!(state.features.is_empty());
        assert_eq!(model.structured_completions(), 0);
    }

    #[tokio::test]
    async fn test_features_match_recipes() {
        let model = Arc::new(
            ScriptedModel::new().with_structured(features_reply(&["Shakshuka", "Souffle", "Tart"])),
        );
        let extractor = FeatureExtractor::new(model, Arc::new(NoCache));
        let mut state = state_with(&["Shakshuka", "Souffle", "Tart"]);

        extractor.extract(&mut state).await;

        assert_eq!(state.features.len(), state.recipes.len());
        assert_eq!(state.features[1].dish_name, "Souffle");
        assert_eq!(state.features[1].cooking_style.as_deref(), Some("baked"));
    }

    #[tokio::test]
    async fn test_extra_features_are_truncated() {
        let model = Arc::new(
            ScriptedModel::new().with_structured(features_reply(&["Omelette", "Frittata", "Quiche"])),
        );
        let extractor = FeatureExtractor::new(model, Arc::new(NoCache));
        let mut state = state_with(&["Omelette", "Frittata"]);

        extractor.extract(&mut state).await;

        assert_eq!(state.features.len(), 2);
    }

    #[tokio::test]
    async fn test_short_reply_clears_results() {
        let model = Arc::new(ScriptedModel::new().with_structured(features_reply(&["Omelette"])));
        let extractor = FeatureExtractor::new(model, Arc::new(NoCache));
        let mut state = state_with(&["Omelette", "Frittata"]);

        extractor.extract(&mut state).await;

        assert!(state.features.is_empty());
        assert!(state.recipes.is_empty());
    }

    #[tokio::test]
    async fn test_model_failure_clears_results() {
        let model = Arc::new(ScriptedModel::new().with_structured_error());
        let extractor = FeatureExtractor::new(model, Arc::new(NoCache));
        let mut state = state_with(&["Omelette"]);

        extractor.extract(&mut state).await;

        assert!(state.features.is_empty());
        assert!(state.recipes.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_shape_clears_results() {
        let model = Arc::new(ScriptedModel::new().with_structured(json!({"results": [{"name": "x"}]})));
        let extractor = FeatureExtractor::new(model, Arc::new(NoCache));
        let mut state = state_with(&["Omelette"]);

        extractor.extract(&mut state).await;

        assert!(state.features.is_empty());
    }

    #[tokio::test]
    async fn test_identical_recipes_hit_cache() {
        let model = Arc::new(ScriptedModel::new().with_structured(features_reply(&["Omelette"])));
        let extractor = FeatureExtractor::new(model.clone(), Arc::new(TtlCache::new(DEFAULT_TTL)));

        let mut first = state_with(&["Omelette"]);
        extractor.extract(&mut first).await;
        let mut second = state_with(&["Omelette"]);
        extractor.extract(&mut second).await;

        assert_eq!(model.structured_completions(), 1);
        assert_eq!(first.features, second.features);
    }
}
