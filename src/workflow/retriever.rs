use std::sync::Arc;

use tracing::{error, info, warn};
use url::Url;

use super::state::{ConversationState, Recipe};
use crate::cache::ResultCache;
use crate::search::{SearchError, SearchHit, SearchProvider};

pub const UNKNOWN_DISH: &str = "Unknown Dish";

/// Fetches candidate recipes for the current query.
pub struct RecipeRetriever {
    search: Arc<dyn SearchProvider>,
    cache: Arc<dyn ResultCache<Vec<Recipe>>>,
    max_results: usize,
}

impl RecipeRetriever {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        cache: Arc<dyn ResultCache<Vec<Recipe>>>,
        max_results: usize,
    ) -> Self {
        Self {
            search,
            cache,
            max_results,
        }
    }

    /// Replace the state's recipes with fresh results. Never fails; a search
    /// error leaves an empty list. Any selection pointed into the old list
    /// and is dropped.
    pub async fn retrieve(&self, state: &mut ConversationState) {
        info!("Starting recipe retrieval");
        state.selected = None;

        if state.query.is_empty() {
            error!("No query provided");
            state.recipes = Vec::new();
            return;
        }

        state.recipes = match self.cached_search(&state.query).await {
            Ok(recipes) => recipes,
            Err(e) => {
                error!("Error in recipe retrieval: {}", e);
                Vec::new()
            }
        };

        info!("Retrieved {} recipes", state.recipes.len());
    }

    async fn cached_search(&self, query: &str) -> Result<Vec<Recipe>, SearchError> {
        if let Some(recipes) = self.cache.get(query) {
            info!("Using cached search results for query: {}", query);
            return Ok(recipes);
        }

        info!("Performing search for query: {}", query);
        let hits = self.search.search(query, self.max_results).await?;
        let recipes = normalize_hits(hits, self.max_results);
        self.cache.insert(query, recipes.clone());
        Ok(recipes)
    }
}

fn normalize_hits(hits: Vec<SearchHit>, max_results: usize) -> Vec<Recipe> {
    hits.into_iter()
        .take(max_results)
        .inspect(|hit| {
            if let Err(e) = Url::parse(&hit.url) {
                warn!("Search hit '{}' has an invalid url: {}", hit.url, e);
            }
        })
        .map(|hit| Recipe {
            name: hit
                .title
                .filter(|title| !title.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_DISH.to_string()),
            url: hit.url,
            content: hit.content,
        })
        .collect()
}
