use std::env;
use std::path::PathBuf;
use std::time::Duration;

use eyre::{eyre, Result, WrapErr};

use crate::cache::DEFAULT_TTL;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_TEMPERATURE: f32 = 0.0;
pub const MAX_SEARCH_RESULTS: usize = 3;
pub const DEFAULT_MAX_FEEDBACK_LOOPS: usize = 3;

/// Knobs for the recipe workflow itself.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub max_search_results: usize,
    pub cache_ttl: Duration,
    pub max_feedback_loops: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_search_results: MAX_SEARCH_RESULTS,
            cache_ttl: DEFAULT_TTL,
            max_feedback_loops: DEFAULT_MAX_FEEDBACK_LOOPS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini_api_key: String,
    pub tavily_api_key: String,
    pub model: String,
    pub temperature: f32,
    pub favorites_path: PathBuf,
    pub workflow: WorkflowConfig,
}

impl AppConfig {
    /// Read configuration from the environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let gemini_api_key = lookup("GEMINI_API_KEY")
            .filter(|key| !key.is_empty())
            .ok_or_else(|| eyre!("GEMINI_API_KEY environment variable not set"))?;
        let tavily_api_key = lookup("TAVILY_API_KEY")
            .filter(|key| !key.is_empty())
            .ok_or_else(|| eyre!("TAVILY_API_KEY environment variable not set"))?;

        let model = lookup("RECIPE_CHAT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let temperature = match lookup("RECIPE_CHAT_TEMPERATURE") {
            Some(raw) => raw
                .parse::<f32>()
                .wrap_err_with(|| format!("Invalid RECIPE_CHAT_TEMPERATURE '{}'", raw))?,
            None => DEFAULT_TEMPERATURE,
        };

        let max_feedback_loops = match lookup("RECIPE_CHAT_MAX_LOOPS") {
            Some(raw) => raw
                .parse::<usize>()
                .wrap_err_with(|| format!("Invalid RECIPE_CHAT_MAX_LOOPS '{}'", raw))?,
            None => DEFAULT_MAX_FEEDBACK_LOOPS,
        };

        let favorites_path = favorites_path(&lookup);

        Ok(Self {
            gemini_api_key,
            tavily_api_key,
            model,
            temperature,
            favorites_path,
            workflow: WorkflowConfig {
                max_feedback_loops,
                ..WorkflowConfig::default()
            },
        })
    }
}

/// Where favorites live; needs no API keys, so it can be resolved on its own.
pub fn favorites_path_from_env() -> PathBuf {
    favorites_path(&|key: &str| env::var(key).ok())
}

fn favorites_path(lookup: &dyn Fn(&str) -> Option<String>) -> PathBuf {
    match lookup("RECIPE_CHAT_FAVORITES") {
        Some(path) => PathBuf::from(path),
        None => default_favorites_path(),
    }
}

fn default_favorites_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("recipe-chat")
        .join("favorites.json")
}
