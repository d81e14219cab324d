//! Scripted model and search doubles for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::llm::{ChatModel, LlmError};
use crate::search::{SearchError, SearchHit, SearchProvider};
use crate::workflow::state::{ChatMessage, Recipe, RecipeFeature};

/// Replays queued replies in order and records what it was asked.
#[derive(Default)]
pub struct ScriptedModel {
    completions: Mutex<VecDeque<Result<String, LlmError>>>,
    structured: Mutex<VecDeque<Result<Value, LlmError>>>,
    pub completion_calls: AtomicUsize,
    pub structured_calls: AtomicUsize,
    pub seen_messages: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_completion(self, reply: &str) -> Self {
        self.push_completion(Ok(reply.to_string()));
        self
    }

    pub fn with_completion_error(self) -> Self {
        self.push_completion(Err(LlmError::RequestFailed("connection reset".to_string())));
        self
    }

    pub fn with_structured(self, reply: Value) -> Self {
        self.push_structured(Ok(reply));
        self
    }

    pub fn with_structured_error(self) -> Self {
        self.push_structured(Err(LlmError::ApiError {
            status: 500,
            message: "internal".to_string(),
        }));
        self
    }

    fn push_completion(&self, reply: Result<String, LlmError>) {
        if let Ok(mut queue) = self.completions.lock() {
            queue.push_back(reply);
        }
    }

    fn push_structured(&self, reply: Result<Value, LlmError>) {
        if let Ok(mut queue) = self.structured.lock() {
            queue.push_back(reply);
        }
    }

    pub fn completions(&self) -> usize {
        self.completion_calls.load(Ordering::SeqCst)
    }

    pub fn structured_completions(&self) -> usize {
        self.structured_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(
        &self,
        _system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Result<String, LlmError> {
        self.completion_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_messages.lock().unwrap().push(messages.to_vec());
        self.completions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyResponse))
    }

    async fn complete_structured(
        &self,
        _system_prompt: &str,
        _input: &str,
        _schema: &Value,
    ) -> Result<Value, LlmError> {
        self.structured_calls.fetch_add(1, Ordering::SeqCst);
        self.structured
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyResponse))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Returns a fixed hit list, or fails every call.
pub struct StaticSearch {
    hits: Option<Vec<SearchHit>>,
    pub calls: AtomicUsize,
}

impl StaticSearch {
    pub fn returning(hits: Vec<SearchHit>) -> Self {
        Self {
            hits: Some(hits),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            hits: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.hits
            .clone()
            .ok_or_else(|| SearchError::Request("timed out".to_string()))
    }
}

pub fn hit(title: &str) -> SearchHit {
    SearchHit {
        title: Some(title.to_string()),
        url: format!("https://recipes.example.com/{}", title.to_lowercase().replace(' ', "-")),
        content: format!("How to make {}", title),
    }
}

pub fn recipe(name: &str) -> Recipe {
    Recipe {
        name: name.to_string(),
        url: format!("https://recipes.example.com/{}", name.to_lowercase().replace(' ', "-")),
        content: format!("How to make {}", name),
    }
}

pub fn feature(name: &str) -> RecipeFeature {
    RecipeFeature {
        dish_name: name.to_string(),
        key_ingredients: vec!["eggs".to_string(), "cheese".to_string()],
        cooking_style: Some("baked".to_string()),
    }
}

pub fn features_reply(names: &[&str]) -> Value {
    let results: Vec<Value> = names
        .iter()
        .map(|name| {
            serde_json::json!({
                "dish_name": name,
                "key_ingredients": ["eggs", "cheese"],
                "cooking_style": "baked"
            })
        })
        .collect();
    serde_json::json!({ "results": results })
}
