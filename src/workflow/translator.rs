use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::{error, info};

use super::state::ConversationState;
use super::WorkflowError;
use crate::llm::ChatModel;
use crate::prompts::SEARCH_INSTRUCTIONS;

/// Turns the conversation into a short web search query.
pub struct QueryTranslator {
    model: Arc<dyn ChatModel>,
}

impl QueryTranslator {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub async fn translate(&self, state: &mut ConversationState) -> Result<(), WorkflowError> {
        info!("Starting query translation");

        if state.messages.is_empty() {
            error!("Error in query translation: no messages to translate");
            return Err(WorkflowError::EmptyConversation);
        }

        let response = self
            .model
            .complete(SEARCH_INSTRUCTIONS, &state.messages)
            .await
            .map_err(|e| {
                error!("Error in query translation: {}", e);
                WorkflowError::Translation(e)
            })?;

        state.query = clean_query(&response);
        info!("Query translated: {}", state.query);
        Ok(())
    }
}

fn query_label() -> Option<&'static Regex> {
    static LABEL: OnceLock<Option<Regex>> = OnceLock::new();
    LABEL
        .get_or_init(|| Regex::new(r"(?i)^\s*(search\s+)?query\s*:\s*").ok())
        .as_ref()
}

/// Strip quoting, labels and stray whitespace from a model-produced query.
fn clean_query(raw: &str) -> String {
    let first_line = raw.trim().lines().next().unwrap_or("");
    let unlabeled = match query_label() {
        Some(label) => label.replace(first_line, "").into_owned(),
        None => first_line.to_string(),
    };
    unlabeled
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
