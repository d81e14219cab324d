use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use super::state::ConversationState;
use crate::llm::ChatModel;
use crate::prompts::{feedback_instructions, selection_schema};

/// How the model read the user's feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackVerdict {
    Selected(usize),
    Rejected(String),
    Malformed(String),
}

/// Classifies free-text feedback as a selection or a rejection.
pub struct FeedbackInterpreter {
    model: Arc<dyn ChatModel>,
}

impl FeedbackInterpreter {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Consume the pending feedback, if any, and report how it was read.
    /// Failures never propagate: a failed call comes back as `Malformed`,
    /// the selection falls back to none and the feedback is dropped.
    pub async fn refine(&self, state: &mut ConversationState) -> Option<FeedbackVerdict> {
        let feedback = state.feedback.take()?;

        info!("Processing user feedback");
        let system_prompt = feedback_instructions(&state.features, &feedback);

        let verdict = match self
            .model
            .complete_structured(&system_prompt, &feedback, &selection_schema())
            .await
        {
            Ok(value) => parse_verdict(&value, state.features.len()),
            Err(e) => FeedbackVerdict::Malformed(e.to_string()),
        };

        match &verdict {
            FeedbackVerdict::Selected(index) => {
                info!("User selected recipe {}", index);
                state.selected = Some(*index);
            }
            FeedbackVerdict::Rejected(reason) => {
                info!("User requested modifications: {}", reason);
                state.selected = None;
                state.replace_latest_message(reason.clone());
            }
            FeedbackVerdict::Malformed(why) => {
                error!("Error in feedback processing: {}", why);
                state.selected = None;
            }
        }

        Some(verdict)
    }
}

/// Validate the model's `{like, dislike}` reply against `option_count` options.
pub fn parse_verdict(value: &Value, option_count: usize) -> FeedbackVerdict {
    let like = match value.get("like") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => match n.as_u64() {
            Some(index) => Some(index as usize),
            None => return FeedbackVerdict::Malformed(format!("invalid selection index {}", n)),
        },
        Some(Value::String(s)) if !s.trim().is_empty() && s.trim().chars().all(|c| c.is_ascii_digit()) => {
            match s.trim().parse::<usize>() {
                Ok(index) => Some(index),
                Err(e) => return FeedbackVerdict::Malformed(format!("invalid selection '{}': {}", s, e)),
            }
        }
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(other) => return FeedbackVerdict::Malformed(format!("invalid selection {}", other)),
    };

    if let Some(index) = like {
        if index >= option_count {
            return FeedbackVerdict::Malformed(format!(
                "selection {} is out of range for {} recipes",
                index, option_count
            ));
        }
        return FeedbackVerdict::Selected(index);
    }

    match value.get("dislike").and_then(Value::as_str).map(str::trim) {
        Some(reason) if !reason.is_empty() => FeedbackVerdict::Rejected(reason.to_string()),
        _ => {
            warn!("Feedback reply had neither a selection nor a reason: {}", value);
            FeedbackVerdict::Malformed("reply had neither a selection nor a reason".to_string())
        }
    }
}
