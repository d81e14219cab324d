use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::workflow::state::ChatMessage;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("failed to parse model response: {0}")]
    ParseError(String),

    #[error("model returned no content")]
    EmptyResponse,
}

/// A hosted language model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Free-text completion over a message history.
    async fn complete(&self, system_prompt: &str, messages: &[ChatMessage])
        -> Result<String, LlmError>;

    /// Completion constrained to JSON matching `schema`.
    async fn complete_structured(
        &self,
        system_prompt: &str,
        input: &str,
        schema: &Value,
    ) -> Result<Value, LlmError>;

    fn model_name(&self) -> &str;
}
