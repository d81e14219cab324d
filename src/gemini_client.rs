use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::llm::{ChatModel, LlmError};
use crate::workflow::state::{ChatMessage, Role};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiClient {
    api_key: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, temperature: f32) -> Self {
        Self {
            api_key,
            model,
            temperature,
            client: reqwest::Client::new(),
        }
    }

    async fn generate_content(&self, request_body: Value) -> Result<String, LlmError> {
        let api_url = format!(
            "{}/{}:generateContent?key={}",
            API_BASE, self.model, self.api_key
        );

        debug!(
            "Sending request to Gemini API: {}",
            serde_json::to_string_pretty(&request_body).unwrap_or_default()
        );

        let response = self
            .client
            .post(&api_url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            error!("API request failed with response: {}", body);
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        let response_json: Value =
            serde_json::from_str(&body).map_err(|e| LlmError::ParseError(e.to_string()))?;

        debug!(
            "Received response from Gemini API: {}",
            serde_json::to_string_pretty(&response_json).unwrap_or_default()
        );

        extract_text(&response_json)
    }

    fn generation_config(&self) -> Value {
        json!({
            "temperature": self.temperature,
            "topP": 0.8,
            "topK": 40,
            "maxOutputTokens": 8192
        })
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Result<String, LlmError> {
        let request_body = json!({
            "systemInstruction": { "parts": [{ "text": system_prompt }] },
            "contents": format_contents(messages),
            "generationConfig": self.generation_config(),
        });

        self.generate_content(request_body).await
    }

    async fn complete_structured(
        &self,
        system_prompt: &str,
        input: &str,
        schema: &Value,
    ) -> Result<Value, LlmError> {
        let mut generation_config = self.generation_config();
        generation_config["responseMimeType"] = json!("application/json");
        generation_config["responseSchema"] = schema.clone();

        let request_body = json!({
            "systemInstruction": { "parts": [{ "text": system_prompt }] },
            "contents": format_contents(&[ChatMessage::user(input)]),
            "generationConfig": generation_config,
        });

        let text = self.generate_content(request_body).await?;
        serde_json::from_str(strip_code_fence(&text))
            .map_err(|e| LlmError::ParseError(format!("{}: {}", e, text)))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn format_contents(messages: &[ChatMessage]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            let role = match message.role {
                Role::User => "user",
                Role::Assistant => "model",
            };
            json!({
                "role": role,
                "parts": [{ "text": message.content }]
            })
        })
        .collect()
}

/// Concatenate the text parts of the first candidate.
fn extract_text(response_json: &Value) -> Result<String, LlmError> {
    let candidate = response_json
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .ok_or(LlmError::EmptyResponse)?;

    if let Some(reason) = candidate.get("finishReason").and_then(Value::as_str) {
        if reason == "SAFETY" || reason == "RECITATION" {
            return Err(LlmError::ParseError(format!(
                "response blocked with finish reason {}",
                reason
            )));
        }
    }

    let text: String = candidate
        .pointer("/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(LlmError::EmptyResponse);
    }

    Ok(text)
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

// JSON mode normally returns bare JSON, but some models still wrap it in a fence.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}
