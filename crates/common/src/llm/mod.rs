//! Language model client abstraction
//!
//! The pipeline assumes exactly one capability: `invoke(prompt) -> text`.
//! No function calling, no structured-output enforcement; the critic does
//! its own defensive JSON scraping on top of plain text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::errors::{AppError, Result};

/// Minimal language model seam
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send a single prompt and return the model's text reply
    async fn invoke(&self, prompt: &str) -> Result<String>;

    /// Model identifier for metadata
    fn name(&self) -> &str;
}

/// Client for an OpenAI-compatible chat-completions endpoint
pub struct HttpLlmClient {
    config: LlmConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

impl HttpLlmClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            // The orchestrator enforces its own wall-clock deadline; this is
            // a transport-level backstop slightly above it.
            .timeout(Duration::from_secs(config.generation_timeout_secs + 10))
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { config, client })
    }

    /// Deterministic reply for development without a configured backend
    fn mock_response(&self, prompt: &str) -> String {
        if let Some(q_start) = prompt.find("User Question:") {
            let question_part = &prompt[q_start..];
            if let Some(newline) = question_part.find('\n') {
                let question = question_part[14..newline].trim();
                return format!(
                    "Based on the episode context, here is an answer about {}. \
                    [Mock response - LLM API key not configured]",
                    question
                );
            }
        }

        "Based on the episode context, the answer requires a configured model backend. \
        [Mock response - LLM API key not configured]"
            .to_string()
    }
}

#[async_trait]
impl LanguageModel for HttpLlmClient {
    async fn invoke(&self, prompt: &str) -> Result<String> {
        if self.config.api_key.is_empty() {
            return Ok(self.mock_response(prompt));
        }

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Llm {
                message: format!("LLM API request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Llm {
                message: format!("LLM API error {}: {}", status, body),
            });
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| AppError::Llm {
            message: format!("Failed to parse LLM response: {}", e),
        })?;

        chat_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| AppError::Llm {
                message: "Empty response from LLM".to_string(),
            })
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}
