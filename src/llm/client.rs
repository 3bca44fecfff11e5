//! HTTP clients for external generative-text services.

use crate::llm::CompletionModel;
use crate::types::{AskError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

/// Model used when neither config nor environment names one.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Provider type, detected from the model-name prefix.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Gemini,
    OpenAI,
    Anthropic,
}

/// Client for one external generative-text service.
///
/// Construct once and reuse across questions; holds no per-question state.
pub struct LlmClient {
    api_key: String,
    model: String,
    provider: LlmProvider,
    client: Client,
}

/// Gemini generateContent response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: String,
}

/// OpenAI chat completions response.
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: String,
}

/// Anthropic messages response.
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    text: String,
}

impl LlmClient {
    /// Create new client.
    ///
    /// Provider is detected from the model name: `gemini-*` uses Gemini,
    /// `claude-*` uses Anthropic, anything else uses OpenAI.
    pub fn new(api_key: String, model: String) -> Self {
        let provider = if model.starts_with("gemini") {
            LlmProvider::Gemini
        } else if model.starts_with("claude") || model.starts_with("anthropic") {
            LlmProvider::Anthropic
        } else {
            LlmProvider::OpenAI
        };

        Self {
            api_key,
            model,
            provider,
            client: Client::new(),
        }
    }

    /// Create for `model`, reading the matching API key from the environment.
    ///
    /// # Errors
    ///
    /// Returns `AskError::Config` if the key variable is not set.
    pub fn for_model(model: String) -> Result<Self> {
        let api_key = if model.starts_with("gemini") {
            std::env::var("GEMINI_API_KEY").map_err(|_| {
                AskError::Config("GEMINI_API_KEY environment variable not set".to_string())
            })?
        } else if model.starts_with("claude") || model.starts_with("anthropic") {
            std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
                AskError::Config("ANTHROPIC_API_KEY environment variable not set".to_string())
            })?
        } else {
            std::env::var("OPENAI_API_KEY").map_err(|_| {
                AskError::Config("OPENAI_API_KEY environment variable not set".to_string())
            })?
        };

        Ok(Self::new(api_key, model))
    }

    /// Create from environment variables.
    ///
    /// Uses `ASKDB_MODEL` for the model (default: gemini-1.5-flash) and
    /// `GEMINI_API_KEY`, `ANTHROPIC_API_KEY`, or `OPENAI_API_KEY` based on it.
    pub fn from_env() -> Result<Self> {
        let model = std::env::var("ASKDB_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self::for_model(model)
    }

    /// Model name this client was built for.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Call the Gemini generateContent API.
    async fn call_gemini(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&json!({
                "contents": [{"parts": [{"text": prompt}]}]
            }))
            .send()
            .await
            .map_err(|e| AskError::Generation(format!("Gemini API error: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AskError::Generation(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(AskError::Generation(format!(
                "Gemini API error {}: {}",
                status, body
            )));
        }

        let parsed: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| AskError::Generation(format!("Failed to parse Gemini response: {}", e)))?;

        parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .ok_or_else(|| AskError::Generation("No response from Gemini".to_string()))
    }

    /// Call the OpenAI chat completions API.
    async fn call_openai(&self, prompt: &str) -> Result<String> {
        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&json!({
                "model": self.model,
                "messages": [
                    {"role": "user", "content": prompt}
                ],
                "temperature": 0.1
            }))
            .send()
            .await
            .map_err(|e| AskError::Generation(format!("OpenAI API error: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AskError::Generation(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(AskError::Generation(format!(
                "OpenAI API error {}: {}",
                status, body
            )));
        }

        let parsed: OpenAIResponse = serde_json::from_str(&body)
            .map_err(|e| AskError::Generation(format!("Failed to parse OpenAI response: {}", e)))?;

        Ok(parsed
            .choices
            .first()
            .ok_or_else(|| AskError::Generation("No response from OpenAI".to_string()))?
            .message
            .content
            .clone())
    }

    /// Call the Anthropic messages API.
    async fn call_anthropic(&self, prompt: &str) -> Result<String> {
        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&json!({
                "model": self.model,
                "max_tokens": 1024,
                "messages": [
                    {"role": "user", "content": prompt}
                ],
                "temperature": 0.1
            }))
            .send()
            .await
            .map_err(|e| AskError::Generation(format!("Anthropic API error: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AskError::Generation(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(AskError::Generation(format!(
                "Anthropic API error {}: {}",
                status, body
            )));
        }

        let parsed: AnthropicResponse = serde_json::from_str(&body).map_err(|e| {
            AskError::Generation(format!("Failed to parse Anthropic response: {}", e))
        })?;

        Ok(parsed
            .content
            .first()
            .ok_or_else(|| AskError::Generation("No response from Anthropic".to_string()))?
            .text
            .clone())
    }
}

#[async_trait]
impl CompletionModel for LlmClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        match self.provider {
            LlmProvider::Gemini => self.call_gemini(prompt).await,
            LlmProvider::OpenAI => self.call_openai(prompt).await,
            LlmProvider::Anthropic => self.call_anthropic(prompt).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_detection() {
        let gemini = LlmClient::new("k".to_string(), "gemini-1.5-flash".to_string());
        assert!(matches!(gemini.provider, LlmProvider::Gemini));

        let anthropic = LlmClient::new("k".to_string(), "claude-sonnet-4-5".to_string());
        assert!(matches!(anthropic.provider, LlmProvider::Anthropic));

        let openai = LlmClient::new("k".to_string(), "gpt-4-turbo".to_string());
        assert!(matches!(openai.provider, LlmProvider::OpenAI));
    }
}
