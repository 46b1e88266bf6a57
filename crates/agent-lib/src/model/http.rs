//! HTTP language model client (Ollama or OpenAI-compatible)

use super::{ApiStyle, LanguageModel, ModelConfig, ModelError, Prompt};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Language model reached over HTTP
///
/// Holds a pooled `reqwest::Client`; one instance serves all requests.
pub struct HttpLanguageModel {
    config: ModelConfig,
    client: Client,
}

impl HttpLanguageModel {
    pub fn new(config: ModelConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    fn map_send_error(&self, err: reqwest::Error) -> ModelError {
        if err.is_timeout() {
            ModelError::Timeout(self.config.timeout_secs)
        } else {
            ModelError::Http(format!("Request failed: {}", err))
        }
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value, ModelError> {
        let mut request = self.client.post(url).json(body);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(ModelError::Http(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ModelError::InvalidOutput(format!("Failed to parse response: {}", e)))
    }

    async fn call_ollama(&self, prompt: &Prompt) -> Result<String, ModelError> {
        let mut body = json!({
            "model": self.config.model,
            "system": prompt.system,
            "prompt": prompt.user,
            "stream": false,
        });
        if prompt.expect_json {
            body["format"] = json!("json");
        }

        let response = self.post(&self.url("/api/generate"), &body).await?;
        response
            .get("response")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(ModelError::EmptyResponse)
    }

    async fn call_openai_compatible(&self, prompt: &Prompt) -> Result<String, ModelError> {
        let mut body = json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": prompt.system},
                {"role": "user", "content": prompt.user},
            ],
        });
        if prompt.expect_json {
            body["response_format"] = json!({"type": "json_object"});
        }

        let response = self.post(&self.url("/v1/chat/completions"), &body).await?;
        response
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(ModelError::EmptyResponse)
    }
}

#[async_trait]
impl LanguageModel for HttpLanguageModel {
    async fn complete(&self, prompt: &Prompt) -> Result<String, ModelError> {
        if !self.config.enabled {
            return Err(ModelError::Disabled);
        }

        debug!(model = %self.config.model, style = ?self.config.api_style, "Calling language model");
        let text = match self.config.api_style {
            ApiStyle::Ollama => self.call_ollama(prompt).await?,
            ApiStyle::OpenAi => self.call_openai_compatible(prompt).await?,
        };

        if text.trim().is_empty() {
            return Err(ModelError::EmptyResponse);
        }
        Ok(text)
    }
}
