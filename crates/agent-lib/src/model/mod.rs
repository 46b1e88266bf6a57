//! Language model access
//!
//! The model is a black-box text-in/text-out service. It is used to
//! extract intents and to answer directly on the degraded path.

mod http;

pub use http::HttpLanguageModel;

use async_trait::async_trait;
use serde::Deserialize;

/// Language model configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub api_style: ApiStyle,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Wire protocol spoken by the model endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStyle {
    /// `POST /api/generate`
    #[default]
    Ollama,
    /// `POST /v1/chat/completions`
    OpenAi,
}

fn default_enabled() -> bool {
    true
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            api_style: ApiStyle::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// One model request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
    /// Ask the endpoint to constrain output to a JSON object
    pub expect_json: bool,
}

impl Prompt {
    pub fn text(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            expect_json: false,
        }
    }

    pub fn json(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            expect_json: true,
            ..Self::text(system, user)
        }
    }
}

/// Language model errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("language model is disabled in configuration")]
    Disabled,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("request timeout after {0} seconds")]
    Timeout(u64),

    #[error("language model returned an empty response")]
    EmptyResponse,

    #[error("invalid model output: {0}")]
    InvalidOutput(String),
}

/// Text completion service
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &Prompt) -> Result<String, ModelError>;
}
