//! Agent configuration

use anyhow::{Context, Result};
use kubeqa_lib::{ExtractorMode, InspectorConfig, ModelConfig, ResolverConfig};
use serde::Deserialize;

/// Environment variable naming the optional config file
const CONFIG_FILE_ENV: &str = "KUBEQA_CONFIG";

/// Agent configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Port for the query, health and metrics endpoints
    #[serde(default = "default_port")]
    pub port: u16,

    /// How questions are turned into intents
    #[serde(default)]
    pub extractor: ExtractorMode,

    #[serde(default)]
    pub cluster: InspectorConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,
}

fn default_port() -> u16 {
    8000
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            extractor: ExtractorMode::default(),
            cluster: InspectorConfig::default(),
            model: ModelConfig::default(),
            resolver: ResolverConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from an optional file, then `KUBEQA_*` environment
    /// variables (`KUBEQA_MODEL__ENDPOINT` sets `model.endpoint`)
    pub fn load() -> Result<Self> {
        let file = std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| "kubeqa".to_string());

        let builder = config::Config::builder()
            .add_source(config::File::with_name(&file).required(false))
            .add_source(
                config::Environment::with_prefix("KUBEQA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::from_builder(builder)
            .with_context(|| format!("Failed to load configuration (file: {})", file))
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        let config = builder.build().context("Invalid configuration sources")?;
        config
            .try_deserialize()
            .context("Configuration does not match the expected schema")
    }
}
