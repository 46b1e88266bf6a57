//! Kube query agent
//!
//! Serves `POST /query`: natural-language questions about the cluster it
//! runs against, answered with short facts read live from the API server.

use anyhow::{Context, Result};
use kubeqa_lib::{
    health::{components, HealthRegistry},
    observability::StructuredLogger,
    ExtractorMode, HttpLanguageModel, IntentExtractor, KeywordIntentExtractor, KubeInspector,
    LanguageModel, ModelIntentExtractor, QueryResolver,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting kubeqa-agent");

    let config = config::AgentConfig::load()?;
    info!(
        port = config.port,
        extractor = ?config.extractor,
        model = %config.model.model,
        "Agent configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::CLUSTER).await;
    health_registry.register(components::MODEL).await;

    let inspector = KubeInspector::new(&config.cluster)
        .await
        .context("Failed to initialize Kubernetes client")?;

    let model: Arc<dyn LanguageModel> = Arc::new(
        HttpLanguageModel::new(config.model.clone())
            .context("Failed to initialize language model client")?,
    );
    if !config.model.enabled {
        health_registry
            .set_degraded(components::MODEL, "disabled in configuration")
            .await;
    }

    let extractor: Arc<dyn IntentExtractor> = match config.extractor {
        ExtractorMode::Model => Arc::new(
            ModelIntentExtractor::new(model.clone()).with_health(health_registry.clone()),
        ),
        ExtractorMode::Keyword => Arc::new(KeywordIntentExtractor::new()),
    };

    let logger = StructuredLogger::new(format!("kubeqa-agent:{}", config.port));
    let extractor_name = format!("{:?}", config.extractor).to_lowercase();
    logger.log_startup(AGENT_VERSION, config.port, &extractor_name);

    let resolver = QueryResolver::new(
        Arc::new(inspector),
        model,
        extractor,
        config.resolver.clone(),
        health_registry.clone(),
    )
    .with_logger(logger.clone());

    let app_state = Arc::new(api::AppState::new(
        Arc::new(resolver),
        health_registry.clone(),
    ));

    // Mark agent as ready after initialization
    health_registry.set_ready(true).await;

    let api_handle = tokio::spawn(api::serve(config.port, app_state));

    tokio::select! {
        result = api_handle => {
            match result {
                Ok(Ok(())) => logger.log_shutdown("server stopped"),
                Ok(Err(e)) => {
                    error!(error = %e, "API server failed");
                    logger.log_shutdown("server error");
                    return Err(e);
                }
                Err(e) => {
                    error!(error = %e, "API server task panicked");
                    logger.log_shutdown("server task aborted");
                    return Err(e.into());
                }
            }
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for shutdown signal")?;
            logger.log_shutdown("SIGINT received");
        }
    }

    info!("Shutting down");
    Ok(())
}
