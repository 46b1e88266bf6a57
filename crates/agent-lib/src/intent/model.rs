//! Model-backed intent extraction

use super::{parse_intent, IntentExtractor};
use crate::health::{components, HealthRegistry};
use crate::model::{LanguageModel, ModelError, Prompt};
use crate::models::Intent;
use crate::observability::QueryMetrics;
use crate::prompts::{intent_prompt, INTENT_SYSTEM_PROMPT};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Asks the language model for the intent fields and validates them
/// against the closed vocabulary. Hallucinated kinds or attributes are
/// contained here.
pub struct ModelIntentExtractor {
    model: Arc<dyn LanguageModel>,
    metrics: QueryMetrics,
    health: Option<HealthRegistry>,
}

impl ModelIntentExtractor {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            metrics: QueryMetrics::new(),
            health: None,
        }
    }

    /// Report call outcomes on the `model` health component
    pub fn with_health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    async fn failed(&self, error: &ModelError) -> Intent {
        // A disabled model is a configuration choice, not a failure
        if *error != ModelError::Disabled {
            self.metrics.inc_model_errors();
            if let Some(health) = &self.health {
                health.set_degraded(components::MODEL, error.to_string()).await;
            }
        }
        Intent::unresolved()
    }
}

#[async_trait]
impl IntentExtractor for ModelIntentExtractor {
    async fn extract(&self, query: &str) -> Intent {
        let prompt = Prompt::json(INTENT_SYSTEM_PROMPT, intent_prompt(query));

        let output = match self.model.complete(&prompt).await {
            Ok(output) => output,
            Err(e) => {
                warn!(error = %e, "Intent extraction call failed");
                return self.failed(&e).await;
            }
        };

        match parse_intent(&output) {
            Ok(intent) => {
                debug!(intent = ?intent, "Extracted intent");
                if let Some(health) = &self.health {
                    health.set_healthy(components::MODEL).await;
                }
                intent
            }
            Err(e) => {
                warn!(error = %e, "Unparseable intent from model");
                self.failed(&e).await
            }
        }
    }
}
