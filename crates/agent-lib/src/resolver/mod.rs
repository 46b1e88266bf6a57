//! Query resolution
//!
//! Composes extraction, planning, cluster reads and reduction into one
//! call. Every failure is absorbed here: the caller always gets a
//! [`QueryResponse`], at worst carrying the "unable to determine" answer.

use crate::health::{components, HealthRegistry};
use crate::inspector::{execute, ClusterInspector, InspectorError};
use crate::intent::IntentExtractor;
use crate::model::{LanguageModel, ModelError, Prompt};
use crate::models::{Answer, ClusterSummary, QueryResponse, ResourceSnapshot};
use crate::observability::{QueryMetrics, ResolutionPath, StructuredLogger};
use crate::planner::{plan, Action};
use crate::prompts::{direct_answer_prompt, DIRECT_ANSWER_SYSTEM_PROMPT};
use crate::reducer::reduce;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};


/// Resolver settings
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// Upper bound for each extraction, cluster or model call
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Retry an unreachable cluster once before giving up
    #[serde(default = "default_retry_transient")]
    pub retry_transient: bool,
}

fn default_call_timeout_secs() -> u64 {
    20
}

fn default_retry_transient() -> bool {
    true
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            call_timeout_secs: default_call_timeout_secs(),
            retry_transient: default_retry_transient(),
        }
    }
}

/// Why the structured path was abandoned
#[derive(Debug, thiserror::Error)]
enum Fallback {
    #[error("intent extraction timed out after {0}s")]
    ExtractionTimeout(u64),

    #[error("question does not map to a cluster read")]
    Unresolvable,

    #[error("{action}: {source}")]
    Cluster {
        action: String,
        source: InspectorError,
    },

    #[error("{0}: timed out")]
    ClusterTimeout(String),
}

pub struct QueryResolver {
    inspector: Arc<dyn ClusterInspector>,
    model: Arc<dyn LanguageModel>,
    extractor: Arc<dyn IntentExtractor>,
    config: ResolverConfig,
    health: HealthRegistry,
    metrics: QueryMetrics,
    logger: StructuredLogger,
}

impl QueryResolver {
    pub fn new(
        inspector: Arc<dyn ClusterInspector>,
        model: Arc<dyn LanguageModel>,
        extractor: Arc<dyn IntentExtractor>,
        config: ResolverConfig,
        health: HealthRegistry,
    ) -> Self {
        Self {
            inspector,
            model,
            extractor,
            config,
            health,
            metrics: QueryMetrics::new(),
            logger: StructuredLogger::new("kubeqa"),
        }
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn health(&self) -> &HealthRegistry {
        &self.health
    }

    fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.config.call_timeout_secs)
    }

    /// Answer one question
    pub async fn resolve(&self, query: &str) -> QueryResponse {
        let started = Instant::now();
        self.logger.log_query_received(query);

        let (answer, path) = match self.structured(query).await {
            Ok(answer) => (answer, ResolutionPath::Structured),
            Err(reason) => {
                self.logger.log_degraded(query, &reason.to_string());
                (self.degraded(query).await, ResolutionPath::Degraded)
            }
        };

        let elapsed = started.elapsed();
        self.metrics.observe_query(path, elapsed.as_secs_f64());
        self.logger
            .log_query_answered(query, answer.as_str(), path, elapsed.as_millis());

        QueryResponse::new(query, answer)
    }

    async fn structured(&self, query: &str) -> Result<Answer, Fallback> {
        let intent = timeout(self.call_timeout(), self.extractor.extract(query))
            .await
            .map_err(|_| {
                self.metrics.inc_model_errors();
                Fallback::ExtractionTimeout(self.config.call_timeout_secs)
            })?;

        let actions = plan(&intent);
        if actions.is_empty() {
            return Err(Fallback::Unresolvable);
        }
        debug!(intent = ?intent, actions = actions.len(), "Planned cluster reads");

        let mut snapshots = Vec::with_capacity(actions.len());
        for action in &actions {
            match self.run(action).await {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(fallback) => {
                    let rejected = matches!(
                        fallback,
                        Fallback::Cluster {
                            source: InspectorError::Forbidden(_),
                            ..
                        }
                    );
                    self.cluster_failed(fallback.to_string(), rejected).await;
                    return Err(fallback);
                }
            }
        }
        self.health.set_healthy(components::CLUSTER).await;

        Ok(reduce(&intent, &snapshots))
    }

    /// Execute one action; a missing resource is an empty result
    async fn run(&self, action: &Action) -> Result<ResourceSnapshot, Fallback> {
        let attempts = if self.config.retry_transient { 2 } else { 1 };
        let mut attempt = 0;

        loop {
            attempt += 1;
            match timeout(self.call_timeout(), execute(self.inspector.as_ref(), action)).await {
                Ok(Ok(snapshot)) => return Ok(snapshot),
                Ok(Err(InspectorError::NotFound(what))) => {
                    debug!(action = %action, missing = %what, "Resource not found");
                    return Ok(ResourceSnapshot::empty(action.clone()));
                }
                Ok(Err(e)) if e.is_transient() && attempt < attempts => {
                    warn!(action = %action, error = %e, "Transient cluster failure, retrying");
                }
                Ok(Err(source)) => {
                    return Err(Fallback::Cluster {
                        action: action.to_string(),
                        source,
                    })
                }
                Err(_) => return Err(Fallback::ClusterTimeout(action.to_string())),
            }
        }
    }

    /// Direct model answer over a cluster summary
    async fn degraded(&self, query: &str) -> Answer {
        let summary = match self.summary().await {
            Some(summary) => summary,
            None => return Answer::undetermined(),
        };

        let prompt = Prompt::text(
            DIRECT_ANSWER_SYSTEM_PROMPT,
            direct_answer_prompt(query, &summary),
        );
        let reply = match timeout(self.call_timeout(), self.model.complete(&prompt)).await {
            Ok(result) => result,
            Err(_) => Err(ModelError::Timeout(self.config.call_timeout_secs)),
        };

        match reply {
            Ok(text) => {
                self.health.set_healthy(components::MODEL).await;
                normalize_reply(&text)
                    .map(Answer::new)
                    .unwrap_or_else(Answer::undetermined)
            }
            Err(ModelError::Disabled) => Answer::undetermined(),
            Err(e) => {
                warn!(error = %e, "Direct answer failed");
                self.metrics.inc_model_errors();
                self.health.set_degraded(components::MODEL, e.to_string()).await;
                Answer::undetermined()
            }
        }
    }

    async fn summary(&self) -> Option<ClusterSummary> {
        let (failure, rejected) =
            match timeout(self.call_timeout(), self.inspector.summary()).await {
                Ok(Ok(summary)) => {
                    self.health.set_healthy(components::CLUSTER).await;
                    return Some(summary);
                }
                Ok(Err(e)) => (e.to_string(), matches!(e, InspectorError::Forbidden(_))),
                Err(_) => (
                    format!("cluster summary timed out after {}s", self.config.call_timeout_secs),
                    false,
                ),
            };

        warn!(error = %failure, "No cluster context for direct answer");
        self.cluster_failed(failure, rejected).await;
        None
    }

    /// Rejected credentials mark the cluster unhealthy; other failures degrade it
    async fn cluster_failed(&self, message: String, rejected: bool) {
        self.metrics.inc_cluster_errors();
        if rejected {
            self.health.set_unhealthy(components::CLUSTER, message).await;
        } else {
            self.health.set_degraded(components::CLUSTER, message).await;
        }
    }
}

/// First non-empty line without wrapping quotes or a trailing period
pub(crate) fn normalize_reply(text: &str) -> Option<String> {
    let line = text.lines().map(str::trim).find(|l| !l.is_empty())?;
    let line = line
        .trim_end_matches('.')
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`'))
        .trim_end_matches('.')
        .trim();

    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}
