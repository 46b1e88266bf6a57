//! Agent library for answering natural-language questions about a
//! Kubernetes cluster
//!
//! This crate provides the core functionality for:
//! - Intent extraction (language model or keyword rules)
//! - Action planning and read-only cluster inspection
//! - Result reduction to short answers
//! - Query resolution with a best-effort fallback
//! - Health checks and observability

pub mod health;
pub mod inspector;
pub mod intent;
pub mod model;
pub mod models;
pub mod observability;
pub mod planner;
pub mod prompts;
pub mod reducer;
pub mod resolver;

pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use inspector::{ClusterInspector, InspectorConfig, InspectorError, KubeInspector};
pub use intent::{ExtractorMode, IntentExtractor, KeywordIntentExtractor, ModelIntentExtractor};
pub use model::{HttpLanguageModel, LanguageModel, ModelConfig, ModelError, Prompt};
pub use models::*;
pub use observability::{QueryMetrics, ResolutionPath, StructuredLogger};
pub use resolver::{QueryResolver, ResolverConfig};
