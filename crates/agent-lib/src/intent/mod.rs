//! Intent extraction
//!
//! Turns a free-form question into an [`Intent`]. Extraction never fails:
//! anything it cannot interpret comes back as [`Intent::unresolved`] and
//! the resolver takes the degraded path.

mod keyword;
mod model;

pub use keyword::KeywordIntentExtractor;
pub use model::ModelIntentExtractor;

use crate::model::ModelError;
use crate::models::{Attribute, Intent, ResourceKind, ALL_NAMESPACES, DEFAULT_NAMESPACE};
use async_trait::async_trait;
use serde::Deserialize;

/// Which extractor the agent runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorMode {
    /// Language model with a constrained JSON schema
    #[default]
    Model,
    /// Deterministic phrase matching, no model calls
    Keyword,
}

#[async_trait]
pub trait IntentExtractor: Send + Sync {
    async fn extract(&self, query: &str) -> Intent;
}

/// Intent fields as emitted by the model, before vocabulary checks
#[derive(Debug, Default, Deserialize)]
struct RawIntent {
    #[serde(default)]
    resource_kind: Option<String>,
    #[serde(default)]
    attribute: Option<String>,
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    container: Option<String>,
}

/// Trim, and treat empty or null-like strings as absent
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().trim_matches(|c: char| c == '\'' || c == '"').trim().to_string())
        .filter(|v| !v.is_empty() && !matches!(v.to_ascii_lowercase().as_str(), "null" | "none"))
}

/// Map a namespace phrase to its canonical value
pub(crate) fn normalize_namespace(namespace: Option<String>) -> String {
    match clean(namespace) {
        None => DEFAULT_NAMESPACE.to_string(),
        Some(ns) => match ns.to_ascii_lowercase().as_str() {
            "*" | "all" | "all namespaces" | "any" => ALL_NAMESPACES.to_string(),
            lower => lower.to_string(),
        },
    }
}

/// Parse model output into an intent. The outermost `{...}` is used so
/// fenced or prefixed replies still parse; values outside the closed
/// vocabulary become `Unknown`.
pub fn parse_intent(text: &str) -> Result<Intent, ModelError> {
    let start = text.find('{');
    let end = text.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => {
            return Err(ModelError::InvalidOutput(
                "no JSON object in model output".to_string(),
            ))
        }
    };

    let raw: RawIntent =
        serde_json::from_str(json).map_err(|e| ModelError::InvalidOutput(e.to_string()))?;

    let resource_kind = ResourceKind::parse(raw.resource_kind.as_deref().unwrap_or_default());
    let mut attribute = Attribute::parse(raw.attribute.as_deref().unwrap_or_default());
    if resource_kind == ResourceKind::Log && attribute == Attribute::Unknown {
        attribute = Attribute::LogText;
    }

    Ok(Intent {
        resource_kind,
        namespace: normalize_namespace(raw.namespace),
        target: clean(raw.target),
        attribute,
        container: clean(raw.container),
    })
}
