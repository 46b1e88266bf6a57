//! Deterministic intent extraction from question phrasing
//!
//! No model calls: the same question always yields the same intent. Used
//! when no language model is available or when reproducibility matters
//! more than coverage.

use super::{normalize_namespace, IntentExtractor};
use crate::models::{Attribute, Intent, ResourceKind, ALL_NAMESPACES};
use crate::planner::is_label_selector;
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

/// Words after which a resource name usually follows
const TARGET_TRIGGERS: &[&str] = &["named", "called", "by", "of", "for"];

/// Words skipped between a trigger and the name
const FILLER: &[&str] = &[
    "the", "a", "an", "pod", "pods", "deployment", "deployments", "node", "nodes", "namespace",
    "namespaces", "container",
];

/// Words that end the search for a name
const STOPWORDS: &[&str] = &[
    "in", "is", "are", "there", "running", "cluster", "this", "that", "all", "each", "every",
    "it", "them", "logs", "log", "status", "state",
];

/// Resource nouns that may be followed directly by a name (`node worker-1`)
const KIND_NOUNS: &[&str] = &["pod", "node", "deployment", "deploy", "namespace"];

/// Words that can follow a resource noun without being a name
const NOT_A_NAME: &[&str] = &[
    "ready", "healthy", "available", "exist", "exists", "phase", "named", "called", "do",
    "does", "has", "have", "was", "were", "with", "on", "and", "or", "spawned", "created",
    "owned", "from", "to", "at",
];

static QUOTED: OnceLock<Regex> = OnceLock::new();
static IN_NAMESPACE: OnceLock<Regex> = OnceLock::new();
static NAMESPACE_NAMED: OnceLock<Regex> = OnceLock::new();

fn quoted() -> &'static Regex {
    QUOTED.get_or_init(|| {
        Regex::new(r#"['"`]([A-Za-z0-9][A-Za-z0-9._=/-]*)['"`]"#).expect("quoted pattern is valid")
    })
}

fn in_namespace() -> &'static Regex {
    IN_NAMESPACE.get_or_init(|| {
        Regex::new(r#"\bin (?:the )?['"`]?([a-z0-9][a-z0-9-]*)['"`]? namespace\b"#)
            .expect("namespace pattern is valid")
    })
}

fn namespace_named() -> &'static Regex {
    NAMESPACE_NAMED.get_or_init(|| {
        Regex::new(r#"\bnamespace (?:named |called )?['"`]?([a-z0-9][a-z0-9-]*)"#)
            .expect("namespace pattern is valid")
    })
}

/// Lowercased words with surrounding punctuation removed
fn tokenize(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric() && c != '=')
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

fn has_any(tokens: &[String], words: &[&str]) -> bool {
    tokens.iter().any(|t| words.contains(&t.as_str()))
}

fn resource_kind(tokens: &[String]) -> ResourceKind {
    if has_any(tokens, &["log", "logs"]) {
        ResourceKind::Log
    } else if has_any(tokens, &["pod", "pods"]) {
        ResourceKind::Pod
    } else if has_any(tokens, &["deployment", "deployments", "deploy"]) {
        ResourceKind::Deployment
    } else if has_any(tokens, &["node", "nodes"]) {
        ResourceKind::Node
    } else if has_any(tokens, &["namespace", "namespaces"]) {
        ResourceKind::Namespace
    } else {
        ResourceKind::Unknown
    }
}

fn attribute(lower: &str, tokens: &[String]) -> Attribute {
    if lower.contains("how many") || lower.contains("number of") || has_any(tokens, &["count"]) {
        Attribute::Count
    } else if has_any(tokens, &["log", "logs"]) {
        Attribute::LogText
    } else if has_any(tokens, &["status", "state", "phase", "healthy", "ready"]) {
        Attribute::Status
    } else if lower.contains("is there")
        || lower.contains("are there")
        || has_any(tokens, &["exist", "exists"])
    {
        Attribute::Existence
    } else if has_any(tokens, &["which", "name", "named", "called"]) || lower.starts_with("what pod")
    {
        Attribute::Name
    } else {
        Attribute::Unknown
    }
}

fn namespace(lower: &str) -> Option<String> {
    if lower.contains("all namespaces") || lower.contains("every namespace") {
        return Some(ALL_NAMESPACES.to_string());
    }

    in_namespace()
        .captures(lower)
        .or_else(|| namespace_named().captures(lower))
        .map(|c| c[1].to_string())
}

fn word_after(tokens: &[String], triggers: &[&str]) -> Option<String> {
    for (i, token) in tokens.iter().enumerate() {
        if !triggers.contains(&token.as_str()) {
            continue;
        }
        let candidate = tokens[i + 1..]
            .iter()
            .find(|t| !FILLER.contains(&t.as_str()));
        if let Some(word) = candidate {
            if !STOPWORDS.contains(&word.as_str()) {
                return Some(word.clone());
            }
        }
    }
    None
}

fn target(query: &str, tokens: &[String], namespace: Option<&str>) -> Option<String> {
    if let Some(selector) = tokens.iter().find(|t| is_label_selector(t)) {
        return Some(selector.clone());
    }

    // A quoted name wins unless it is the namespace itself
    let quoted = quoted()
        .captures_iter(query)
        .map(|c| c[1].to_string())
        .find(|name| Some(name.to_ascii_lowercase().as_str()) != namespace);
    if quoted.is_some() {
        return quoted;
    }

    word_after(tokens, TARGET_TRIGGERS)
        .or_else(|| name_after_noun(tokens))
        .filter(|word| Some(word.as_str()) != namespace)
}

/// The word right after a resource noun, when it reads like a name
fn name_after_noun(tokens: &[String]) -> Option<String> {
    tokens
        .windows(2)
        .find(|pair| {
            let next = pair[1].as_str();
            KIND_NOUNS.contains(&pair[0].as_str())
                && !STOPWORDS.contains(&next)
                && !FILLER.contains(&next)
                && !NOT_A_NAME.contains(&next)
        })
        .map(|pair| pair[1].clone())
}

/// Extract an intent from phrasing alone
pub fn extract_keywords(query: &str) -> Intent {
    let lower = query.to_lowercase();
    let tokens = tokenize(query);

    let resource_kind = resource_kind(&tokens);
    let mut attribute = attribute(&lower, &tokens);
    if resource_kind == ResourceKind::Log {
        attribute = Attribute::LogText;
    }

    // For namespace questions the named namespace is the target, not the scope
    let namespace = match resource_kind {
        ResourceKind::Namespace => None,
        _ => namespace(&lower),
    };
    let target = target(query, &tokens, namespace.as_deref());
    let container = word_after(&tokens, &["container"]);

    Intent {
        resource_kind,
        namespace: normalize_namespace(namespace),
        target,
        attribute,
        container,
    }
}

/// [`IntentExtractor`] over [`extract_keywords`]
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordIntentExtractor;

impl KeywordIntentExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl IntentExtractor for KeywordIntentExtractor {
    async fn extract(&self, query: &str) -> Intent {
        extract_keywords(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_NAMESPACE;

    #[test]
    fn test_count_pods_in_default_namespace() {
        let intent = extract_keywords("How many pods are in the default namespace?");

        assert_eq!(intent, Intent::new(ResourceKind::Pod, Attribute::Count));
    }

    #[test]
    fn test_pod_spawned_by_deployment() {
        let intent = extract_keywords("Which pod is spawned by my-deployment?");

        assert_eq!(intent.resource_kind, ResourceKind::Pod);
        assert_eq!(intent.attribute, Attribute::Name);
        assert_eq!(intent.target.as_deref(), Some("my-deployment"));
    }

    #[test]
    fn test_status_of_quoted_pod() {
        let intent = extract_keywords("What is the status of the pod named 'example-pod'?");

        assert_eq!(intent.resource_kind, ResourceKind::Pod);
        assert_eq!(intent.attribute, Attribute::Status);
        assert_eq!(intent.target.as_deref(), Some("example-pod"));
    }

    #[test]
    fn test_count_nodes_in_cluster() {
        let intent = extract_keywords("How many nodes are there in the cluster?");

        assert_eq!(intent, Intent::new(ResourceKind::Node, Attribute::Count));
    }

    #[test]
    fn test_named_namespace() {
        let intent = extract_keywords("How many deployments are in namespace kube-system?");

        assert_eq!(intent.resource_kind, ResourceKind::Deployment);
        assert_eq!(intent.namespace, "kube-system");
        assert_eq!(intent.target, None);
    }

    #[test]
    fn test_all_namespaces() {
        let intent = extract_keywords("How many pods are running across all namespaces?");
        assert_eq!(intent.namespace, ALL_NAMESPACES);
    }

    #[test]
    fn test_logs_with_container() {
        let intent = extract_keywords("Show the logs of api-0 container sidecar in the shop namespace");

        assert_eq!(intent.resource_kind, ResourceKind::Log);
        assert_eq!(intent.attribute, Attribute::LogText);
        assert_eq!(intent.target.as_deref(), Some("api-0"));
        assert_eq!(intent.container.as_deref(), Some("sidecar"));
        assert_eq!(intent.namespace, "shop");
    }

    #[test]
    fn test_label_selector_target() {
        let intent = extract_keywords("How many pods match app=web?");

        assert_eq!(intent.attribute, Attribute::Count);
        assert_eq!(intent.target.as_deref(), Some("app=web"));
    }

    #[test]
    fn test_existence() {
        let intent = extract_keywords("Is there a namespace called 'monitoring'?");

        assert_eq!(intent.resource_kind, ResourceKind::Namespace);
        assert_eq!(intent.attribute, Attribute::Existence);
        assert_eq!(intent.target.as_deref(), Some("monitoring"));
        assert_eq!(intent.namespace, DEFAULT_NAMESPACE);
    }

    #[test]
    fn test_double_quoted_namespace() {
        let intent = extract_keywords(r#"How many pods are in the "kube-system" namespace?"#);

        assert_eq!(intent.attribute, Attribute::Count);
        assert_eq!(intent.namespace, "kube-system");
        assert_eq!(intent.target, None);

        let named = extract_keywords(r#"How many deployments are in namespace "shop"?"#);
        assert_eq!(named.namespace, "shop");
        assert_eq!(named.target, None);
    }

    #[test]
    fn test_name_right_after_kind_noun() {
        let intent = extract_keywords("Is node worker-1 ready?");

        assert_eq!(intent.resource_kind, ResourceKind::Node);
        assert_eq!(intent.attribute, Attribute::Status);
        assert_eq!(intent.target.as_deref(), Some("worker-1"));

        let deployment = extract_keywords("What is the status of deployment web?");
        assert_eq!(deployment.resource_kind, ResourceKind::Deployment);
        assert_eq!(deployment.target.as_deref(), Some("web"));

        let existence = extract_keywords("Does namespace kube-system exist?");
        assert_eq!(existence.resource_kind, ResourceKind::Namespace);
        assert_eq!(existence.target.as_deref(), Some("kube-system"));
    }

    #[test]
    fn test_noun_followed_by_verb_is_not_a_target() {
        assert_eq!(extract_keywords("Is the node ready?").target, None);
        assert_eq!(
            extract_keywords("Which pod is spawned by web?").target.as_deref(),
            Some("web")
        );
    }

    #[test]
    fn test_unrelated_question_is_unresolved() {
        let intent = extract_keywords("What's the weather like?");
        assert!(!intent.is_resolvable());
    }
}
