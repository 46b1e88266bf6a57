//! Core data models for the query agent

use crate::planner::Action;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace used when a question does not name one
pub const DEFAULT_NAMESPACE: &str = "default";

/// Namespace value meaning "every namespace"
pub const ALL_NAMESPACES: &str = "*";

/// Category of cluster object a question is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Pod,
    Deployment,
    Node,
    Namespace,
    Log,
    Unknown,
}

impl ResourceKind {
    /// Parse from the closed vocabulary. Anything unrecognized is `Unknown`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pod" | "pods" => ResourceKind::Pod,
            "deployment" | "deployments" | "deploy" => ResourceKind::Deployment,
            "node" | "nodes" => ResourceKind::Node,
            "namespace" | "namespaces" | "ns" => ResourceKind::Namespace,
            "log" | "logs" => ResourceKind::Log,
            _ => ResourceKind::Unknown,
        }
    }

    /// Whether objects of this kind live inside a namespace
    pub fn is_namespaced(&self) -> bool {
        matches!(
            self,
            ResourceKind::Pod | ResourceKind::Deployment | ResourceKind::Log
        )
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Pod => "Pod",
            ResourceKind::Deployment => "Deployment",
            ResourceKind::Node => "Node",
            ResourceKind::Namespace => "Namespace",
            ResourceKind::Log => "Log",
            ResourceKind::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// The single fact a question asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    Count,
    Status,
    Name,
    LogText,
    Existence,
    Unknown,
}

impl Attribute {
    /// Parse from the closed vocabulary. Anything unrecognized is `Unknown`.
    pub fn parse(value: &str) -> Self {
        let normalized: String = value
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "count" => Attribute::Count,
            "status" => Attribute::Status,
            "name" => Attribute::Name,
            "logtext" | "log" | "logs" => Attribute::LogText,
            "existence" | "exists" => Attribute::Existence,
            _ => Attribute::Unknown,
        }
    }
}

/// Structured interpretation of a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub resource_kind: ResourceKind,
    pub namespace: String,
    /// Resource name or label selector
    pub target: Option<String>,
    pub attribute: Attribute,
    /// Container to read logs from, when a pod runs several
    pub container: Option<String>,
}

impl Intent {
    pub fn new(resource_kind: ResourceKind, attribute: Attribute) -> Self {
        Self {
            resource_kind,
            namespace: DEFAULT_NAMESPACE.to_string(),
            target: None,
            attribute,
            container: None,
        }
    }

    /// Intent produced when extraction fails outright
    pub fn unresolved() -> Self {
        Self::new(ResourceKind::Unknown, Attribute::Unknown)
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }

    /// False when the structured path cannot act on this intent
    pub fn is_resolvable(&self) -> bool {
        self.resource_kind != ResourceKind::Unknown && self.attribute != Attribute::Unknown
    }
}

/// Backward link from a resource to the controller that created it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRef {
    pub kind: String,
    pub name: String,
}

impl OwnerRef {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

/// One resource as read from the cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub kind: ResourceKind,
    pub name: String,
    pub namespace: Option<String>,
    pub status: Option<String>,
    /// Owner chain, nearest controller first
    pub owners: Vec<OwnerRef>,
}

impl ResourceRecord {
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            namespace: None,
            status: None,
            owners: Vec::new(),
        }
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn owned_by(mut self, kind: impl Into<String>, name: impl Into<String>) -> Self {
        self.owners.push(OwnerRef::new(kind, name));
        self
    }
}

/// Raw read result for one action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSnapshot {
    pub action: Action,
    pub records: Vec<ResourceRecord>,
    pub log_lines: Vec<String>,
}

impl ResourceSnapshot {
    pub fn records(action: Action, records: Vec<ResourceRecord>) -> Self {
        Self {
            action,
            records,
            log_lines: Vec::new(),
        }
    }

    pub fn logs(action: Action, log_lines: Vec<String>) -> Self {
        Self {
            action,
            records: Vec::new(),
            log_lines,
        }
    }

    pub fn empty(action: Action) -> Self {
        Self::records(action, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.log_lines.is_empty()
    }
}

/// Final answer text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Answer(String);

impl Answer {
    pub const NOT_FOUND: &'static str = "not found";
    pub const UNDETERMINED: &'static str = "unable to determine";

    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn not_found() -> Self {
        Self::new(Self::NOT_FOUND)
    }

    pub fn undetermined() -> Self {
        Self::new(Self::UNDETERMINED)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of `POST /query`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

/// Response of `POST /query`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub query: String,
    pub answer: String,
}

impl QueryResponse {
    pub fn new(query: impl Into<String>, answer: Answer) -> Self {
        Self {
            query: query.into(),
            answer: answer.into_string(),
        }
    }
}

/// Pods of one namespace, for the cluster summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespacePods {
    pub namespace: String,
    pub pods: Vec<String>,
}

/// Minimal cluster context handed to the model on the degraded path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub kubernetes_version: Option<String>,
    pub nodes: Vec<String>,
    pub namespaces: Vec<String>,
    pub pods: Vec<NamespacePods>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_kind_closed_vocabulary() {
        assert_eq!(ResourceKind::parse("Pods"), ResourceKind::Pod);
        assert_eq!(ResourceKind::parse(" deployment "), ResourceKind::Deployment);
        assert_eq!(ResourceKind::parse("NODE"), ResourceKind::Node);
        assert_eq!(ResourceKind::parse("namespaces"), ResourceKind::Namespace);
        assert_eq!(ResourceKind::parse("logs"), ResourceKind::Log);
        assert_eq!(ResourceKind::parse("StatefulSet"), ResourceKind::Unknown);
        assert_eq!(ResourceKind::parse(""), ResourceKind::Unknown);
    }

    #[test]
    fn test_attribute_closed_vocabulary() {
        assert_eq!(Attribute::parse("Count"), Attribute::Count);
        assert_eq!(Attribute::parse("log_text"), Attribute::LogText);
        assert_eq!(Attribute::parse("LogText"), Attribute::LogText);
        assert_eq!(Attribute::parse("existence"), Attribute::Existence);
        assert_eq!(Attribute::parse("memory"), Attribute::Unknown);
    }

    #[test]
    fn test_unresolved_intent() {
        let intent = Intent::unresolved();
        assert!(!intent.is_resolvable());
        assert_eq!(intent.namespace, DEFAULT_NAMESPACE);

        let partial = Intent::new(ResourceKind::Pod, Attribute::Unknown);
        assert!(!partial.is_resolvable());

        let full = Intent::new(ResourceKind::Pod, Attribute::Count);
        assert!(full.is_resolvable());
    }

    #[test]
    fn test_query_response_serialization() {
        let response = QueryResponse::new("How many pods?", Answer::new("3"));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json, serde_json::json!({"query": "How many pods?", "answer": "3"}));
    }
}
