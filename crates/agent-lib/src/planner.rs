//! Action planning
//!
//! Maps an [`Intent`] to the read operations needed to answer it. The
//! mapping is deterministic and never filters ambiguity itself: picking
//! one record out of several is the reducer's job.

use crate::models::{Attribute, Intent, ResourceKind};
use std::fmt;

/// Read operation issued against the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Get,
    Logs,
}

/// One cluster read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub operation: Operation,
    pub resource_kind: ResourceKind,
    pub namespace: String,
    /// Name for `Get`/`Logs`, label selector for `List`
    pub target: Option<String>,
    pub container: Option<String>,
}

impl Action {
    pub fn list(kind: ResourceKind, namespace: &str, selector: Option<&str>) -> Self {
        Self {
            operation: Operation::List,
            resource_kind: kind,
            namespace: namespace.to_string(),
            target: selector.map(str::to_string),
            container: None,
        }
    }

    pub fn get(kind: ResourceKind, namespace: &str, name: &str) -> Self {
        Self {
            operation: Operation::Get,
            resource_kind: kind,
            namespace: namespace.to_string(),
            target: Some(name.to_string()),
            container: None,
        }
    }

    pub fn logs(namespace: &str, pod: &str, container: Option<&str>) -> Self {
        Self {
            operation: Operation::Logs,
            resource_kind: ResourceKind::Pod,
            namespace: namespace.to_string(),
            target: Some(pod.to_string()),
            container: container.map(str::to_string),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {} in {}",
            self.operation, self.resource_kind, self.namespace
        )?;
        if let Some(target) = &self.target {
            write!(f, " [{}]", target)?;
        }
        Ok(())
    }
}

/// A target containing `=` is treated as a label selector (`app=web`,
/// `tier!=db`), anything else as a resource name.
pub fn is_label_selector(target: &str) -> bool {
    target.contains('=')
}

/// Plan the reads for an intent. An empty plan sends the resolver down
/// the degraded path.
pub fn plan(intent: &Intent) -> Vec<Action> {
    if !intent.is_resolvable() {
        return Vec::new();
    }

    let namespace = intent.namespace.as_str();
    let kind = intent.resource_kind;
    let target = intent
        .target
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    match intent.attribute {
        Attribute::LogText => match target {
            Some(pod) => vec![Action::logs(namespace, pod, intent.container.as_deref())],
            None => Vec::new(),
        },
        // Logs only answer log questions
        _ if kind == ResourceKind::Log => Vec::new(),
        Attribute::Count => {
            let selector = target.filter(|t| is_label_selector(t));
            vec![Action::list(kind, namespace, selector)]
        }
        Attribute::Status | Attribute::Name | Attribute::Existence => match target {
            Some(selector) if is_label_selector(selector) => {
                vec![Action::list(kind, namespace, Some(selector))]
            }
            Some(name) => {
                let mut actions = vec![Action::get(kind, namespace, name)];
                // Pod names are usually generated; let the reducer match the
                // target against owners and name prefixes as well.
                if kind == ResourceKind::Pod {
                    actions.push(Action::list(kind, namespace, None));
                }
                actions
            }
            None => vec![Action::list(kind, namespace, None)],
        },
        Attribute::Unknown => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_plans_unfiltered_list() {
        let intent = Intent::new(ResourceKind::Pod, Attribute::Count).with_target("web");
        let actions = plan(&intent);

        assert_eq!(actions, vec![Action::list(ResourceKind::Pod, "default", None)]);
    }

    #[test]
    fn test_count_passes_label_selector_through() {
        let intent = Intent::new(ResourceKind::Pod, Attribute::Count)
            .with_namespace("shop")
            .with_target("app=web");
        let actions = plan(&intent);

        assert_eq!(
            actions,
            vec![Action::list(ResourceKind::Pod, "shop", Some("app=web"))]
        );
    }

    #[test]
    fn test_status_of_named_pod_gets_then_lists() {
        let intent = Intent::new(ResourceKind::Pod, Attribute::Status).with_target("example-pod");
        let actions = plan(&intent);

        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].operation, Operation::Get);
        assert_eq!(actions[0].target.as_deref(), Some("example-pod"));
        assert_eq!(actions[1].operation, Operation::List);
        assert_eq!(actions[1].target, None);
    }

    #[test]
    fn test_status_of_named_deployment_only_gets() {
        let intent =
            Intent::new(ResourceKind::Deployment, Attribute::Status).with_target("my-deployment");
        let actions = plan(&intent);

        assert_eq!(
            actions,
            vec![Action::get(ResourceKind::Deployment, "default", "my-deployment")]
        );
    }

    #[test]
    fn test_name_without_target_lists() {
        let intent = Intent::new(ResourceKind::Deployment, Attribute::Name).with_namespace("db");
        let actions = plan(&intent);

        assert_eq!(actions, vec![Action::list(ResourceKind::Deployment, "db", None)]);
    }

    #[test]
    fn test_log_text_plans_logs() {
        let intent = Intent::new(ResourceKind::Log, Attribute::LogText)
            .with_target("api-0")
            .with_container("sidecar");
        let actions = plan(&intent);

        assert_eq!(actions, vec![Action::logs("default", "api-0", Some("sidecar"))]);
    }

    #[test]
    fn test_log_text_without_target_is_unplannable() {
        let intent = Intent::new(ResourceKind::Pod, Attribute::LogText);
        assert!(plan(&intent).is_empty());
    }

    #[test]
    fn test_log_kind_with_other_attribute_is_unplannable() {
        let intent = Intent::new(ResourceKind::Log, Attribute::Count);
        assert!(plan(&intent).is_empty());
    }

    #[test]
    fn test_unknown_intent_yields_empty_plan() {
        assert!(plan(&Intent::unresolved()).is_empty());
        assert!(plan(&Intent::new(ResourceKind::Unknown, Attribute::Count)).is_empty());
        assert!(plan(&Intent::new(ResourceKind::Node, Attribute::Unknown)).is_empty());
    }

    #[test]
    fn test_blank_target_is_ignored() {
        let intent = Intent::new(ResourceKind::Node, Attribute::Status).with_target("  ");
        assert_eq!(plan(&intent), vec![Action::list(ResourceKind::Node, "default", None)]);
    }
}
