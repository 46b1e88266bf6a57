//! Read-only access to cluster state
//!
//! The [`ClusterInspector`] trait is the only way the resolver touches the
//! cluster. [`KubeInspector`] implements it over the Kubernetes API;
//! tests provide in-memory fixtures.

mod kubernetes;

pub use kubernetes::{deployment_record, namespace_record, node_record, pod_record, KubeInspector};

use crate::models::{ClusterSummary, ResourceKind, ResourceRecord, ResourceSnapshot};
use crate::planner::{Action, Operation};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;

/// Default number of log lines fetched per pod
pub const DEFAULT_LOG_TAIL_LINES: i64 = 100;

/// Cluster access failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InspectorError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    Forbidden(String),

    #[error("cluster unreachable: {0}")]
    Unreachable(String),

    #[error("cluster API error: {0}")]
    Api(String),
}

impl InspectorError {
    /// Worth one retry
    pub fn is_transient(&self) -> bool {
        matches!(self, InspectorError::Unreachable(_))
    }
}

/// Cluster connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct InspectorConfig {
    /// Kubeconfig file to read credentials from
    #[serde(default = "default_kubeconfig_path")]
    pub kubeconfig_path: PathBuf,

    /// Log lines requested per pod
    #[serde(default = "default_log_tail_lines")]
    pub log_tail_lines: i64,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            kubeconfig_path: default_kubeconfig_path(),
            log_tail_lines: default_log_tail_lines(),
        }
    }
}

/// `$KUBECONFIG`, else `~/.kube/config`
pub fn default_kubeconfig_path() -> PathBuf {
    if let Ok(path) = std::env::var("KUBECONFIG") {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("/root"))
        .join(".kube")
        .join("config")
}

fn default_log_tail_lines() -> i64 {
    DEFAULT_LOG_TAIL_LINES
}

/// Read-only facade over the cluster API
#[async_trait]
pub trait ClusterInspector: Send + Sync {
    /// List resources of a kind, optionally filtered by label selector
    async fn list(
        &self,
        kind: ResourceKind,
        namespace: &str,
        selector: Option<&str>,
    ) -> Result<Vec<ResourceRecord>, InspectorError>;

    /// Fetch one resource by name
    async fn get(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<ResourceRecord, InspectorError>;

    /// Read the tail of a pod's log
    async fn logs(
        &self,
        namespace: &str,
        pod: &str,
        container: Option<&str>,
    ) -> Result<Vec<String>, InspectorError>;

    /// Version, nodes, namespaces and pods, for model context
    async fn summary(&self) -> Result<ClusterSummary, InspectorError>;
}

/// Run one planned action
pub async fn execute(
    inspector: &dyn ClusterInspector,
    action: &Action,
) -> Result<ResourceSnapshot, InspectorError> {
    let target = action.target.as_deref();

    match action.operation {
        Operation::List => {
            let records = inspector
                .list(action.resource_kind, &action.namespace, target)
                .await?;
            Ok(ResourceSnapshot::records(action.clone(), records))
        }
        Operation::Get => {
            let name = target.ok_or_else(|| InspectorError::NotFound("no name given".into()))?;
            let record = inspector
                .get(action.resource_kind, &action.namespace, name)
                .await?;
            Ok(ResourceSnapshot::records(action.clone(), vec![record]))
        }
        Operation::Logs => {
            let pod = target.ok_or_else(|| InspectorError::NotFound("no pod given".into()))?;
            let lines = inspector
                .logs(&action.namespace, pod, action.container.as_deref())
                .await?;
            Ok(ResourceSnapshot::logs(action.clone(), lines))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OnePod;

    #[async_trait]
    impl ClusterInspector for OnePod {
        async fn list(
            &self,
            kind: ResourceKind,
            _namespace: &str,
            _selector: Option<&str>,
        ) -> Result<Vec<ResourceRecord>, InspectorError> {
            Ok(vec![ResourceRecord::new(kind, "example-pod")])
        }

        async fn get(
            &self,
            kind: ResourceKind,
            _namespace: &str,
            name: &str,
        ) -> Result<ResourceRecord, InspectorError> {
            if name == "example-pod" {
                Ok(ResourceRecord::new(kind, name))
            } else {
                Err(InspectorError::NotFound(name.to_string()))
            }
        }

        async fn logs(
            &self,
            _namespace: &str,
            _pod: &str,
            _container: Option<&str>,
        ) -> Result<Vec<String>, InspectorError> {
            Ok(vec!["ready".to_string()])
        }

        async fn summary(&self) -> Result<ClusterSummary, InspectorError> {
            Ok(ClusterSummary::default())
        }
    }

    #[tokio::test]
    async fn test_execute_dispatches_by_operation() {
        let inspector = OnePod;

        let list = execute(&inspector, &Action::list(ResourceKind::Pod, "default", None))
            .await
            .unwrap();
        assert_eq!(list.records.len(), 1);

        let get = execute(&inspector, &Action::get(ResourceKind::Pod, "default", "example-pod"))
            .await
            .unwrap();
        assert_eq!(get.records[0].name, "example-pod");

        let logs = execute(&inspector, &Action::logs("default", "example-pod", None))
            .await
            .unwrap();
        assert_eq!(logs.log_lines, vec!["ready".to_string()]);
    }

    #[tokio::test]
    async fn test_execute_propagates_not_found() {
        let err = execute(&OnePod, &Action::get(ResourceKind::Pod, "default", "ghost"))
            .await
            .unwrap_err();
        assert_eq!(err, InspectorError::NotFound("ghost".to_string()));
    }

    #[test]
    fn test_only_unreachable_is_transient() {
        assert!(InspectorError::Unreachable("timeout".into()).is_transient());
        assert!(!InspectorError::Forbidden("rbac".into()).is_transient());
        assert!(!InspectorError::NotFound("x".into()).is_transient());
    }
}
