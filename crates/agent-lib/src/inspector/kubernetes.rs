//! Kubernetes API implementation of the cluster inspector

use super::{ClusterInspector, InspectorConfig, InspectorError};
use crate::models::{
    ClusterSummary, NamespacePods, OwnerRef, ResourceKind, ResourceRecord, ALL_NAMESPACES,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{Namespace, Node, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, ListParams, LogParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use tracing::{debug, info, warn};

/// Parent lookups already done during one call, keyed by
/// (namespace, kind, name)
type OwnerCache = HashMap<(String, String, String), Option<OwnerRef>>;

/// Cluster inspector backed by a kube-rs client
///
/// The client is a cheap, cloneable handle and safe to share across
/// concurrent requests.
#[derive(Clone)]
pub struct KubeInspector {
    client: Client,
    log_tail_lines: i64,
}

impl KubeInspector {
    /// Connect using the kubeconfig at the configured path, falling back
    /// to inferred (in-cluster) configuration when the file is missing.
    pub async fn new(config: &InspectorConfig) -> Result<Self> {
        let path = &config.kubeconfig_path;

        let kube_config = if path.exists() {
            info!(path = %path.display(), "Kubeconfig found");
            let kubeconfig = Kubeconfig::read_from(path)
                .with_context(|| format!("Failed to read kubeconfig from {}", path.display()))?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .context("Failed to load kubeconfig")?
        } else {
            warn!(path = %path.display(), "Kubeconfig file not found, inferring configuration");
            Config::infer()
                .await
                .context("Failed to infer Kubernetes configuration")?
        };

        let client = Client::try_from(kube_config).context("Failed to create Kubernetes client")?;
        Ok(Self::from_client(client, config.log_tail_lines))
    }

    /// Wrap an existing client
    pub fn from_client(client: Client, log_tail_lines: i64) -> Self {
        Self {
            client,
            log_tail_lines,
        }
    }

    fn scoped<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        <K as Resource>::DynamicType: Default,
    {
        if namespace == ALL_NAMESPACES {
            Api::all(self.client.clone())
        } else {
            Api::namespaced(self.client.clone(), namespace)
        }
    }

    /// Get by name; across all namespaces this becomes a field-selected list
    async fn fetch<K>(&self, api: Api<K>, namespace: &str, name: &str) -> Result<K, InspectorError>
    where
        K: Clone + DeserializeOwned + Debug,
    {
        if namespace == ALL_NAMESPACES {
            let params = ListParams::default().fields(&format!("metadata.name={}", name));
            let list = api.list(&params).await.map_err(map_error)?;
            list.items
                .into_iter()
                .next()
                .ok_or_else(|| InspectorError::NotFound(name.to_string()))
        } else {
            api.get(name).await.map_err(map_error)
        }
    }

    /// Controller one level above `owner`, for the kinds that have one
    async fn parent_of(
        &self,
        namespace: &str,
        owner: &OwnerRef,
        cache: &mut OwnerCache,
    ) -> Option<OwnerRef> {
        let key = (
            namespace.to_string(),
            owner.kind.clone(),
            owner.name.clone(),
        );
        if let Some(hit) = cache.get(&key) {
            return hit.clone();
        }

        let refs = match owner.kind.as_str() {
            "ReplicaSet" => Api::<ReplicaSet>::namespaced(self.client.clone(), namespace)
                .get_opt(&owner.name)
                .await
                .map(|rs| rs.map(|rs| rs.owner_references().to_vec())),
            "Job" => Api::<Job>::namespaced(self.client.clone(), namespace)
                .get_opt(&owner.name)
                .await
                .map(|job| job.map(|job| job.owner_references().to_vec())),
            _ => return None,
        };

        let parent = match refs {
            Ok(Some(refs)) => controller_of(&refs),
            Ok(None) => None,
            Err(e) => {
                debug!(kind = %owner.kind, name = %owner.name, error = %e, "Owner lookup failed");
                None
            }
        };

        cache.insert(key, parent.clone());
        parent
    }

    /// Convert a pod and extend its owner chain one hop
    async fn resolve_pod(&self, pod: &Pod, cache: &mut OwnerCache) -> ResourceRecord {
        let mut record = pod_record(pod);
        if let (Some(namespace), Some(owner)) = (record.namespace.clone(), record.owners.first().cloned()) {
            if let Some(parent) = self.parent_of(&namespace, &owner, cache).await {
                record.owners.push(parent);
            }
        }
        record
    }
}

/// The controlling owner reference, else the first one
fn controller_of(refs: &[OwnerReference]) -> Option<OwnerRef> {
    refs.iter()
        .find(|r| r.controller == Some(true))
        .or_else(|| refs.first())
        .map(|r| OwnerRef::new(r.kind.clone(), r.name.clone()))
}

fn condition_status<'a, I>(conditions: I, kind: &str) -> Option<bool>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    conditions
        .into_iter()
        .find(|(type_, _)| *type_ == kind)
        .map(|(_, status)| status == "True")
}

/// Pod with its direct controller; phase as status
pub fn pod_record(pod: &Pod) -> ResourceRecord {
    ResourceRecord {
        kind: ResourceKind::Pod,
        name: pod.name_any(),
        namespace: pod.namespace(),
        status: pod.status.as_ref().and_then(|s| s.phase.clone()),
        owners: controller_of(pod.owner_references()).into_iter().collect(),
    }
}

/// Deployment; `Available` / `Unavailable` from its Available condition
pub fn deployment_record(deployment: &Deployment) -> ResourceRecord {
    let available = deployment
        .status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .and_then(|conditions| {
            condition_status(
                conditions.iter().map(|c| (c.type_.as_str(), c.status.as_str())),
                "Available",
            )
        });

    ResourceRecord {
        kind: ResourceKind::Deployment,
        name: deployment.name_any(),
        namespace: deployment.namespace(),
        status: available.map(|a| if a { "Available" } else { "Unavailable" }.to_string()),
        owners: Vec::new(),
    }
}

/// Node; `Ready` / `NotReady` from its Ready condition
pub fn node_record(node: &Node) -> ResourceRecord {
    let ready = node
        .status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .and_then(|conditions| {
            condition_status(
                conditions.iter().map(|c| (c.type_.as_str(), c.status.as_str())),
                "Ready",
            )
        });

    ResourceRecord {
        kind: ResourceKind::Node,
        name: node.name_any(),
        namespace: None,
        status: ready.map(|r| if r { "Ready" } else { "NotReady" }.to_string()),
        owners: Vec::new(),
    }
}

/// Namespace; phase as status
pub fn namespace_record(namespace: &Namespace) -> ResourceRecord {
    ResourceRecord {
        kind: ResourceKind::Namespace,
        name: namespace.name_any(),
        namespace: None,
        status: namespace.status.as_ref().and_then(|s| s.phase.clone()),
        owners: Vec::new(),
    }
}

fn map_error(err: kube::Error) -> InspectorError {
    match err {
        kube::Error::Api(response) => match response.code {
            404 => InspectorError::NotFound(response.message),
            401 | 403 => InspectorError::Forbidden(response.message),
            code => InspectorError::Api(format!("{} ({})", response.message, code)),
        },
        kube::Error::HyperError(e) => InspectorError::Unreachable(e.to_string()),
        kube::Error::Service(e) => InspectorError::Unreachable(e.to_string()),
        other => InspectorError::Api(other.to_string()),
    }
}

fn list_params(selector: Option<&str>) -> ListParams {
    match selector {
        Some(selector) => ListParams::default().labels(selector),
        None => ListParams::default(),
    }
}

fn unsupported(kind: ResourceKind) -> InspectorError {
    InspectorError::Api(format!("{} is not a readable resource kind", kind))
}

#[async_trait]
impl ClusterInspector for KubeInspector {
    async fn list(
        &self,
        kind: ResourceKind,
        namespace: &str,
        selector: Option<&str>,
    ) -> Result<Vec<ResourceRecord>, InspectorError> {
        let params = list_params(selector);
        debug!(kind = %kind, namespace = %namespace, selector = ?selector, "Listing resources");

        match kind {
            ResourceKind::Pod => {
                let pods = self
                    .scoped::<Pod>(namespace)
                    .list(&params)
                    .await
                    .map_err(map_error)?;
                let mut cache = OwnerCache::new();
                let mut records = Vec::with_capacity(pods.items.len());
                for pod in &pods.items {
                    records.push(self.resolve_pod(pod, &mut cache).await);
                }
                Ok(records)
            }
            ResourceKind::Deployment => {
                let deployments = self
                    .scoped::<Deployment>(namespace)
                    .list(&params)
                    .await
                    .map_err(map_error)?;
                Ok(deployments.items.iter().map(deployment_record).collect())
            }
            ResourceKind::Node => {
                let nodes = Api::<Node>::all(self.client.clone())
                    .list(&params)
                    .await
                    .map_err(map_error)?;
                Ok(nodes.items.iter().map(node_record).collect())
            }
            ResourceKind::Namespace => {
                let namespaces = Api::<Namespace>::all(self.client.clone())
                    .list(&params)
                    .await
                    .map_err(map_error)?;
                Ok(namespaces.items.iter().map(namespace_record).collect())
            }
            ResourceKind::Log | ResourceKind::Unknown => Err(unsupported(kind)),
        }
    }

    async fn get(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<ResourceRecord, InspectorError> {
        debug!(kind = %kind, namespace = %namespace, name = %name, "Getting resource");

        match kind {
            ResourceKind::Pod => {
                let pod = self.fetch(self.scoped::<Pod>(namespace), namespace, name).await?;
                let mut cache = OwnerCache::new();
                Ok(self.resolve_pod(&pod, &mut cache).await)
            }
            ResourceKind::Deployment => {
                let deployment = self
                    .fetch(self.scoped::<Deployment>(namespace), namespace, name)
                    .await?;
                Ok(deployment_record(&deployment))
            }
            ResourceKind::Node => {
                let node = Api::<Node>::all(self.client.clone())
                    .get(name)
                    .await
                    .map_err(map_error)?;
                Ok(node_record(&node))
            }
            ResourceKind::Namespace => {
                let ns = Api::<Namespace>::all(self.client.clone())
                    .get(name)
                    .await
                    .map_err(map_error)?;
                Ok(namespace_record(&ns))
            }
            ResourceKind::Log | ResourceKind::Unknown => Err(unsupported(kind)),
        }
    }

    async fn logs(
        &self,
        namespace: &str,
        pod: &str,
        container: Option<&str>,
    ) -> Result<Vec<String>, InspectorError> {
        // Logs need a concrete namespace
        let namespace = if namespace == ALL_NAMESPACES {
            let found = self.fetch(self.scoped::<Pod>(namespace), namespace, pod).await?;
            found
                .namespace()
                .ok_or_else(|| InspectorError::NotFound(pod.to_string()))?
        } else {
            namespace.to_string()
        };

        let params = LogParams {
            container: container.map(str::to_string),
            tail_lines: Some(self.log_tail_lines),
            timestamps: false,
            ..LogParams::default()
        };

        debug!(namespace = %namespace, pod = %pod, container = ?container, "Reading pod logs");
        let text = Api::<Pod>::namespaced(self.client.clone(), &namespace)
            .logs(pod, &params)
            .await
            .map_err(map_error)?;

        Ok(text.lines().map(str::to_string).collect())
    }

    async fn summary(&self) -> Result<ClusterSummary, InspectorError> {
        let kubernetes_version = match self.client.apiserver_version().await {
            Ok(info) => Some(info.git_version),
            Err(e) => {
                debug!(error = %e, "Could not read API server version");
                None
            }
        };

        let nodes = self.list(ResourceKind::Node, ALL_NAMESPACES, None).await?;
        let namespaces = self
            .list(ResourceKind::Namespace, ALL_NAMESPACES, None)
            .await?;

        let pods = Api::<Pod>::all(self.client.clone())
            .list(&ListParams::default())
            .await
            .map_err(map_error)?;
        let mut by_namespace: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for pod in &pods.items {
            by_namespace
                .entry(pod.namespace().unwrap_or_default())
                .or_default()
                .push(pod.name_any());
        }

        Ok(ClusterSummary {
            kubernetes_version,
            nodes: nodes.into_iter().map(|n| n.name).collect(),
            namespaces: namespaces.into_iter().map(|n| n.name).collect(),
            pods: by_namespace
                .into_iter()
                .map(|(namespace, pods)| NamespacePods { namespace, pods })
                .collect(),
        })
    }
}
