//! Observability for the query agent
//!
//! Provides:
//! - Prometheus metrics (query latency, resolution path, collaborator errors)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for end-to-end query latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0];

/// How a query was answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPath {
    /// Intent, plan, cluster reads, reduction
    Structured,
    /// Direct model answer (or the undetermined sentinel)
    Degraded,
}

impl ResolutionPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionPath::Structured => "structured",
            ResolutionPath::Degraded => "degraded",
        }
    }
}

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<QueryMetricsInner> = OnceLock::new();

struct QueryMetricsInner {
    query_latency_seconds: Histogram,
    queries_total: IntCounterVec,
    cluster_errors: IntCounter,
    model_errors: IntCounter,
}

impl QueryMetricsInner {
    fn new() -> Self {
        Self {
            query_latency_seconds: register_histogram!(
                "kubeqa_query_latency_seconds",
                "Time spent resolving a query end to end",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register query_latency_seconds"),

            queries_total: register_int_counter_vec!(
                "kubeqa_queries_total",
                "Queries answered, by resolution path",
                &["path"]
            )
            .expect("Failed to register queries_total"),

            cluster_errors: register_int_counter!(
                "kubeqa_cluster_errors_total",
                "Cluster API calls that failed or timed out"
            )
            .expect("Failed to register cluster_errors"),

            model_errors: register_int_counter!(
                "kubeqa_model_errors_total",
                "Language model calls that failed or timed out"
            )
            .expect("Failed to register model_errors"),
        }
    }
}

/// Lightweight handle to the global metrics; clones share the same
/// underlying collectors.
#[derive(Clone)]
pub struct QueryMetrics {
    _private: (),
}

impl Default for QueryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(QueryMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &QueryMetricsInner {
        GLOBAL_METRICS.get_or_init(QueryMetricsInner::new)
    }

    /// Record one answered query
    pub fn observe_query(&self, path: ResolutionPath, duration_secs: f64) {
        self.inner().query_latency_seconds.observe(duration_secs);
        self.inner()
            .queries_total
            .with_label_values(&[path.as_str()])
            .inc();
    }

    pub fn inc_cluster_errors(&self) {
        self.inner().cluster_errors.inc();
    }

    pub fn inc_model_errors(&self) {
        self.inner().model_errors.inc();
    }
}

/// Structured logger for agent events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_startup(&self, version: &str, port: u16, extractor: &str) {
        info!(
            event = "agent_started",
            instance = %self.instance,
            agent_version = %version,
            port = port,
            extractor = %extractor,
            "Query agent started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "agent_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Query agent shutting down"
        );
    }

    pub fn log_query_received(&self, query: &str) {
        info!(
            event = "query_received",
            instance = %self.instance,
            query = %query,
            "Received query"
        );
    }

    pub fn log_query_answered(
        &self,
        query: &str,
        answer: &str,
        path: ResolutionPath,
        duration_ms: u128,
    ) {
        info!(
            event = "query_answered",
            instance = %self.instance,
            query = %query,
            answer = %answer,
            path = path.as_str(),
            duration_ms = duration_ms as u64,
            "Generated answer"
        );
    }

    pub fn log_degraded(&self, query: &str, reason: &str) {
        warn!(
            event = "degraded_path",
            instance = %self.instance,
            query = %query,
            reason = %reason,
            "Falling back to direct model answer"
        );
    }
}
