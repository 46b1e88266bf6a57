//! HTTP API: question answering, health checks and Prometheus metrics

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use kubeqa_lib::{
    health::{ComponentStatus, HealthRegistry},
    QueryRequest, QueryResolver,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<QueryResolver>,
    pub health_registry: HealthRegistry,
}

impl AppState {
    pub fn new(resolver: Arc<QueryResolver>, health_registry: HealthRegistry) -> Self {
        Self {
            resolver,
            health_registry,
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Answer one question. Resolution itself never fails; only a malformed
/// request is turned away.
async fn query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return error_response(rejection.status(), rejection.body_text()),
    };

    if request.query.trim().is_empty() {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "query must not be empty");
    }

    let response = state.resolver.resolve(&request.query).await;
    (StatusCode::OK, Json(response)).into_response()
}

/// Health check response - returns 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still answering
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "metrics unavailable");
    }

    (
        StatusCode::OK,
        [("content-type", encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/query", post(query))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use kubeqa_lib::{
        health::components, Answer, ClusterInspector, ClusterSummary, InspectorError,
        KeywordIntentExtractor, LanguageModel, ModelError, Prompt, QueryResponse, ResolverConfig,
        ResourceKind, ResourceRecord,
    };
    use tower::ServiceExt;

    /// Two running pods in `default`, nothing else
    struct TwoPods;

    #[async_trait]
    impl ClusterInspector for TwoPods {
        async fn list(
            &self,
            kind: ResourceKind,
            _namespace: &str,
            _selector: Option<&str>,
        ) -> Result<Vec<ResourceRecord>, InspectorError> {
            Ok(match kind {
                ResourceKind::Pod => vec![
                    ResourceRecord::new(kind, "web-0").with_status("Running"),
                    ResourceRecord::new(kind, "web-1").with_status("Running"),
                ],
                _ => Vec::new(),
            })
        }

        async fn get(
            &self,
            _kind: ResourceKind,
            _namespace: &str,
            name: &str,
        ) -> Result<ResourceRecord, InspectorError> {
            Err(InspectorError::NotFound(name.to_string()))
        }

        async fn logs(
            &self,
            _namespace: &str,
            pod: &str,
            _container: Option<&str>,
        ) -> Result<Vec<String>, InspectorError> {
            Err(InspectorError::NotFound(pod.to_string()))
        }

        async fn summary(&self) -> Result<ClusterSummary, InspectorError> {
            Ok(ClusterSummary::default())
        }
    }

    struct SilentModel;

    #[async_trait]
    impl LanguageModel for SilentModel {
        async fn complete(&self, _prompt: &Prompt) -> Result<String, ModelError> {
            Err(ModelError::EmptyResponse)
        }
    }

    async fn test_state() -> Arc<AppState> {
        let health = HealthRegistry::new();
        health.register(components::CLUSTER).await;
        health.register(components::MODEL).await;

        let resolver = QueryResolver::new(
            Arc::new(TwoPods),
            Arc::new(SilentModel),
            Arc::new(KeywordIntentExtractor::new()),
            ResolverConfig::default(),
            health.clone(),
        );
        Arc::new(AppState::new(Arc::new(resolver), health))
    }

    fn post_query(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/query")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_query_returns_answer() {
        let app = create_router(test_state().await);

        let response = app
            .oneshot(post_query(
                r#"{"query": "How many pods are in the default namespace?"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: QueryResponse = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(body.query, "How many pods are in the default namespace?");
        assert_eq!(body.answer, "2");
    }

    #[tokio::test]
    async fn test_unanswerable_query_is_still_200() {
        let app = create_router(test_state().await);

        let response = app
            .oneshot(post_query(r#"{"query": "What's the weather like?"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["answer"], Answer::UNDETERMINED);
    }

    #[tokio::test]
    async fn test_empty_query_is_unprocessable() {
        let app = create_router(test_state().await);

        let response = app.oneshot(post_query(r#"{"query": "   "}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_malformed_body_is_client_error() {
        let app = create_router(test_state().await);

        let response = app.oneshot(post_query("not json")).await.unwrap();

        assert!(response.status().is_client_error());
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_missing_content_type_is_client_error() {
        let app = create_router(test_state().await);

        let request = Request::builder()
            .method("POST")
            .uri("/query")
            .body(Body::from(r#"{"query": "How many pods?"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_healthz_reports_components() {
        let state = test_state().await;
        let app = create_router(state.clone());

        let response = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert!(body["components"][components::CLUSTER].is_object());
    }

    #[tokio::test]
    async fn test_healthz_unhealthy_is_503() {
        let state = test_state().await;
        state
            .health_registry
            .set_unhealthy(components::CLUSTER, "credentials rejected")
            .await;
        let app = create_router(state);

        let response = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_readyz_follows_startup() {
        let state = test_state().await;

        let response = create_router(state.clone())
            .oneshot(Request::builder().uri("/readyz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.health_registry.set_ready(true).await;
        let response = create_router(state)
            .oneshot(Request::builder().uri("/readyz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_after_query() {
        let state = test_state().await;
        state.resolver.resolve("How many nodes are there?").await;

        let response = create_router(state)
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("kubeqa_queries_total"));
    }
}
