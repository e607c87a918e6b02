//! Readiness check backed by the vector index state.

use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use axum_helpers::server::{HealthCheckFuture, run_health_checks};
use domain_questions::{QuestionService, VectorStore};
use std::sync::Arc;

/// Ready once the configured index can be described and reports ready.
pub async fn ready_handler<S: VectorStore>(
    State(service): State<Arc<QuestionService<S>>>,
) -> Response {
    let checks: Vec<(&str, HealthCheckFuture<'_>)> = vec![(
        "vector_store",
        Box::pin(async { service.check_ready().await.map_err(|e| e.to_string()) }),
    )];

    match run_health_checks(checks).await {
        Ok((status, json)) => (status, json).into_response(),
        Err((status, json)) => (status, json).into_response(),
    }
}

pub fn ready_router<S: VectorStore + 'static>(service: Arc<QuestionService<S>>) -> Router {
    Router::new()
        .route("/ready", get(ready_handler::<S>))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use domain_questions::{
        DistanceMetric, EmbeddingModel, EmbeddingProvider, EmbeddingResult, InMemoryVectorStore,
        QuestionResult, ServerlessSpec, models::CreateIndex,
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    struct UnusedEmbedder;

    #[async_trait]
    impl EmbeddingProvider for UnusedEmbedder {
        fn provider_name(&self) -> &'static str {
            "unused"
        }

        async fn embed(&self, _: EmbeddingModel, _: &str) -> QuestionResult<EmbeddingResult> {
            unreachable!("readiness never embeds")
        }
    }

    async fn ready(store: InMemoryVectorStore) -> (StatusCode, Value) {
        let service = QuestionService::new(store, Arc::new(UnusedEmbedder), "questions".into());
        let response = ready_router(Arc::new(service))
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_ready_when_index_exists() {
        let store = InMemoryVectorStore::new();
        store
            .create_index(CreateIndex {
                name: "questions".into(),
                dimension: 3072,
                metric: DistanceMetric::Cosine,
                spec: ServerlessSpec::default(),
            })
            .await
            .unwrap();

        let (status, body) = ready(store).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
        assert_eq!(body["vector_store"], "connected");
    }

    #[tokio::test]
    async fn test_not_ready_when_index_missing() {
        let (status, body) = ready(InMemoryVectorStore::new()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "not ready");
        assert_eq!(body["vector_store"], "disconnected");
    }
}
