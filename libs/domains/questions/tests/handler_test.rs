//! Handler tests for the questions domain
//!
//! These drive the router end to end against the in-memory vector store and
//! a deterministic embedder:
//! - Request parsing and validation messages
//! - Response bodies and HTTP status codes
//! - Upload → search → delete round trips

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain_questions::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // For oneshot()

const INDEX: &str = "questions";

/// Hashes bytes into a fixed-width vector so equal texts embed identically.
struct StubEmbedder;

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    fn provider_name(&self) -> &'static str {
        "stub"
    }

    async fn embed(&self, model: EmbeddingModel, text: &str) -> QuestionResult<EmbeddingResult> {
        let dimension = model.dimension() as usize;
        let mut values = vec![0.0f32; dimension];
        for (i, byte) in text.bytes().enumerate() {
            values[(byte as usize * 31 + i * 7) % dimension] += 1.0;
        }
        Ok(EmbeddingResult {
            values,
            dimension: dimension as u32,
            tokens_used: text.split_whitespace().count() as u32,
        })
    }
}

struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    fn provider_name(&self) -> &'static str {
        "failing"
    }

    async fn embed(&self, _model: EmbeddingModel, _text: &str) -> QuestionResult<EmbeddingResult> {
        Err(QuestionError::Embedding(
            "OpenAI API error (401): Incorrect API key provided: sk-leak".to_string(),
        ))
    }
}

fn app_with(store: InMemoryVectorStore, embedder: Arc<dyn EmbeddingProvider>) -> Router {
    let service = QuestionService::new(store, embedder, INDEX.to_string())
        .with_model(EmbeddingModel::TextEmbedding3Small);
    handlers::router(Arc::new(service))
}

fn app(store: &InMemoryVectorStore) -> Router {
    app_with(store.clone(), Arc::new(StubEmbedder))
}

// Helper to parse JSON response body
async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn upload_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn upload(app: &Router, question: &str, sql_query: &str) -> String {
    let response = app
        .clone()
        .oneshot(upload_request(
            json!({ "question": question, "sql_query": sql_query }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["message"], "Uploaded successfully");
    body["question_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_upload_then_search_returns_the_stored_pair() {
    let store = InMemoryVectorStore::new();
    let app = app(&store);

    let question = "How many users signed up last week?";
    let sql = "SELECT COUNT(*) FROM users WHERE signup_date >= now() - interval '7 days'";
    let id = upload(&app, question, sql).await;
    assert!(!id.is_empty());
    upload(&app, "Which products are out of stock?", "SELECT * FROM products WHERE stock = 0").await;

    let response = app
        .oneshot(get(
            "/search?question=How%20many%20users%20signed%20up%20last%20week%3F&k=1",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["question"], question);
    assert_eq!(results[0]["sql_query"], sql);
    assert_eq!(results[0]["index_id"], id.as_str());
    assert!(results[0]["date_added"].as_str().unwrap().ends_with('Z'));
    assert!(results[0]["score"].as_f64().unwrap() > 0.99);
}

#[tokio::test]
async fn test_upload_rejects_missing_fields() {
    let store = InMemoryVectorStore::new();
    let app = app(&store);

    for body in [
        json!({ "question": "q" }),
        json!({ "sql_query": "SELECT 1" }),
        json!({}),
        json!({ "question": "", "sql_query": "SELECT 1" }),
        json!({ "question": "q", "sql_query": "" }),
    ] {
        let response = app.clone().oneshot(upload_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Both 'question' and 'sql_query' are required." })
        );
    }

    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_upload_rejects_malformed_json() {
    let store = InMemoryVectorStore::new();
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app(&store).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["error"], "JSON_EXTRACTION");
    assert_eq!(body["code"], 1003);
}

#[tokio::test]
async fn test_search_requires_question_regardless_of_k() {
    let store = InMemoryVectorStore::new();
    let app = app(&store);

    for uri in ["/search", "/search?k=3", "/search?k=abc", "/search?question=&k=2"] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "'question' parameter is required." })
        );
    }
}

#[tokio::test]
async fn test_search_rejects_non_integer_k() {
    let store = InMemoryVectorStore::new();

    let response = app(&store)
        .oneshot(get("/search?question=revenue&k=lots"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "'k' must be an integer." })
    );
}

#[tokio::test]
async fn test_search_uses_first_value_of_repeated_parameters() {
    let store = InMemoryVectorStore::new();
    let app = app(&store);
    upload(&app, "monthly revenue", "SELECT SUM(amount) FROM sales").await;
    upload(&app, "weekly revenue", "SELECT SUM(amount) FROM sales WHERE week = 1").await;

    let response = app
        .clone()
        .oneshot(get("/search?question=monthly%20revenue&question=other&k=1&k=5"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["question"], "monthly revenue");

    let response = app
        .oneshot(get("/search?question=&question=monthly%20revenue"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_accepts_k_beyond_64_bits() {
    let store = InMemoryVectorStore::new();
    let app = app(&store);
    upload(&app, "open tickets", "SELECT * FROM tickets WHERE open").await;
    upload(&app, "closed tickets", "SELECT * FROM tickets WHERE NOT open").await;

    let response = app
        .oneshot(get("/search?question=tickets&k=99999999999999999999"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_search_limits_results_to_k_in_score_order() {
    let store = InMemoryVectorStore::new();
    let app = app(&store);

    for (question, sql) in [
        ("total revenue by month", "SELECT month, SUM(amount) FROM sales GROUP BY month"),
        ("total revenue by year", "SELECT year, SUM(amount) FROM sales GROUP BY year"),
        ("active users today", "SELECT COUNT(*) FROM sessions WHERE day = current_date"),
        ("top customers", "SELECT customer_id FROM orders ORDER BY total DESC LIMIT 10"),
        ("refund rate", "SELECT AVG(refunded::int) FROM orders"),
    ] {
        upload(&app, question, sql).await;
    }

    let response = app
        .oneshot(get("/search?question=total%20revenue&k=3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let scores: Vec<f64> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["score"].as_f64().unwrap())
        .collect();

    assert_eq!(scores.len(), 3);
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_search_defaults_to_five_results() {
    let store = InMemoryVectorStore::new();
    let app = app(&store);

    for i in 0..7 {
        upload(&app, &format!("question number {}", i), "SELECT 1").await;
    }

    let response = app.oneshot(get("/search?question=question")).await.unwrap();
    let body = json_body(response).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_identical_uploads_create_distinct_records() {
    let store = InMemoryVectorStore::new();
    let app = app(&store);

    let first = upload(&app, "daily signups", "SELECT 1").await;
    let second = upload(&app, "daily signups", "SELECT 1").await;

    assert_ne!(first, second);
    assert_eq!(store.len().await, 2);
    assert!(store.get(&first).await.is_some());
    assert!(store.get(&second).await.is_some());
}

#[tokio::test]
async fn test_delete_removes_record_and_reports_id() {
    let store = InMemoryVectorStore::new();
    let app = app(&store);
    let id = upload(&app, "churned accounts", "SELECT * FROM accounts WHERE churned").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/delete/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "message": format!("Question {} deleted successfully.", id) })
    );
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_delete_unknown_id_still_succeeds() {
    let store = InMemoryVectorStore::new();

    let response = app(&store)
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/delete/does-not-exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("does-not-exist"));
}

#[tokio::test]
async fn test_embedding_failure_is_a_generic_server_error() {
    let store = InMemoryVectorStore::new();
    let app = app_with(store.clone(), Arc::new(FailingEmbedder));

    let response = app
        .oneshot(upload_request(
            json!({ "question": "q", "sql_query": "SELECT 1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["code"], 6001);
    assert_eq!(body["error"], "EMBEDDING_PROVIDER_ERROR");
    assert!(!body.to_string().contains("sk-leak"));
    assert!(store.is_empty().await);
}
