use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

/// Number of matches returned by search when `k` is omitted.
pub const DEFAULT_TOP_K: i64 = 5;

/// Distance metric for similarity calculations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Euclidean,
    #[serde(rename = "dotproduct")]
    DotProduct,
}

/// Serverless placement of a vector index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerlessSpec {
    pub cloud: String,
    pub region: String,
}

impl Default for ServerlessSpec {
    fn default() -> Self {
        Self {
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
        }
    }
}

/// Input for creating a vector index
#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndex {
    pub name: String,
    pub dimension: u32,
    pub metric: DistanceMetric,
    pub spec: ServerlessSpec,
}

/// Index state as reported by the vector store
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDescription {
    pub name: String,
    pub dimension: u32,
    pub metric: DistanceMetric,
    /// Data-plane host for record operations, once assigned.
    pub host: Option<String>,
    pub ready: bool,
    pub state: Option<String>,
}

/// Metadata stored next to every question vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionMetadata {
    pub question: String,
    pub sql_query: String,
    pub date_added: String,
}

impl QuestionMetadata {
    /// Stamp a question/query pair with the current UTC time.
    pub fn now(question: String, sql_query: String) -> Self {
        Self {
            question,
            sql_query,
            date_added: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}

/// A vector plus metadata, keyed by id
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: QuestionMetadata,
}

/// Nearest-neighbour query against the index
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub vector: Vec<f32>,
    /// Passed through to the store unchanged.
    pub top_k: i64,
    pub include_metadata: bool,
}

/// A scored match. Metadata is kept loose since stored records may predate
/// the current metadata shape.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatch {
    pub id: String,
    pub score: f32,
    pub metadata: Option<Map<String, Value>>,
}

/// Embedding generation result
#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    pub values: Vec<f32>,
    pub dimension: u32,
    pub tokens_used: u32,
}

/// Supported embedding models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingModel {
    /// OpenAI text-embedding-3-small (1536 dimensions)
    TextEmbedding3Small,
    /// OpenAI text-embedding-3-large (3072 dimensions)
    #[default]
    TextEmbedding3Large,
    /// OpenAI text-embedding-ada-002 (1536 dimensions, legacy)
    TextEmbeddingAda002,
}

impl EmbeddingModel {
    pub fn dimension(&self) -> u32 {
        match self {
            EmbeddingModel::TextEmbedding3Small => 1536,
            EmbeddingModel::TextEmbedding3Large => 3072,
            EmbeddingModel::TextEmbeddingAda002 => 1536,
        }
    }

    pub fn model_name(&self) -> &'static str {
        match self {
            EmbeddingModel::TextEmbedding3Small => "text-embedding-3-small",
            EmbeddingModel::TextEmbedding3Large => "text-embedding-3-large",
            EmbeddingModel::TextEmbeddingAda002 => "text-embedding-ada-002",
        }
    }
}

impl fmt::Display for EmbeddingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.model_name())
    }
}

impl FromStr for EmbeddingModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "text-embedding-3-small" => Ok(EmbeddingModel::TextEmbedding3Small),
            "text-embedding-3-large" => Ok(EmbeddingModel::TextEmbedding3Large),
            "text-embedding-ada-002" => Ok(EmbeddingModel::TextEmbeddingAda002),
            other => Err(format!("unsupported embedding model '{}'", other)),
        }
    }
}

// ===== HTTP DTOs =====

/// Body of `POST /upload`. Both fields are required and must be non-empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct UploadQuestion {
    #[schema(example = "How many orders shipped last week?")]
    pub question: Option<String>,
    #[schema(example = "SELECT COUNT(*) FROM orders WHERE shipped_at > now() - interval '7 days'")]
    pub sql_query: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    #[schema(example = "Uploaded successfully")]
    pub message: String,
    pub question_id: String,
}

/// Query string of `GET /search`.
///
/// `k` is kept as text so a non-integer value can be reported with the
/// same error shape as a missing question.
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Text to search for
    pub question: Option<String>,
    /// Number of matches to return (default 5)
    #[param(value_type = Option<i64>)]
    pub k: Option<String>,
}

impl SearchParams {
    /// Builds params from raw query pairs. When a key repeats, its first
    /// value is used.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "question" => &mut params.question,
                "k" => &mut params.k,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        params
    }
}

/// One search match. Metadata fields absent from the stored record are null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchHit {
    pub score: f32,
    pub question: Option<String>,
    pub sql_query: Option<String>,
    pub date_added: Option<String>,
    pub index_id: String,
}

impl From<VectorMatch> for SearchHit {
    fn from(m: VectorMatch) -> Self {
        let field = |name: &str| {
            m.metadata
                .as_ref()
                .and_then(|meta| meta.get(name))
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        Self {
            score: m.score,
            question: field("question"),
            sql_query: field("sql_query"),
            date_added: field("date_added"),
            index_id: m.id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    #[schema(example = "Question 0192f7c4-7a10-7000-8000-000000000000 deleted successfully.")]
    pub message: String,
}

/// Body returned for rejected client input.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClientErrorBody {
    #[schema(example = "Both 'question' and 'sql_query' are required.")]
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_search_params_first_value_wins() {
        let params = SearchParams::from_pairs(pairs(&[
            ("question", "a"),
            ("k", "2"),
            ("question", "b"),
            ("k", "9"),
            ("unrelated", "x"),
        ]));
        assert_eq!(params.question.as_deref(), Some("a"));
        assert_eq!(params.k.as_deref(), Some("2"));

        let empty_first = SearchParams::from_pairs(pairs(&[("question", ""), ("question", "b")]));
        assert_eq!(empty_first.question.as_deref(), Some(""));
        assert_eq!(empty_first.k, None);
    }

    #[test]
    fn test_model_names_round_trip_through_from_str() {
        for model in [
            EmbeddingModel::TextEmbedding3Small,
            EmbeddingModel::TextEmbedding3Large,
            EmbeddingModel::TextEmbeddingAda002,
        ] {
            assert_eq!(model.model_name().parse::<EmbeddingModel>().unwrap(), model);
        }
        assert!("gecko".parse::<EmbeddingModel>().is_err());
    }

    #[test]
    fn test_default_model_is_large() {
        assert_eq!(EmbeddingModel::default().dimension(), 3072);
        assert_eq!(EmbeddingModel::default().to_string(), "text-embedding-3-large");
    }

    #[test]
    fn test_metric_wire_names() {
        assert_eq!(json!(DistanceMetric::Cosine), json!("cosine"));
        assert_eq!(json!(DistanceMetric::DotProduct), json!("dotproduct"));
    }

    #[test]
    fn test_date_added_is_utc_rfc3339() {
        let meta = QuestionMetadata::now("q".into(), "s".into());
        assert!(meta.date_added.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&meta.date_added).is_ok());
    }

    #[test]
    fn test_search_hit_fills_missing_metadata_with_none() {
        let mut metadata = Map::new();
        metadata.insert("question".into(), json!("total revenue?"));
        metadata.insert("sql_query".into(), json!(42));

        let hit = SearchHit::from(VectorMatch {
            id: "abc".into(),
            score: 0.5,
            metadata: Some(metadata),
        });

        assert_eq!(hit.question.as_deref(), Some("total revenue?"));
        assert_eq!(hit.sql_query, None);
        assert_eq!(hit.date_added, None);
        assert_eq!(hit.index_id, "abc");

        let body = serde_json::to_value(&hit).unwrap();
        assert!(body["date_added"].is_null());
    }

    #[test]
    fn test_upload_body_tolerates_missing_fields() {
        let body: UploadQuestion = serde_json::from_value(json!({ "question": "q" })).unwrap();
        assert_eq!(body.question.as_deref(), Some("q"));
        assert!(body.sql_query.is_none());
    }
}
