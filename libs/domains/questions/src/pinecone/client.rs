use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::config::PineconeConfig;
use crate::error::{QuestionError, QuestionResult};
use crate::models::{
    CreateIndex, DistanceMetric, IndexDescription, QueryRequest, QuestionMetadata,
    ServerlessSpec, VectorMatch, VectorRecord,
};
use crate::repository::VectorStore;

const API_KEY_HEADER: HeaderName = HeaderName::from_static("api-key");
const API_VERSION_HEADER: HeaderName = HeaderName::from_static("x-pinecone-api-version");

/// Pinecone-backed implementation of VectorStore
pub struct PineconeStore {
    client: Client,
    config: PineconeConfig,
    index_host: OnceCell<String>,
}

impl PineconeStore {
    pub fn new(config: PineconeConfig) -> QuestionResult<Self> {
        let mut api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| QuestionError::Config("PINECONE_API_KEY is not a valid header".into()))?;
        api_key.set_sensitive(true);

        let api_version = HeaderValue::from_str(&config.api_version).map_err(|_| {
            QuestionError::Config("PINECONE_API_VERSION is not a valid header".into())
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, api_key);
        headers.insert(API_VERSION_HEADER, api_version);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| QuestionError::Config(format!("HTTP client: {}", e)))?;

        let index_host = OnceCell::new_with(config.index_host.as_deref().map(normalize_host));

        Ok(Self {
            client,
            config,
            index_host,
        })
    }

    pub fn index_name(&self) -> &str {
        &self.config.index_name
    }

    fn controller_url(&self, path: &str) -> String {
        format!(
            "{}{}",
            self.config.controller_url.trim_end_matches('/'),
            path
        )
    }

    async fn data_url(&self, path: &str) -> QuestionResult<String> {
        let host = self
            .index_host
            .get_or_try_init(|| async {
                let name = &self.config.index_name;
                let description = self.describe_index(name).await?;
                let host = description
                    .host
                    .filter(|h| !h.trim().is_empty())
                    .ok_or_else(|| {
                        QuestionError::VectorStore(format!("index '{}' has no host yet", name))
                    })?;
                info!(index = %name, host = %host, "Resolved Pinecone index host");
                Ok::<_, QuestionError>(normalize_host(&host))
            })
            .await?;

        Ok(format!("{}{}", host, path))
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

fn transport_error(operation: &str, err: reqwest::Error) -> QuestionError {
    QuestionError::VectorStore(format!("{} request failed: {}", operation, err))
}

async fn ensure_success(operation: &str, response: Response) -> QuestionResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(QuestionError::VectorStore(format!(
        "{} failed ({}): {}",
        operation, status, body
    )))
}

async fn read_json<T: serde::de::DeserializeOwned>(
    operation: &str,
    response: Response,
) -> QuestionResult<T> {
    response.json().await.map_err(|e| {
        QuestionError::VectorStore(format!("{} returned an unexpected body: {}", operation, e))
    })
}

// ===== Wire types =====

#[derive(Debug, Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexModel>,
}

#[derive(Debug, Deserialize)]
struct IndexModel {
    name: String,
    dimension: u32,
    #[serde(default)]
    metric: DistanceMetric,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    status: Option<IndexStatus>,
}

#[derive(Debug, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    state: Option<String>,
}

impl From<IndexModel> for IndexDescription {
    fn from(model: IndexModel) -> Self {
        let (ready, state) = model
            .status
            .map(|s| (s.ready, s.state))
            .unwrap_or((false, None));

        Self {
            name: model.name,
            dimension: model.dimension,
            metric: model.metric,
            host: model.host,
            ready,
            state,
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateIndexBody<'a> {
    name: &'a str,
    dimension: u32,
    metric: DistanceMetric,
    spec: IndexSpec<'a>,
}

#[derive(Debug, Serialize)]
struct IndexSpec<'a> {
    serverless: &'a ServerlessSpec,
}

#[derive(Debug, Serialize)]
struct UpsertBody<'a> {
    vectors: Vec<WireVector<'a>>,
}

#[derive(Debug, Serialize)]
struct WireVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a QuestionMetadata,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryBody<'a> {
    vector: &'a [f32],
    top_k: i64,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<WireMatch>,
}

#[derive(Debug, Deserialize)]
struct WireMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize)]
struct DeleteBody<'a> {
    ids: &'a [String],
}

#[async_trait]
impl VectorStore for PineconeStore {
    async fn list_indexes(&self) -> QuestionResult<Vec<String>> {
        let response = self
            .client
            .get(self.controller_url("/indexes"))
            .send()
            .await
            .map_err(|e| transport_error("list_indexes", e))?;

        let list: IndexList = read_json(
            "list_indexes",
            ensure_success("list_indexes", response).await?,
        )
        .await?;

        Ok(list.indexes.into_iter().map(|i| i.name).collect())
    }

    async fn create_index(&self, input: CreateIndex) -> QuestionResult<()> {
        let body = CreateIndexBody {
            name: &input.name,
            dimension: input.dimension,
            metric: input.metric,
            spec: IndexSpec {
                serverless: &input.spec,
            },
        };

        let response = self
            .client
            .post(self.controller_url("/indexes"))
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("create_index", e))?;

        if response.status() == StatusCode::CONFLICT {
            info!(index = %input.name, "Index already exists");
            return Ok(());
        }

        ensure_success("create_index", response).await?;
        Ok(())
    }

    async fn describe_index(&self, name: &str) -> QuestionResult<IndexDescription> {
        let response = self
            .client
            .get(self.controller_url(&format!("/indexes/{}", name)))
            .send()
            .await
            .map_err(|e| transport_error("describe_index", e))?;

        let model: IndexModel = read_json(
            "describe_index",
            ensure_success("describe_index", response).await?,
        )
        .await?;

        Ok(model.into())
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> QuestionResult<u32> {
        let body = UpsertBody {
            vectors: records
                .iter()
                .map(|r| WireVector {
                    id: &r.id,
                    values: &r.values,
                    metadata: &r.metadata,
                })
                .collect(),
        };

        let response = self
            .client
            .post(self.data_url("/vectors/upsert").await?)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("upsert", e))?;

        let result: UpsertResponse =
            read_json("upsert", ensure_success("upsert", response).await?).await?;

        debug!(upserted = result.upserted_count, "Upserted vectors");
        Ok(result.upserted_count)
    }

    async fn query(&self, query: QueryRequest) -> QuestionResult<Vec<VectorMatch>> {
        let body = QueryBody {
            vector: &query.vector,
            top_k: query.top_k,
            include_metadata: query.include_metadata,
            include_values: false,
        };

        let response = self
            .client
            .post(self.data_url("/query").await?)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("query", e))?;

        let result: QueryResponse =
            read_json("query", ensure_success("query", response).await?).await?;

        Ok(result
            .matches
            .into_iter()
            .map(|m| VectorMatch {
                id: m.id,
                score: m.score,
                metadata: m.metadata,
            })
            .collect())
    }

    async fn delete(&self, ids: Vec<String>) -> QuestionResult<()> {
        let response = self
            .client
            .post(self.data_url("/vectors/delete").await?)
            .json(&DeleteBody { ids: &ids })
            .send()
            .await
            .map_err(|e| transport_error("delete", e))?;

        ensure_success("delete", response).await?;
        Ok(())
    }
}
