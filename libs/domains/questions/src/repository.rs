use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{QuestionError, QuestionResult};
use crate::models::{CreateIndex, IndexDescription, QueryRequest, VectorMatch, VectorRecord};

/// Vector index operations.
///
/// Control-plane calls name the index explicitly. Record calls target the
/// index the store was configured with.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Names of all indexes visible to the account
    async fn list_indexes(&self) -> QuestionResult<Vec<String>>;

    async fn create_index(&self, input: CreateIndex) -> QuestionResult<()>;

    async fn describe_index(&self, name: &str) -> QuestionResult<IndexDescription>;

    /// Insert or replace records, returning how many were written
    async fn upsert(&self, records: Vec<VectorRecord>) -> QuestionResult<u32>;

    async fn query(&self, query: QueryRequest) -> QuestionResult<Vec<VectorMatch>>;

    /// Remove records by id. Unknown ids are not an error.
    async fn delete(&self, ids: Vec<String>) -> QuestionResult<()>;
}

/// In-memory implementation of VectorStore (for development/testing).
///
/// Scores are cosine similarity computed by brute force.
#[derive(Debug, Default, Clone)]
pub struct InMemoryVectorStore {
    indexes: Arc<RwLock<HashMap<String, IndexDescription>>>,
    records: Arc<RwLock<HashMap<String, VectorRecord>>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn get(&self, id: &str) -> Option<VectorRecord> {
        self.records.read().await.get(id).cloned()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

fn metadata_map(record: &VectorRecord) -> QuestionResult<Map<String, Value>> {
    match serde_json::to_value(&record.metadata)? {
        Value::Object(map) => Ok(map),
        _ => Err(QuestionError::Internal(
            "metadata did not serialize to an object".to_string(),
        )),
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn list_indexes(&self) -> QuestionResult<Vec<String>> {
        let indexes = self.indexes.read().await;
        Ok(indexes.keys().cloned().collect())
    }

    async fn create_index(&self, input: CreateIndex) -> QuestionResult<()> {
        let mut indexes = self.indexes.write().await;
        indexes
            .entry(input.name.clone())
            .or_insert_with(|| IndexDescription {
                name: input.name,
                dimension: input.dimension,
                metric: input.metric,
                host: None,
                ready: true,
                state: Some("Ready".to_string()),
            });
        Ok(())
    }

    async fn describe_index(&self, name: &str) -> QuestionResult<IndexDescription> {
        let indexes = self.indexes.read().await;
        indexes
            .get(name)
            .cloned()
            .ok_or_else(|| QuestionError::VectorStore(format!("index '{}' not found", name)))
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> QuestionResult<u32> {
        let mut stored = self.records.write().await;
        let count = records.len() as u32;
        for record in records {
            stored.insert(record.id.clone(), record);
        }
        Ok(count)
    }

    async fn query(&self, query: QueryRequest) -> QuestionResult<Vec<VectorMatch>> {
        let top_k = usize::try_from(query.top_k).unwrap_or(0);
        let stored = self.records.read().await;

        let mut matches = stored
            .values()
            .map(|record| -> QuestionResult<VectorMatch> {
                let metadata = if query.include_metadata {
                    Some(metadata_map(record)?)
                } else {
                    None
                };
                Ok(VectorMatch {
                    id: record.id.clone(),
                    score: cosine_similarity(&query.vector, &record.values),
                    metadata,
                })
            })
            .collect::<QuestionResult<Vec<_>>>()?;

        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn delete(&self, ids: Vec<String>) -> QuestionResult<()> {
        let mut stored = self.records.write().await;
        for id in ids {
            stored.remove(&id);
        }
        Ok(())
    }
}
