use std::num::IntErrorKind;
use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::embedding::EmbeddingProvider;
use crate::error::{
    QuestionError, QuestionResult, SEARCH_K_NOT_INTEGER, SEARCH_QUESTION_REQUIRED,
    UPLOAD_FIELDS_REQUIRED,
};
use crate::models::{
    DEFAULT_TOP_K, EmbeddingModel, QueryRequest, QuestionMetadata, SearchHit, SearchParams,
    UploadQuestion, VectorRecord,
};
use crate::repository::VectorStore;

/// Question service: embeds text and keeps question/SQL pairs in the index.
pub struct QuestionService<S: VectorStore> {
    store: S,
    embedder: Arc<dyn EmbeddingProvider>,
    model: EmbeddingModel,
    index_name: String,
}

/// Treats blank strings the same as absent ones.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Parse `k` the way a query string integer is read: surrounding whitespace
/// is ignored and a leading sign is allowed. Integers beyond `i64` saturate
/// and are left for the vector store to reject.
fn parse_top_k(raw: Option<&str>) -> QuestionResult<i64> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_TOP_K);
    };

    match raw.trim().parse::<i64>() {
        Ok(k) => Ok(k),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Ok(i64::MAX),
            IntErrorKind::NegOverflow => Ok(i64::MIN),
            _ => Err(QuestionError::InvalidParameter(SEARCH_K_NOT_INTEGER)),
        },
    }
}

impl<S: VectorStore> QuestionService<S> {
    pub fn new(store: S, embedder: Arc<dyn EmbeddingProvider>, index_name: String) -> Self {
        Self {
            store,
            embedder,
            model: EmbeddingModel::default(),
            index_name,
        }
    }

    pub fn with_model(mut self, model: EmbeddingModel) -> Self {
        self.model = model;
        self
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Embed `text`, checking the vector width against the index.
    async fn embed(&self, text: &str) -> QuestionResult<Vec<f32>> {
        let result = self.embedder.embed(self.model, text).await?;

        let actual = result.values.len() as u32;
        let expected = self.model.dimension();
        if actual != expected {
            return Err(QuestionError::DimensionMismatch { expected, actual });
        }

        debug!(
            provider = self.embedder.provider_name(),
            tokens = result.tokens_used,
            "Generated embedding"
        );
        Ok(result.values)
    }

    /// Store a question and its SQL, keyed by the embedding of the question.
    ///
    /// Returns the new record id.
    #[instrument(skip(self, input))]
    pub async fn upload(&self, input: UploadQuestion) -> QuestionResult<String> {
        let (Some(question), Some(sql_query)) =
            (non_empty(input.question), non_empty(input.sql_query))
        else {
            return Err(QuestionError::MissingField(UPLOAD_FIELDS_REQUIRED));
        };

        let values = self.embed(&question).await?;
        let id = Uuid::now_v7().to_string();

        self.store
            .upsert(vec![VectorRecord {
                id: id.clone(),
                values,
                metadata: QuestionMetadata::now(question, sql_query),
            }])
            .await?;

        info!(question_id = %id, "Uploaded question");
        Ok(id)
    }

    /// Nearest stored questions to `params.question`, best first.
    #[instrument(skip(self, params), fields(k = ?params.k))]
    pub async fn search(&self, params: SearchParams) -> QuestionResult<Vec<SearchHit>> {
        let question = non_empty(params.question)
            .ok_or(QuestionError::MissingField(SEARCH_QUESTION_REQUIRED))?;
        let top_k = parse_top_k(params.k.as_deref())?;

        let vector = self.embed(&question).await?;
        let matches = self
            .store
            .query(QueryRequest {
                vector,
                top_k,
                include_metadata: true,
            })
            .await?;

        debug!(top_k, returned = matches.len(), "Search completed");
        Ok(matches.into_iter().map(SearchHit::from).collect())
    }

    /// Remove a question by id. Unknown ids succeed.
    #[instrument(skip(self))]
    pub async fn delete(&self, question_id: &str) -> QuestionResult<()> {
        self.store.delete(vec![question_id.to_string()]).await?;
        info!(question_id, "Deleted question");
        Ok(())
    }

    /// Ok when the backing index reports ready.
    pub async fn check_ready(&self) -> QuestionResult<()> {
        let description = self.store.describe_index(&self.index_name).await?;
        if description.ready {
            Ok(())
        } else {
            Err(QuestionError::IndexNotReady(self.index_name.clone()))
        }
    }
}
