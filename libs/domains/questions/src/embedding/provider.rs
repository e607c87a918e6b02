use async_trait::async_trait;

use crate::error::QuestionResult;
use crate::models::{EmbeddingModel, EmbeddingResult};

/// Trait for embedding generation providers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short provider name used in logs
    fn provider_name(&self) -> &'static str;

    /// Generate the embedding for a single text
    async fn embed(&self, model: EmbeddingModel, text: &str) -> QuestionResult<EmbeddingResult>;
}
