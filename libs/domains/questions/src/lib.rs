//! Questions Domain Library
//!
//! Stores natural-language questions next to the SQL that answers them and
//! finds previously stored questions by semantic similarity.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ QuestionService  │  ← validation, ids, metadata, embedding width check
//! └────────┬─────────┘
//!          │
//! ┌────────▼────────┐     ┌───────────────────┐
//! │   VectorStore   │     │ EmbeddingProvider │
//! │     (trait)     │     │      (trait)      │
//! └────────┬────────┘     └─────────┬─────────┘
//!          │                        │
//! ┌────────▼────────────┐  ┌────────▼────────┐
//! │ PineconeStore       │  │ OpenAIProvider  │
//! │ InMemoryVectorStore │  └─────────────────┘
//! └─────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use core_config::FromEnv;
//! use domain_questions::{
//!     OpenAIConfig, OpenAIProvider, PineconeConfig, PineconeStore, ProvisionConfig,
//!     QuestionService, ensure_index, handlers,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pinecone = PineconeConfig::from_env()?;
//! let provision = ProvisionConfig::new(pinecone.index_name.clone(), 3072, pinecone.serverless.clone());
//! let store = PineconeStore::new(pinecone)?;
//! ensure_index(&store, &provision).await?;
//!
//! let embedder = Arc::new(OpenAIProvider::new(OpenAIConfig::from_env()?)?);
//! let service = QuestionService::new(store, embedder, provision.index_name);
//! let app = handlers::router(Arc::new(service));
//! # Ok(())
//! # }
//! ```

pub mod embedding;
pub mod error;
pub mod handlers;
pub mod models;
pub mod pinecone;
pub mod provisioning;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use embedding::{EmbeddingProvider, OpenAIConfig, OpenAIProvider};
pub use error::{QuestionError, QuestionResult};
pub use handlers::ApiDoc;
pub use models::{
    DEFAULT_TOP_K, DistanceMetric, EmbeddingModel, EmbeddingResult, IndexDescription,
    QueryRequest, QuestionMetadata, SearchHit, SearchParams, SearchResponse, ServerlessSpec,
    UploadQuestion, UploadResponse, VectorMatch, VectorRecord,
};
pub use pinecone::{PineconeConfig, PineconeStore};
pub use provisioning::{ProvisionConfig, ProvisionOutcome, ensure_index};
pub use repository::{InMemoryVectorStore, VectorStore};
pub use service::QuestionService;
