//! Retrieval sources feeding the assembler.
//!
//! Both sources hand back an already-ranked sequence; the assembler never
//! reorders or rescores what they return.

pub mod embeddings;
pub mod jaccard;

use async_trait::async_trait;
use thiserror::Error;

use crate::snippet::ReferenceSnippet;
use crate::types::AssemblyRequest;

pub use embeddings::{CachedEmbeddingsSource, EmbeddingsBackend, EmbeddingsQuery};
pub use jaccard::JaccardWindowSource;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("No async runtime available to refresh the embeddings cache")]
    NoRuntime,
}

/// Semantic-similarity matches for the request.
///
/// Only invoked when `embeddings_enabled` is set. Implementations should answer
/// from whatever they already have and refresh out of band.
#[async_trait]
pub trait EmbeddingsSource: Send + Sync {
    async fn fetch_embeddings_matches(
        &self,
        request: &AssemblyRequest,
    ) -> Result<Vec<ReferenceSnippet>, RetrievalError>;
}

/// Local-editor heuristic matches for the request. Always invoked.
#[async_trait]
pub trait LocalSource: Send + Sync {
    async fn fetch_local_matches(
        &self,
        request: &AssemblyRequest,
    ) -> Result<Vec<ReferenceSnippet>, RetrievalError>;
}

/// Embeddings source for deployments without an embeddings backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledEmbeddings;

#[async_trait]
impl EmbeddingsSource for DisabledEmbeddings {
    async fn fetch_embeddings_matches(
        &self,
        _request: &AssemblyRequest,
    ) -> Result<Vec<ReferenceSnippet>, RetrievalError> {
        Ok(Vec::new())
    }
}
