//! Retrieval contracts consumed by the orchestrator.
//!
//! Infrastructure failures are always surfaced as `RetrievalError`; an empty
//! `Vec` means the index genuinely had no match.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use super::types::RetrievedDocument;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("retrieval not configured: {0}")]
    Configuration(String),

    #[error("retrieval service rejected credentials")]
    Unauthorized,

    #[error("index not found: {0}")]
    IndexNotFound(String),

    #[error("retrieval transport error: {0}")]
    Transport(String),

    #[error("retrieval service returned {status}: {message}")]
    Service { status: u16, message: String },

    #[error("query embedding failed: {0}")]
    Embedding(String),

    #[error("invalid retrieval response: {0}")]
    InvalidResponse(String),
}

impl RetrievalError {
    pub fn transport<E: std::fmt::Display>(err: E) -> Self {
        RetrievalError::Transport(err.to_string())
    }

    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RetrievalError::Transport(_) | RetrievalError::Embedding(_) => true,
            RetrievalError::Service { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Summary of the backing index, for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct IndexDescription {
    pub name: String,
    pub dimension: Option<u32>,
    pub ready: bool,
}

/// Catalog of the managed vector index.
#[async_trait]
pub trait IndexCatalog: Send + Sync {
    /// Name of the index this catalog manages.
    fn index_name(&self) -> &str;

    /// Whether the backing index exists.
    async fn exists(&self) -> Result<bool, RetrievalError>;

    /// Describe the backing index.
    async fn describe(&self) -> Result<IndexDescription, RetrievalError>;

    /// Obtain a search handle bound to the backing index.
    async fn open(&self) -> Result<Arc<dyn RetrievalGateway>, RetrievalError>;
}

/// Similarity search over an opened index.
#[async_trait]
pub trait RetrievalGateway: Send + Sync {
    /// Return up to `k` documents ordered by decreasing similarity.
    async fn search(&self, query: &str, k: usize)
        -> Result<Vec<RetrievedDocument>, RetrievalError>;
}
