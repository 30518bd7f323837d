//! Retrieval Gateway: the orchestrator's view of the managed vector index.
//!
//! This module provides:
//! - `IndexCatalog`: existence checks and handles for the backing index
//! - `RetrievalGateway`: top-k similarity search over an opened index
//! - `PineconeCatalog` / `PineconeIndex`: the hosted implementation
//! - `HuggingFaceEmbedder`: hosted query embeddings for the index

mod embedding;
mod gateway;
mod pinecone;
mod types;

pub use embedding::{Embedder, HuggingFaceEmbedder};
pub use gateway::{IndexCatalog, IndexDescription, RetrievalError, RetrievalGateway};
pub use pinecone::{PineconeCatalog, PineconeIndex};
pub use types::RetrievedDocument;
