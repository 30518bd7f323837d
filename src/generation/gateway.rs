use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation authentication failed: {0}")]
    Authentication(String),

    #[error("generation rate limited: {0}")]
    RateLimited(String),

    #[error("generation transient failure: {0}")]
    Transient(String),

    #[error("invalid generation response: {0}")]
    InvalidResponse(String),
}

impl GenerationError {
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }
}

/// Configures a client for a hosted generative model.
pub trait GenerationBackend: Send + Sync {
    /// return the backend name (e.g. "gemini")
    fn name(&self) -> &str;

    /// model identifier requests are sent to
    fn model(&self) -> &str;

    /// bind a credential, yielding a ready-to-call gateway
    fn configure(&self, credential: &str) -> Result<Arc<dyn GenerationGateway>, GenerationError>;
}

/// Single-shot text generation.
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}
