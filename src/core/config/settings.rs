//! Typed view over the merged YAML configuration.
//!
//! Every section is optional in the file; missing keys fall back to the
//! defaults below.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::ApiError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_value(value: Value) -> Result<Self, ApiError> {
        serde_json::from_value(value)
            .map_err(|e| ApiError::BadRequest(format!("invalid configuration: {}", e)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub api_key: Option<String>,
    pub index_name: String,
    pub control_plane_url: String,
    pub api_version: String,
    pub namespace: String,
    /// Documents requested for the RAG path.
    pub top_k: usize,
    /// Documents requested by the digest fallback.
    pub fallback_top_k: usize,
    /// Characters of each document kept in the prompt context.
    pub context_char_budget: usize,
    /// `None` treats every retrieved document as relevant.
    pub min_relevance_score: Option<f32>,
    pub max_retries: usize,
    pub retry_backoff_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            index_name: "indian-constitution-ipc".to_string(),
            control_plane_url: "https://api.pinecone.io".to_string(),
            api_version: "2024-07".to_string(),
            namespace: String::new(),
            top_k: 6,
            fallback_top_k: 3,
            context_char_budget: 400,
            min_relevance_score: None,
            max_retries: 1,
            retry_backoff_ms: 250,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub request_timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api-inference.huggingface.co/pipeline/feature-extraction"
                .to_string(),
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub min_call_interval_ms: u64,
    pub request_timeout_secs: u64,
    pub smoke_test_prompt: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash".to_string(),
            min_call_interval_ms: 1000,
            request_timeout_secs: 60,
            smoke_test_prompt: "Say hello".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub port_attempts: u16,
    pub init_timeout_secs: u64,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            port_attempts: 10,
            init_timeout_secs: 60,
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_config_uses_defaults() {
        let config = AppConfig::from_value(json!({})).unwrap();
        assert_eq!(config.retrieval.index_name, "indian-constitution-ipc");
        assert_eq!(config.retrieval.top_k, 6);
        assert_eq!(config.retrieval.fallback_top_k, 3);
        assert_eq!(config.retrieval.context_char_budget, 400);
        assert!(config.retrieval.min_relevance_score.is_none());
        assert_eq!(config.generation.model, "gemini-2.0-flash");
        assert_eq!(config.generation.min_call_interval_ms, 1000);
        assert_eq!(config.server.init_timeout_secs, 60);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = AppConfig::from_value(json!({
            "retrieval": { "top_k": 4, "min_relevance_score": 0.5 },
            "generation": { "api_key": "g" }
        }))
        .unwrap();

        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.retrieval.min_relevance_score, Some(0.5));
        assert_eq!(config.retrieval.fallback_top_k, 3);
        assert_eq!(config.generation.api_key.as_deref(), Some("g"));
        assert_eq!(config.generation.model, "gemini-2.0-flash");
    }

    #[test]
    fn wrong_types_are_rejected() {
        let err = AppConfig::from_value(json!({ "retrieval": { "top_k": "six" } })).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
