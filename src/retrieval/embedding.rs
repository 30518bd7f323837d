use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::gateway::RetrievalError;
use crate::core::config::EmbeddingConfig;

/// Turns query text into the vector space of the index.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError>;
}

/// Hosted sentence-transformers feature extraction.
#[derive(Clone)]
pub struct HuggingFaceEmbedder {
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

impl HuggingFaceEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, RetrievalError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| RetrievalError::Configuration(e.to_string()))?;

        Ok(Self {
            endpoint: format!(
                "{}/{}",
                config.base_url.trim_end_matches('/'),
                config.model.trim_matches('/')
            ),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            client,
        })
    }
}

#[async_trait]
impl Embedder for HuggingFaceEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let body = json!({
            "inputs": text,
            "options": { "wait_for_model": true },
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let res = request
            .send()
            .await
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;

        let status = res.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(RetrievalError::Unauthorized);
        }
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(RetrievalError::Embedding(format!("{}: {}", status, text)));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| RetrievalError::InvalidResponse(e.to_string()))?;
        parse_embedding(&payload)
    }
}

/// Accepts a flat vector, or a single-row matrix as some deployments return.
fn parse_embedding(payload: &Value) -> Result<Vec<f32>, RetrievalError> {
    let row = match payload.as_array() {
        Some(items) if items.first().map(|v| v.is_array()).unwrap_or(false) => {
            items[0].as_array()
        }
        Some(_) => payload.as_array(),
        None => None,
    }
    .ok_or_else(|| RetrievalError::InvalidResponse("embedding is not an array".to_string()))?;

    let vector: Vec<f32> = row
        .iter()
        .filter_map(|v| v.as_f64().map(|f| f as f32))
        .collect();

    if vector.is_empty() || vector.len() != row.len() {
        return Err(RetrievalError::InvalidResponse(
            "embedding contains non-numeric values".to_string(),
        ));
    }
    Ok(vector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flat_and_nested_vectors() {
        assert_eq!(
            parse_embedding(&json!([0.5, -1.0, 2.0])).unwrap(),
            vec![0.5, -1.0, 2.0]
        );
        assert_eq!(
            parse_embedding(&json!([[0.25, 0.75]])).unwrap(),
            vec![0.25, 0.75]
        );
    }

    #[test]
    fn rejects_malformed_payloads() {
        assert!(parse_embedding(&json!({ "error": "loading" })).is_err());
        assert!(parse_embedding(&json!([])).is_err());
        assert!(parse_embedding(&json!([0.1, "x"])).is_err());
    }

    #[test]
    fn endpoint_joins_base_and_model() {
        let embedder = HuggingFaceEmbedder::new(&EmbeddingConfig {
            base_url: "https://example.test/pipeline/feature-extraction/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            embedder.endpoint,
            "https://example.test/pipeline/feature-extraction/sentence-transformers/all-MiniLM-L6-v2"
        );
        assert!(embedder.api_key.is_none());
    }
}
