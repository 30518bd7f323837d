use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use super::gateway::{GenerationBackend, GenerationError, GenerationGateway};
use crate::core::config::GenerationConfig;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GeminiBackend {
    base_url: String,
    model: String,
    timeout: Duration,
}

impl GeminiBackend {
    pub fn new(config: &GenerationConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

impl GenerationBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn configure(&self, credential: &str) -> Result<Arc<dyn GenerationGateway>, GenerationError> {
        let api_key = credential.trim();
        if api_key.is_empty() {
            return Err(GenerationError::Authentication(
                "empty API key".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| GenerationError::Transient(e.to_string()))?;

        Ok(Arc::new(GeminiGateway {
            endpoint: format!(
                "{}/models/{}:generateContent",
                self.base_url,
                urlencoding::encode(&self.model)
            ),
            api_key: api_key.to_string(),
            client,
        }))
    }
}

pub struct GeminiGateway {
    endpoint: String,
    api_key: String,
    client: Client,
}

#[async_trait]
impl GenerationGateway for GeminiGateway {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }]
        });

        let res = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Transient(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(classify_failure(status, &text));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;
        extract_text(&payload)
    }
}

fn classify_failure(status: StatusCode, body: &str) -> GenerationError {
    let message = format!("{}: {}", status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GenerationError::Authentication(message)
        }
        // Invalid keys come back as 400 with a reason code.
        StatusCode::BAD_REQUEST if body.contains("API_KEY_INVALID") => {
            GenerationError::Authentication(message)
        }
        StatusCode::TOO_MANY_REQUESTS => GenerationError::RateLimited(message),
        s if s.is_server_error() || s == StatusCode::REQUEST_TIMEOUT => {
            GenerationError::Transient(message)
        }
        _ => GenerationError::InvalidResponse(message),
    }
}

fn extract_text(payload: &Value) -> Result<String, GenerationError> {
    if let Some(reason) = payload
        .get("promptFeedback")
        .and_then(|f| f.get("blockReason"))
        .and_then(|r| r.as_str())
    {
        return Err(GenerationError::InvalidResponse(format!(
            "prompt blocked: {}",
            reason
        )));
    }

    let text: String = payload["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        let finish = payload["candidates"][0]["finishReason"]
            .as_str()
            .unwrap_or("none");
        return Err(GenerationError::InvalidResponse(format!(
            "empty candidate (finishReason: {})",
            finish
        )));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_text_joins_parts() {
        let payload = json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Article 14 " }, { "text": "guarantees equality." }] },
                "finishReason": "STOP"
            }]
        });
        assert_eq!(
            extract_text(&payload).unwrap(),
            "Article 14 guarantees equality."
        );
    }

    #[test]
    fn blocked_or_empty_candidates_are_invalid() {
        let blocked = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert!(matches!(
            extract_text(&blocked),
            Err(GenerationError::InvalidResponse(_))
        ));

        let empty = json!({ "candidates": [{ "content": { "parts": [] }, "finishReason": "MAX_TOKENS" }] });
        let err = extract_text(&empty).unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"));
    }

    #[test]
    fn failures_distinguish_authentication_from_transient() {
        assert!(classify_failure(StatusCode::FORBIDDEN, "").is_authentication());
        assert!(classify_failure(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"details":[{"reason":"API_KEY_INVALID"}]}}"#
        )
        .is_authentication());
        assert!(matches!(
            classify_failure(StatusCode::TOO_MANY_REQUESTS, "quota"),
            GenerationError::RateLimited(_)
        ));
        assert!(matches!(
            classify_failure(StatusCode::BAD_GATEWAY, ""),
            GenerationError::Transient(_)
        ));
        assert!(matches!(
            classify_failure(StatusCode::BAD_REQUEST, "bad"),
            GenerationError::InvalidResponse(_)
        ));
    }

    #[test]
    fn configure_rejects_blank_credentials() {
        let backend = GeminiBackend::new(&GenerationConfig::default());
        assert!(matches!(
            backend.configure("  "),
            Err(GenerationError::Authentication(_))
        ));
        assert!(backend.configure("key").is_ok());
        assert_eq!(backend.model(), "gemini-2.0-flash");
        assert_eq!(backend.name(), "gemini");
    }
}
