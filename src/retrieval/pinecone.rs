//! Pinecone implementation of the retrieval contracts.
//!
//! The control plane (`api.pinecone.io`) answers catalog questions; searches
//! go to the per-index data-plane host returned by `describe`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};

use super::embedding::Embedder;
use super::gateway::{IndexCatalog, IndexDescription, RetrievalError, RetrievalGateway};
use super::types::RetrievedDocument;
use crate::core::config::RetrievalConfig;

const API_KEY_HEADER: &str = "Api-Key";
const API_VERSION_HEADER: &str = "X-Pinecone-API-Version";

#[derive(Clone)]
struct Credentials {
    api_key: Option<String>,
    api_version: String,
}

impl Credentials {
    fn apply(&self, request: RequestBuilder) -> Result<RequestBuilder, RetrievalError> {
        let key = self.api_key.as_deref().ok_or_else(|| {
            RetrievalError::Configuration("PINECONE_API_KEY is not set".to_string())
        })?;
        Ok(request
            .header(API_KEY_HEADER, key)
            .header(API_VERSION_HEADER, &self.api_version))
    }
}

/// Control-plane client for a single named index.
#[derive(Clone)]
pub struct PineconeCatalog {
    control_plane_url: String,
    index_name: String,
    namespace: String,
    credentials: Credentials,
    client: Client,
    embedder: Arc<dyn Embedder>,
}

impl PineconeCatalog {
    pub fn new(
        config: &RetrievalConfig,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, RetrievalError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| RetrievalError::Configuration(e.to_string()))?;

        Ok(Self {
            control_plane_url: config.control_plane_url.trim_end_matches('/').to_string(),
            index_name: config.index_name.clone(),
            namespace: config.namespace.clone(),
            credentials: Credentials {
                api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
                api_version: config.api_version.clone(),
            },
            client,
            embedder,
        })
    }

    async fn fetch_description(&self) -> Result<(IndexDescription, String), RetrievalError> {
        let url = format!(
            "{}/indexes/{}",
            self.control_plane_url,
            urlencoding::encode(&self.index_name)
        );
        let res = self
            .credentials
            .apply(self.client.get(&url))?
            .send()
            .await
            .map_err(RetrievalError::transport)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(status_error(status, text, &self.index_name));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| RetrievalError::InvalidResponse(e.to_string()))?;
        parse_description(&payload)
    }
}

#[async_trait]
impl IndexCatalog for PineconeCatalog {
    fn index_name(&self) -> &str {
        &self.index_name
    }

    async fn exists(&self) -> Result<bool, RetrievalError> {
        let url = format!("{}/indexes", self.control_plane_url);
        let res = self
            .credentials
            .apply(self.client.get(&url))?
            .send()
            .await
            .map_err(RetrievalError::transport)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(status_error(status, text, &self.index_name));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| RetrievalError::InvalidResponse(e.to_string()))?;
        Ok(index_names(&payload).iter().any(|n| n == &self.index_name))
    }

    async fn describe(&self) -> Result<IndexDescription, RetrievalError> {
        self.fetch_description().await.map(|(description, _)| description)
    }

    async fn open(&self) -> Result<Arc<dyn RetrievalGateway>, RetrievalError> {
        let (description, host) = self.fetch_description().await?;
        if !description.ready {
            tracing::warn!("Index {} is not reported ready yet", description.name);
        }

        let host_url = if host.starts_with("http://") || host.starts_with("https://") {
            host
        } else {
            format!("https://{}", host)
        };

        tracing::info!("Opened index {} at {}", description.name, host_url);
        Ok(Arc::new(PineconeIndex {
            host_url,
            namespace: self.namespace.clone(),
            credentials: self.credentials.clone(),
            client: self.client.clone(),
            embedder: self.embedder.clone(),
        }))
    }
}

/// Data-plane handle for an opened index.
pub struct PineconeIndex {
    host_url: String,
    namespace: String,
    credentials: Credentials,
    client: Client,
    embedder: Arc<dyn Embedder>,
}

#[async_trait]
impl RetrievalGateway for PineconeIndex {
    async fn search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        let vector = self.embedder.embed(query).await?;

        let body = json!({
            "vector": vector,
            "topK": k,
            "includeMetadata": true,
            "includeValues": false,
            "namespace": self.namespace,
        });

        let url = format!("{}/query", self.host_url.trim_end_matches('/'));
        let res = self
            .credentials
            .apply(self.client.post(&url))?
            .json(&body)
            .send()
            .await
            .map_err(RetrievalError::transport)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(status_error(status, text, &self.host_url));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| RetrievalError::InvalidResponse(e.to_string()))?;
        let mut documents = parse_matches(&payload)?;
        documents.truncate(k);
        tracing::debug!("Index returned {} matches (k={})", documents.len(), k);
        Ok(documents)
    }
}

fn status_error(status: StatusCode, body: String, target: &str) -> RetrievalError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RetrievalError::Unauthorized,
        StatusCode::NOT_FOUND => RetrievalError::IndexNotFound(target.to_string()),
        _ => RetrievalError::Service {
            status: status.as_u16(),
            message: body,
        },
    }
}

fn index_names(payload: &Value) -> Vec<String> {
    payload
        .get("indexes")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("name").and_then(|n| n.as_str()))
                .map(|n| n.to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn parse_description(payload: &Value) -> Result<(IndexDescription, String), RetrievalError> {
    let name = payload
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RetrievalError::InvalidResponse("index name missing".to_string()))?;
    let host = payload
        .get("host")
        .and_then(|v| v.as_str())
        .filter(|h| !h.is_empty())
        .ok_or_else(|| RetrievalError::InvalidResponse("index host missing".to_string()))?;

    let description = IndexDescription {
        name: name.to_string(),
        dimension: payload
            .get("dimension")
            .and_then(|v| v.as_u64())
            .and_then(|d| u32::try_from(d).ok()),
        ready: payload
            .get("status")
            .and_then(|s| s.get("ready"))
            .and_then(|r| r.as_bool())
            .unwrap_or(false),
    };
    Ok((description, host.to_string()))
}

fn parse_matches(payload: &Value) -> Result<Vec<RetrievedDocument>, RetrievalError> {
    let Some(matches) = payload.get("matches") else {
        return Err(RetrievalError::InvalidResponse(
            "query response has no matches field".to_string(),
        ));
    };
    let Some(items) = matches.as_array() else {
        return Err(RetrievalError::InvalidResponse(
            "matches is not an array".to_string(),
        ));
    };

    Ok(items
        .iter()
        .map(|item| {
            let score = item.get("score").and_then(|s| s.as_f64()).unwrap_or(0.0) as f32;
            RetrievedDocument::from_metadata(item.get("metadata"), score)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_names_lists_catalog_entries() {
        let payload = json!({
            "indexes": [
                { "name": "indian-constitution-ipc", "dimension": 384 },
                { "name": "scratch" }
            ]
        });
        assert_eq!(
            index_names(&payload),
            vec!["indian-constitution-ipc".to_string(), "scratch".to_string()]
        );
        assert!(index_names(&json!({})).is_empty());
    }

    #[test]
    fn description_requires_name_and_host() {
        let payload = json!({
            "name": "indian-constitution-ipc",
            "dimension": 384,
            "host": "indian-constitution-ipc-abc.svc.pinecone.io",
            "status": { "ready": true, "state": "Ready" }
        });
        let (description, host) = parse_description(&payload).unwrap();
        assert_eq!(description.name, "indian-constitution-ipc");
        assert_eq!(description.dimension, Some(384));
        assert!(description.ready);
        assert_eq!(host, "indian-constitution-ipc-abc.svc.pinecone.io");

        assert!(parse_description(&json!({ "name": "x" })).is_err());
    }

    #[test]
    fn matches_keep_order_and_metadata() {
        let payload = json!({
            "matches": [
                { "id": "a", "score": 0.91, "metadata": { "text": "Article 14", "page": 3.0 } },
                { "id": "b", "score": 0.75, "metadata": { "text": "Article 15", "page": 7.0 } }
            ],
            "namespace": ""
        });
        let docs = parse_matches(&payload).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].content, "Article 14");
        assert_eq!(docs[0].page, Some(3));
        assert_eq!(docs[1].page, Some(7));
        assert!(docs[0].score > docs[1].score);
    }

    #[test]
    fn empty_matches_is_not_an_error() {
        assert!(parse_matches(&json!({ "matches": [] })).unwrap().is_empty());
        assert!(parse_matches(&json!({ "error": "x" })).is_err());
    }

    #[test]
    fn status_errors_are_typed() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, String::new(), "i"),
            RetrievalError::Unauthorized
        ));
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, String::new(), "i"),
            RetrievalError::IndexNotFound(_)
        ));
        let err = status_error(StatusCode::SERVICE_UNAVAILABLE, "busy".into(), "i");
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn missing_api_key_is_a_configuration_error() {
        struct NoopEmbedder;

        #[async_trait]
        impl Embedder for NoopEmbedder {
            async fn embed(&self, _text: &str) -> Result<Vec<f32>, RetrievalError> {
                Ok(vec![0.0])
            }
        }

        let catalog =
            PineconeCatalog::new(&RetrievalConfig::default(), Arc::new(NoopEmbedder)).unwrap();
        let err = catalog.exists().await.unwrap_err();
        assert!(matches!(err, RetrievalError::Configuration(_)));
    }
}
