use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "initialized": state.orchestrator.is_initialized(),
    }))
}

/// Probes the index on every call so the UI can show connectivity.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<Value> {
    let orchestrator = &state.orchestrator;
    let catalog = orchestrator.catalog();

    let (index_exists, index_error) = match catalog.exists().await {
        Ok(exists) => (Some(exists), None),
        Err(e) => {
            tracing::warn!("Index probe failed: {}", e);
            (None, Some(e.to_string()))
        }
    };

    let index = if index_exists == Some(true) {
        match catalog.describe().await {
            Ok(description) => json!(description),
            Err(e) => {
                tracing::warn!("Index describe failed: {}", e);
                Value::Null
            }
        }
    } else {
        Value::Null
    };

    Json(json!({
        "initialized": orchestrator.is_initialized(),
        "index_name": orchestrator.index_name(),
        "index_exists": index_exists,
        "index_error": index_error,
        "index": index,
        "model": orchestrator.model(),
        "last_generation_at": orchestrator.last_generation_at().map(|t| t.to_rfc3339()),
        "started_at": state.started_at.to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::handlers::test_support::offline_state;

    #[tokio::test]
    async fn health_reports_uninitialized_state() {
        let dir = tempfile::tempdir().unwrap();
        let Json(body) = health(State(offline_state(&dir))).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["initialized"], false);
    }

    #[tokio::test]
    async fn status_surfaces_probe_errors() {
        let dir = tempfile::tempdir().unwrap();
        let Json(body) = get_status(State(offline_state(&dir))).await;

        assert_eq!(body["index_name"], "indian-constitution-ipc");
        assert_eq!(body["model"], "gemini-2.0-flash");
        assert!(body["index_exists"].is_null());
        assert!(body["index_error"]
            .as_str()
            .unwrap()
            .contains("PINECONE_API_KEY"));
        assert!(body["last_generation_at"].is_null());
    }
}
