use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::orchestrator::AnswerResult;
use crate::state::AppState;

const SAMPLE_QUESTIONS: [&str; 5] = [
    "What is Article 14 of the Indian Constitution?",
    "Explain the fundamental rights in Indian Constitution",
    "What is Section 302 of IPC?",
    "What are the provisions for right to equality?",
    "Explain the punishment for theft under IPC",
];

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

/// Always answers with 200; failures are reported inside the answer.
pub async fn query(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<QueryRequest>,
) -> Json<AnswerResult> {
    Json(state.orchestrator.query(&payload.question).await)
}

pub async fn samples() -> Json<Value> {
    Json(json!({ "questions": SAMPLE_QUESTIONS }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::AnswerStrategy;
    use crate::server::handlers::test_support::offline_state;

    #[tokio::test]
    async fn query_without_credentials_reports_initialization_failure() {
        let dir = tempfile::tempdir().unwrap();
        let state = offline_state(&dir);

        let Json(result) = query(
            State(state.clone()),
            Json(QueryRequest {
                question: "What is Article 14?".to_string(),
            }),
        )
        .await;

        assert_eq!(result.strategy, AnswerStrategy::InitializationFailed);
        assert!(result.answer.contains("Initialization Failed"));
        assert!(result.source_documents.is_empty());
        assert!(!state.orchestrator.is_initialized());
    }

    #[tokio::test]
    async fn samples_lists_questions() {
        let Json(body) = samples().await;
        let questions = body["questions"].as_array().unwrap();
        assert_eq!(questions.len(), 5);
        assert_eq!(questions[2], "What is Section 302 of IPC?");
    }
}
