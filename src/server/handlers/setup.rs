use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// Runs orchestrator initialization as a task bounded by the configured timeout.
///
/// A timed-out task is aborted; the orchestrator stays uninitialized and a later
/// request or query tries again.
pub async fn initialize(State(state): State<Arc<AppState>>) -> Json<Value> {
    let timeout = Duration::from_secs(state.settings.server.init_timeout_secs);
    let orchestrator = state.orchestrator.clone();
    let mut task = tokio::spawn(async move { orchestrator.initialize().await });

    let (initialized, timed_out) = match tokio::time::timeout(timeout, &mut task).await {
        Ok(Ok(initialized)) => (initialized, false),
        Ok(Err(e)) => {
            tracing::error!("Initialization task failed: {}", e);
            (false, false)
        }
        Err(_) => {
            task.abort();
            tracing::warn!("Initialization timed out after {:?}", timeout);
            (false, true)
        }
    };

    Json(json!({
        "initialized": initialized,
        "timed_out": timed_out,
    }))
}
