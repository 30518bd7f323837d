use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use crate::state::AppState;

/// Effective configuration with defaults applied and credentials redacted.
pub async fn get_config(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let effective = serde_json::to_value(state.settings.as_ref()).map_err(ApiError::internal)?;
    Ok(Json(json!({
        "path": state.config.config_path().display().to_string(),
        "config": state.config.redact_sensitive_values(&effective),
    })))
}
