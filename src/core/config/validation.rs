use serde_json::{Map, Value};
use crate::core::errors::ApiError;

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(retrieval) = expect_optional_object(root, "retrieval")? {
        validate_non_empty_string_field(retrieval, "retrieval.index_name", "index_name")?;
        validate_optional_string_field(retrieval, "retrieval.api_key", "api_key")?;
        validate_optional_string_field(retrieval, "retrieval.namespace", "namespace")?;
        validate_u64_field(retrieval, "retrieval.top_k", "top_k", 1, 100)?;
        validate_u64_field(
            retrieval,
            "retrieval.fallback_top_k",
            "fallback_top_k",
            1,
            100,
        )?;
        validate_u64_field(
            retrieval,
            "retrieval.context_char_budget",
            "context_char_budget",
            1,
            100_000,
        )?;
        validate_u64_field(retrieval, "retrieval.max_retries", "max_retries", 0, 10)?;
        validate_u64_field(
            retrieval,
            "retrieval.retry_backoff_ms",
            "retry_backoff_ms",
            0,
            60_000,
        )?;
        validate_u64_field(
            retrieval,
            "retrieval.request_timeout_secs",
            "request_timeout_secs",
            1,
            600,
        )?;
        validate_score_field(
            retrieval,
            "retrieval.min_relevance_score",
            "min_relevance_score",
        )?;
    }

    if let Some(embedding) = expect_optional_object(root, "embedding")? {
        validate_non_empty_string_field(embedding, "embedding.base_url", "base_url")?;
        validate_non_empty_string_field(embedding, "embedding.model", "model")?;
        validate_optional_string_field(embedding, "embedding.api_key", "api_key")?;
        validate_u64_field(
            embedding,
            "embedding.request_timeout_secs",
            "request_timeout_secs",
            1,
            600,
        )?;
    }

    if let Some(generation) = expect_optional_object(root, "generation")? {
        validate_non_empty_string_field(generation, "generation.model", "model")?;
        validate_non_empty_string_field(generation, "generation.base_url", "base_url")?;
        validate_optional_string_field(generation, "generation.api_key", "api_key")?;
        validate_u64_field(
            generation,
            "generation.min_call_interval_ms",
            "min_call_interval_ms",
            0,
            600_000,
        )?;
        validate_u64_field(
            generation,
            "generation.request_timeout_secs",
            "request_timeout_secs",
            1,
            3_600,
        )?;
        validate_non_empty_string_field(
            generation,
            "generation.smoke_test_prompt",
            "smoke_test_prompt",
        )?;
    }

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_non_empty_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 1, 65535)?;
        validate_u64_field(server, "server.port_attempts", "port_attempts", 1, 1_000)?;
        validate_u64_field(
            server,
            "server.init_timeout_secs",
            "init_timeout_secs",
            1,
            3_600,
        )?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

// Null means "accept every document".
fn validate_score_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() {
        return Ok(());
    }
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if !(-1.0..=1.0).contains(&number) {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between -1.0 and 1.0",
            path
        )));
    }
    Ok(())
}

fn validate_non_empty_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if text.trim().is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': value cannot be empty",
            path
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() || value.as_str().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "string"))
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::BadRequest(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(err: ApiError) -> String {
        match err {
            ApiError::BadRequest(msg) | ApiError::Internal(msg) => msg,
        }
    }

    #[test]
    fn accepts_empty_and_complete_configs() {
        assert!(validate_config(&json!({})).is_ok());
        assert!(validate_config(&json!({
            "retrieval": {
                "index_name": "indian-constitution-ipc",
                "top_k": 6,
                "fallback_top_k": 3,
                "min_relevance_score": null
            },
            "generation": { "model": "gemini-2.0-flash", "min_call_interval_ms": 1000 },
            "server": { "port": 8501, "cors_allowed_origins": ["http://localhost:3000"] }
        }))
        .is_ok());
    }

    #[test]
    fn rejects_non_object_root_and_sections() {
        assert!(validate_config(&json!([])).is_err());
        let err = validate_config(&json!({ "retrieval": 5 })).unwrap_err();
        assert!(message(err).contains("'retrieval'"));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let err = validate_config(&json!({ "retrieval": { "top_k": 0 } })).unwrap_err();
        assert!(message(err).contains("retrieval.top_k"));

        let err = validate_config(&json!({ "server": { "port": 70000 } })).unwrap_err();
        assert!(message(err).contains("server.port"));

        let err =
            validate_config(&json!({ "retrieval": { "min_relevance_score": 1.5 } })).unwrap_err();
        assert!(message(err).contains("min_relevance_score"));
    }

    #[test]
    fn rejects_blank_model_and_origins() {
        assert!(validate_config(&json!({ "generation": { "model": " " } })).is_err());
        assert!(
            validate_config(&json!({ "server": { "cors_allowed_origins": [""] } })).is_err()
        );
    }
}
