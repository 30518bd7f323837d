use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A passage returned by similarity search. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    /// Passage text as stored in the index.
    pub content: String,
    /// Page of the source PDF the passage came from, when recorded.
    pub page: Option<u32>,
    /// Similarity score reported by the index (higher = more similar).
    pub score: f32,
    /// Source file recorded at ingestion time.
    pub source: Option<String>,
}

impl RetrievedDocument {
    pub fn new(content: impl Into<String>, page: Option<u32>, score: f32) -> Self {
        Self {
            content: content.into(),
            page,
            score,
            source: None,
        }
    }

    /// Page label used in prompts and citations.
    pub fn page_label(&self) -> String {
        match self.page {
            Some(page) => page.to_string(),
            None => "N/A".to_string(),
        }
    }

    /// Builds a document from index match metadata.
    ///
    /// Ingestion stores the passage under `text` and the page as a number
    /// (often a float such as `3.0`) or a numeric string.
    pub fn from_metadata(metadata: Option<&Value>, score: f32) -> Self {
        let content = metadata
            .and_then(|m| m.get("text"))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let page = metadata.and_then(|m| m.get("page")).and_then(parse_page);
        let source = metadata
            .and_then(|m| m.get("source"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        Self {
            content,
            page,
            score,
            source,
        }
    }
}

fn parse_page(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .and_then(|p| u32::try_from(p).ok()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f as u32),
        _ => None,
    }
}
