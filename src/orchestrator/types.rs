use serde::{Deserialize, Serialize};

use crate::retrieval::RetrievedDocument;

/// Which stage of the fallback chain produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStrategy {
    Rag,
    Direct,
    Digest,
    NoDocuments,
    Unavailable,
    InitializationFailed,
}

impl AnswerStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerStrategy::Rag => "rag",
            AnswerStrategy::Direct => "direct",
            AnswerStrategy::Digest => "digest",
            AnswerStrategy::NoDocuments => "no_documents",
            AnswerStrategy::Unavailable => "unavailable",
            AnswerStrategy::InitializationFailed => "initialization_failed",
        }
    }
}

/// The only artifact handed back to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    /// Markdown answer, including citation footer or disclaimer.
    pub answer: String,
    /// Documents the answer was grounded on; empty unless RAG or digest.
    pub source_documents: Vec<RetrievedDocument>,
    pub strategy: AnswerStrategy,
}

impl AnswerResult {
    pub fn new(
        answer: String,
        source_documents: Vec<RetrievedDocument>,
        strategy: AnswerStrategy,
    ) -> Self {
        Self {
            answer,
            source_documents,
            strategy,
        }
    }

    pub fn without_sources(answer: String, strategy: AnswerStrategy) -> Self {
        Self::new(answer, Vec::new(), strategy)
    }
}
