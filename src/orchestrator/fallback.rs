//! Stages of the answer chain and the transitions between them.
//!
//! Transitions are pure functions of the previous outcome; the service only
//! performs the side effects each stage asks for.

use super::prompt;
use super::relevance::RelevancePolicy;
use super::types::{AnswerResult, AnswerStrategy};
use crate::retrieval::{RetrievalError, RetrievedDocument};

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Search the index with the primary `k`.
    Retrieve,
    /// Generate an answer grounded on the given documents.
    Rag(Vec<RetrievedDocument>),
    /// Generate from general knowledge only.
    Direct,
    /// Re-query with the fallback `k` and summarize the matches.
    Digest,
    /// Static message; always succeeds.
    Terminal(TerminalReason),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Retrieve => "retrieve",
            Stage::Rag(_) => "rag",
            Stage::Direct => "direct",
            Stage::Digest => "digest",
            Stage::Terminal(TerminalReason::NoDocuments) => "terminal:no_documents",
            Stage::Terminal(TerminalReason::Unavailable) => "terminal:unavailable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalReason {
    NoDocuments,
    Unavailable,
}

impl TerminalReason {
    pub fn answer(&self, question: &str) -> AnswerResult {
        match self {
            TerminalReason::NoDocuments => AnswerResult::without_sources(
                prompt::no_documents_answer(question),
                AnswerStrategy::NoDocuments,
            ),
            TerminalReason::Unavailable => AnswerResult::without_sources(
                prompt::UNAVAILABLE.to_string(),
                AnswerStrategy::Unavailable,
            ),
        }
    }
}

/// Primary retrieval: relevant matches ground the answer, none means
/// general knowledge, a failure skips generation entirely.
pub fn after_retrieval(
    outcome: Result<Vec<RetrievedDocument>, RetrievalError>,
    relevance: &RelevancePolicy,
) -> Stage {
    match outcome {
        Ok(docs) => {
            let docs = relevance.select(docs);
            if docs.is_empty() {
                Stage::Direct
            } else {
                Stage::Rag(docs)
            }
        }
        Err(_) => Stage::Digest,
    }
}

/// Where to go when the generation call of `stage` fails.
pub fn after_generation_failure(stage: &Stage) -> Stage {
    match stage {
        Stage::Rag(_) => Stage::Direct,
        _ => Stage::Digest,
    }
}

/// Digest retrieval: `Ok(docs)` for a non-empty set, else the terminal reason.
pub fn after_digest_retrieval(
    outcome: Result<Vec<RetrievedDocument>, RetrievalError>,
) -> Result<Vec<RetrievedDocument>, TerminalReason> {
    match outcome {
        Ok(docs) if docs.is_empty() => Err(TerminalReason::NoDocuments),
        Ok(docs) => Ok(docs),
        Err(_) => Err(TerminalReason::Unavailable),
    }
}
