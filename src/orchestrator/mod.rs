//! Answer Orchestrator.
//!
//! Routes a question through retrieval-augmented generation, direct
//! generation, a plain document digest, and finally a static message,
//! stopping at the first stage that produces an answer.

mod fallback;
mod prompt;
mod rate_limiter;
mod relevance;
mod service;
mod types;


pub use fallback::{Stage, TerminalReason};
pub use rate_limiter::RateLimiter;
pub use relevance::RelevancePolicy;
pub use service::{InitError, Orchestrator, OrchestratorSettings};
pub use types::{AnswerResult, AnswerStrategy};
