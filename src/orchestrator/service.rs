use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::Instrument;
use uuid::Uuid;

use super::fallback::{self, Stage};
use super::prompt;
use super::rate_limiter::RateLimiter;
use super::relevance::RelevancePolicy;
use super::types::{AnswerResult, AnswerStrategy};
use crate::core::config::AppConfig;
use crate::generation::{GenerationBackend, GenerationError, GenerationGateway};
use crate::retrieval::{IndexCatalog, RetrievalError, RetrievalGateway, RetrievedDocument};

/// Upper bound on stages visited by one query. The chain has five.
const MAX_STAGES: usize = 8;

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub top_k: usize,
    pub fallback_top_k: usize,
    pub context_char_budget: usize,
    pub relevance: RelevancePolicy,
    /// Extra attempts for transient retrieval failures.
    pub max_retries: usize,
    pub retry_backoff: Duration,
    pub min_call_interval: Duration,
    pub smoke_test_prompt: String,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            top_k: 6,
            fallback_top_k: 3,
            context_char_budget: 400,
            relevance: RelevancePolicy::accept_all(),
            max_retries: 1,
            retry_backoff: Duration::from_millis(250),
            min_call_interval: Duration::from_secs(1),
            smoke_test_prompt: "Say hello".to_string(),
        }
    }
}

impl OrchestratorSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        let retrieval = &config.retrieval;
        Self {
            top_k: retrieval.top_k,
            fallback_top_k: retrieval.fallback_top_k,
            context_char_budget: retrieval.context_char_budget,
            relevance: retrieval
                .min_relevance_score
                .map(RelevancePolicy::with_min_score)
                .unwrap_or_default(),
            max_retries: retrieval.max_retries,
            retry_backoff: Duration::from_millis(retrieval.retry_backoff_ms),
            min_call_interval: Duration::from_millis(config.generation.min_call_interval_ms),
            smoke_test_prompt: config.generation.smoke_test_prompt.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum InitError {
    #[error("{0} is not set")]
    MissingCredential(&'static str),

    #[error("index '{0}' does not exist")]
    IndexMissing(String),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error("generation smoke test failed: {0}")]
    Generation(#[from] GenerationError),
}

/// Handles acquired by a successful initialization.
struct Session {
    index: Arc<dyn RetrievalGateway>,
    generator: Arc<dyn GenerationGateway>,
}

enum Transition {
    Next(Stage),
    Done(AnswerResult),
}

/// Answers questions through the fallback chain.
///
/// One instance is shared by the whole process. Initialization happens at most
/// once successfully; failed attempts are retried by the next caller.
pub struct Orchestrator {
    settings: OrchestratorSettings,
    catalog: Arc<dyn IndexCatalog>,
    backend: Arc<dyn GenerationBackend>,
    credential: Option<String>,
    session: Mutex<Option<Arc<Session>>>,
    initialized: AtomicBool,
    limiter: RateLimiter,
}

impl Orchestrator {
    pub fn new(
        settings: OrchestratorSettings,
        catalog: Arc<dyn IndexCatalog>,
        backend: Arc<dyn GenerationBackend>,
        credential: Option<String>,
    ) -> Self {
        let limiter = RateLimiter::new(settings.min_call_interval);
        Self {
            settings,
            catalog,
            backend,
            credential,
            session: Mutex::new(None),
            initialized: AtomicBool::new(false),
            limiter,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn index_name(&self) -> &str {
        self.catalog.index_name()
    }

    pub fn model(&self) -> &str {
        self.backend.model()
    }

    pub fn catalog(&self) -> &Arc<dyn IndexCatalog> {
        &self.catalog
    }

    /// Completion time of the most recent generation call.
    pub fn last_generation_at(&self) -> Option<DateTime<Utc>> {
        self.limiter.last_call_at()
    }

    /// Connects to the index and the generation service. Idempotent.
    pub async fn initialize(&self) -> bool {
        self.session().await.is_some()
    }

    async fn session(&self) -> Option<Arc<Session>> {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_ref() {
            return Some(session.clone());
        }

        match self.connect().await {
            Ok(session) => {
                let session = Arc::new(session);
                *guard = Some(session.clone());
                self.initialized.store(true, Ordering::SeqCst);
                tracing::info!(
                    "Orchestrator initialized (index={}, model={})",
                    self.catalog.index_name(),
                    self.backend.model()
                );
                Some(session)
            }
            Err(e) => {
                tracing::error!("Orchestrator initialization failed: {}", e);
                None
            }
        }
    }

    async fn connect(&self) -> Result<Session, InitError> {
        let name = self.catalog.index_name().to_string();
        if !self.catalog.exists().await? {
            return Err(InitError::IndexMissing(name));
        }
        let index = self.catalog.open().await?;

        let credential = self
            .credential
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or(InitError::MissingCredential("GOOGLE_API_KEY"))?;
        let generator = self.backend.configure(credential)?;

        let reply = self
            .limiter
            .throttle(generator.generate(&self.settings.smoke_test_prompt))
            .await
            .inspect_err(|e| {
                if e.is_authentication() {
                    tracing::error!("Generation credential rejected; check GOOGLE_API_KEY");
                }
            })?;
        tracing::debug!(
            "Generation smoke test via {} returned {} chars",
            self.backend.name(),
            reply.chars().count()
        );

        Ok(Session { index, generator })
    }

    /// Answers `question`. Never fails; the strategy records which stage answered.
    pub async fn query(&self, question: &str) -> AnswerResult {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("query", %request_id);
        self.answer(question).instrument(span).await
    }

    async fn answer(&self, question: &str) -> AnswerResult {
        let Some(session) = self.session().await else {
            return AnswerResult::without_sources(
                prompt::INITIALIZATION_FAILED.to_string(),
                AnswerStrategy::InitializationFailed,
            );
        };

        let mut stage = Stage::Retrieve;
        let mut trace: Vec<&'static str> = Vec::new();

        for _ in 0..MAX_STAGES {
            trace.push(stage.name());
            match self.run_stage(&session, &stage, question).await {
                Transition::Next(next) => {
                    tracing::debug!("Stage {} -> {}", stage.name(), next.name());
                    stage = next;
                }
                Transition::Done(result) => {
                    tracing::info!(
                        "Answered with strategy {} (trace: {})",
                        result.strategy.as_str(),
                        trace.join(" -> ")
                    );
                    return result;
                }
            }
        }

        tracing::error!("Stage limit exceeded (trace: {})", trace.join(" -> "));
        fallback::TerminalReason::Unavailable.answer(question)
    }

    async fn run_stage(&self, session: &Session, stage: &Stage, question: &str) -> Transition {
        match stage {
            Stage::Retrieve => {
                let outcome = self
                    .search_with_retry(session, question, self.settings.top_k)
                    .await;
                Transition::Next(fallback::after_retrieval(outcome, &self.settings.relevance))
            }
            Stage::Rag(docs) => {
                let context = prompt::build_context(docs, self.settings.context_char_budget);
                match self
                    .generate(session, &prompt::rag_prompt(question, &context))
                    .await
                {
                    Ok(text) => Transition::Done(AnswerResult::new(
                        prompt::rag_answer(&text, docs),
                        docs.clone(),
                        AnswerStrategy::Rag,
                    )),
                    Err(e) => {
                        tracing::warn!("Grounded generation failed: {}", e);
                        Transition::Next(fallback::after_generation_failure(stage))
                    }
                }
            }
            Stage::Direct => match self.generate(session, &prompt::direct_prompt(question)).await {
                Ok(text) => Transition::Done(AnswerResult::without_sources(
                    prompt::direct_answer(&text),
                    AnswerStrategy::Direct,
                )),
                Err(e) => {
                    tracing::warn!("Direct generation failed: {}", e);
                    Transition::Next(fallback::after_generation_failure(stage))
                }
            },
            Stage::Digest => {
                let outcome = self
                    .search_with_retry(session, question, self.settings.fallback_top_k)
                    .await;
                match fallback::after_digest_retrieval(outcome) {
                    Ok(docs) => Transition::Done(AnswerResult::new(
                        prompt::digest_answer(question, &docs),
                        docs,
                        AnswerStrategy::Digest,
                    )),
                    Err(reason) => Transition::Next(Stage::Terminal(reason)),
                }
            }
            Stage::Terminal(reason) => Transition::Done(reason.answer(question)),
        }
    }

    async fn generate(&self, session: &Session, prompt: &str) -> Result<String, GenerationError> {
        self.limiter
            .throttle(session.generator.generate(prompt))
            .await
    }

    async fn search_with_retry(
        &self,
        session: &Session,
        question: &str,
        k: usize,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        let mut attempts = 0;

        loop {
            match session.index.search(question, k).await {
                Ok(docs) => {
                    tracing::debug!("Retrieved {} documents (k={})", docs.len(), k);
                    return Ok(docs);
                }
                Err(e) if e.is_transient() && attempts < self.settings.max_retries => {
                    attempts += 1;
                    let delay = backoff_delay(self.settings.retry_backoff, attempts);
                    tracing::warn!(
                        "Retrieval error (attempt {}/{}), retrying in {:?}: {}",
                        attempts,
                        self.settings.max_retries,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::warn!("Retrieval failed: {}", e);
                    return Err(e);
                }
            }
        }
    }
}

/// Exponential backoff with up to 50% random jitter.
fn backoff_delay(base: Duration, attempt: usize) -> Duration {
    let exponent = attempt.saturating_sub(1).min(10) as u32;
    let scaled = base.saturating_mul(1 << exponent);
    let half_ms = (scaled.as_millis() / 2) as u64;
    let jitter = if half_ms == 0 {
        0
    } else {
        rand::rng().random_range(0..=half_ms)
    };
    scaled + Duration::from_millis(jitter)
}
