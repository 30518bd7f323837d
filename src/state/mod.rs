use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::config::{AppConfig, AppPaths, ConfigService};
use crate::generation::GeminiBackend;
use crate::orchestrator::{Orchestrator, OrchestratorSettings};
use crate::retrieval::{HuggingFaceEmbedder, PineconeCatalog};

pub mod error;

use error::InitializationError;

/// Global application state shared across all routes.
///
/// Building it performs no network calls; the orchestrator connects lazily on
/// the first query or on an explicit initialize request.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: ConfigService,
    pub settings: Arc<AppConfig>,
    pub orchestrator: Arc<Orchestrator>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Resolves paths, loads configuration and wires the gateways.
    pub fn initialize() -> Result<Arc<Self>, InitializationError> {
        Self::from_paths(Arc::new(AppPaths::new()))
    }

    pub fn from_paths(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());
        let settings = config
            .load_app_config()
            .map_err(|e| InitializationError::Config(e.into()))?;
        Self::with_config(paths, config, settings)
    }

    /// Wires the gateways from an already loaded configuration.
    pub fn with_config(
        paths: Arc<AppPaths>,
        config: ConfigService,
        settings: AppConfig,
    ) -> Result<Arc<Self>, InitializationError> {
        let embedder = Arc::new(
            HuggingFaceEmbedder::new(&settings.embedding)
                .map_err(|e| InitializationError::Retrieval(e.into()))?,
        );
        let catalog = Arc::new(
            PineconeCatalog::new(&settings.retrieval, embedder)
                .map_err(|e| InitializationError::Retrieval(e.into()))?,
        );
        let backend = Arc::new(GeminiBackend::new(&settings.generation));

        let orchestrator = Arc::new(Orchestrator::new(
            OrchestratorSettings::from_config(&settings),
            catalog,
            backend,
            settings.generation.api_key.clone(),
        ));

        Ok(Arc::new(AppState {
            paths,
            config,
            settings: Arc::new(settings),
            orchestrator,
            started_at: Utc::now(),
        }))
    }
}
