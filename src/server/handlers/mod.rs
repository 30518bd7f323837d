pub mod config;
pub mod health;
pub mod query;
pub mod setup;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::core::config::{AppConfig, AppPaths, ConfigService};
    use crate::state::AppState;

    /// State with no credentials and an unreachable control plane.
    pub fn offline_state(dir: &tempfile::TempDir) -> Arc<AppState> {
        let paths = Arc::new(AppPaths::with_dirs(
            dir.path().to_path_buf(),
            dir.path().join("data"),
        ));
        let mut settings = AppConfig::default();
        settings.retrieval.control_plane_url = "http://127.0.0.1:9".to_string();
        settings.retrieval.request_timeout_secs = 1;
        settings.server.init_timeout_secs = 5;

        let config = ConfigService::new(paths.clone());
        AppState::with_config(paths, config, settings).unwrap()
    }
}
