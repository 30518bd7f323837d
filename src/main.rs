use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use nyaya_backend::core::logging;
use nyaya_backend::server;
use nyaya_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let state = AppState::initialize()?;
    logging::init(&state.paths);

    let server_config = &state.settings.server;
    let listener = bind_first_available(
        &server_config.host,
        server_config.port,
        server_config.port_attempts,
    )
    .await?;
    let addr = listener.local_addr()?;

    println!("NYAYA_PORT={}", addr.port());
    tracing::info!(
        "Listening on {} (index={}, model={})",
        addr,
        state.orchestrator.index_name(),
        state.orchestrator.model()
    );

    let app: Router = server::router::router(state.clone());
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Binds the first free port in `[port, port + attempts)`.
async fn bind_first_available(host: &str, port: u16, attempts: u16) -> anyhow::Result<TcpListener> {
    let attempts = attempts.max(1);
    let mut last_error = None;

    for offset in 0..attempts {
        let Some(candidate) = port.checked_add(offset) else {
            break;
        };
        let bind_addr = format!("{}:{}", host, candidate);
        match TcpListener::bind(&bind_addr).await {
            Ok(listener) => return Ok(listener),
            Err(e) => {
                tracing::warn!("Port {} unavailable: {}", candidate, e);
                last_error = Some(e);
            }
        }
    }

    let err = last_error
        .map(anyhow::Error::from)
        .unwrap_or_else(|| anyhow::anyhow!("no port candidates"));
    Err(err).with_context(|| {
        format!(
            "Failed to bind {} on ports {}..{}",
            host,
            port,
            port.saturating_add(attempts)
        )
    })
}
