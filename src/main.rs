// Main entry point - Dependency injection and session setup
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use dashboard_engine::application::backend::Services;
use dashboard_engine::application::dispatcher::Dispatcher;
use dashboard_engine::infrastructure::config::{load_backend_fixture, load_engine_config};
use dashboard_engine::infrastructure::memory_backend::InMemoryBackend;
use dashboard_engine::presentation::app_state::AppState;
use dashboard_engine::presentation::event_log;
use dashboard_engine::presentation::handlers::run_session;
use dashboard_engine::presentation::session_script::SessionScript;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the event log
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config = load_engine_config().context("Failed to load engine configuration")?;
    let fixture = load_backend_fixture(&config.backend.fixture)?;

    // Create backend (infrastructure layer)
    let backend = InMemoryBackend::new(fixture).with_latency(config.backend.latency());
    let services = Services::from_backend(Arc::new(backend));

    // Create dispatcher (application layer)
    let dispatcher = Dispatcher::new(services.clone(), config.engine.default_settings.clone());
    event_log::attach(dispatcher.event_bus(), std::io::stdout());

    let script_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config.engine.session_script.clone());
    let script = SessionScript::load(&script_path)?;
    let base = Path::new(&script_path)
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let state = AppState::new(dispatcher, services);
    tracing::info!("Running session script {}", script_path);
    let report = run_session(&state, &script, &base).await?;

    if report.failed > 0 {
        tracing::warn!("{} commands failed", report.failed);
    }
    Ok(())
}
