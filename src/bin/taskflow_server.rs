//! Serves the TaskFlow HTTP API.
//!
//! Usage:
//!
//! ```text
//! taskflow_server
//! ```
//!
//! All settings come from the environment; see [`taskflow::config`]. The
//! server binds `HOST:PORT` and shuts down gracefully on Ctrl-C.

use std::sync::Arc;

use mockable::DefaultClock;
use taskflow::api::{self, AppState, ServiceInfo};
use taskflow::config::Settings;
use taskflow::task::adapters::{memory::InMemoryTaskStore, openai::OpenAiCompletionClient};
use taskflow::task::services::TaskExecutionService;
use taskflow::telemetry::init_tracing;
use tokio::net::TcpListener;
use tokio::runtime::Builder;
use tracing::{info, warn};

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn main() -> Result<(), BoxError> {
    let settings = Settings::from_env()?;
    init_tracing(&settings.logging)?;

    let runtime = Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(serve(settings))
}

async fn serve(settings: Settings) -> Result<(), BoxError> {
    if settings.openai.api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; task execution will fail until it is configured");
    }

    let completion = Arc::new(OpenAiCompletionClient::new(settings.openai_config())?);
    let store = Arc::new(InMemoryTaskStore::new());
    let service = TaskExecutionService::new(
        store,
        completion,
        Arc::new(DefaultClock),
        settings.generation_defaults(),
    )
    .with_max_task_duration(settings.limits.max_task_duration);

    let state = AppState::new(Arc::new(service), ServiceInfo::from_settings(&settings));
    let app = api::router(state, &settings.server.api_prefix, &settings.allowed_origins);

    let address = settings.server.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!(
        address = %address,
        project = %settings.server.project_name,
        api_prefix = %settings.server.api_prefix,
        "listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
