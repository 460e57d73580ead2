//! HTTP API over the task execution service.
//!
//! Versioned routes are nested under the configured prefix:
//!
//! - `POST /tasks` queues a task
//! - `GET /tasks` lists tasks, most recently started first
//! - `GET /tasks/{id}/status` returns one task
//! - `POST /tasks/{id}/cancel` cancels a running task
//! - `GET /status`, `GET /status/tasks` and `GET /status/health` report
//!   service health and statistics
//!
//! `GET /` and `GET /health` sit outside the prefix.

mod cors;
pub mod dto;
mod error;
mod handlers;

pub use error::ApiError;

use crate::config::{Settings, TaskLimits};
use crate::task::{
    domain::{TaskId, TaskRecord, TaskRequest, TaskStatistics},
    ports::{CompletionClient, TaskStore},
    services::{TaskExecutionService, TaskServiceResult},
};
use async_trait::async_trait;
use axum::{
    Router,
    routing::{get, post},
};
use mockable::{Clock, DefaultClock};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

/// Task operations exposed over HTTP.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// Queues a task for background execution.
    async fn submit(&self, request: TaskRequest) -> TaskServiceResult<TaskRecord>;

    /// Looks up one task.
    async fn task_status(&self, id: &TaskId) -> TaskServiceResult<Option<TaskRecord>>;

    /// Cancels an in-flight task, returning `false` when it is not running.
    async fn cancel(&self, id: &TaskId) -> TaskServiceResult<bool>;

    /// Returns a page of tasks.
    async fn list(&self, limit: usize, offset: usize) -> TaskServiceResult<Vec<TaskRecord>>;

    /// Computes aggregate statistics.
    async fn statistics(&self) -> TaskServiceResult<TaskStatistics>;

    /// Number of tasks currently executing.
    fn in_flight(&self) -> usize;
}

#[async_trait]
impl<S, L, C> TaskApi for TaskExecutionService<S, L, C>
where
    S: TaskStore + 'static,
    L: CompletionClient + 'static,
    C: Clock + Send + Sync + 'static,
{
    async fn submit(&self, request: TaskRequest) -> TaskServiceResult<TaskRecord> {
        Self::submit(self, request).await
    }

    async fn task_status(&self, id: &TaskId) -> TaskServiceResult<Option<TaskRecord>> {
        self.get_task_status(id).await
    }

    async fn cancel(&self, id: &TaskId) -> TaskServiceResult<bool> {
        self.cancel_task(id).await
    }

    async fn list(&self, limit: usize, offset: usize) -> TaskServiceResult<Vec<TaskRecord>> {
        self.list_tasks(limit, offset).await
    }

    async fn statistics(&self) -> TaskServiceResult<TaskStatistics> {
        Self::statistics(self).await
    }

    fn in_flight(&self) -> usize {
        self.in_flight_count()
    }
}

/// Static facts reported by the status routes.
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    /// Service name.
    pub project_name: String,
    /// Service version.
    pub version: &'static str,
    /// Process start, used for uptime.
    pub started: Instant,
    /// Configured execution limits.
    pub limits: TaskLimits,
    /// Whether a completion API key is configured.
    pub completion_configured: bool,
}

impl ServiceInfo {
    /// Builds service facts from settings, starting the uptime clock now.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            project_name: settings.server.project_name.clone(),
            version: env!("CARGO_PKG_VERSION"),
            started: Instant::now(),
            limits: settings.limits,
            completion_configured: settings.openai.api_key.is_some(),
        }
    }
}

/// Shared state of every handler.
#[derive(Clone)]
pub struct AppState {
    tasks: Arc<dyn TaskApi>,
    info: Arc<ServiceInfo>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl AppState {
    /// Creates handler state using the system clock.
    #[must_use]
    pub fn new(tasks: Arc<dyn TaskApi>, info: ServiceInfo) -> Self {
        Self {
            tasks,
            info: Arc::new(info),
            clock: Arc::new(DefaultClock),
        }
    }

    /// Replaces the clock used for reported timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = clock;
        self
    }

    fn services(&self) -> Value {
        let ai_services = if self.info.completion_configured {
            "available"
        } else {
            "not_configured"
        };
        json!({
            "api": "running",
            "task_executor": "running",
            "ai_services": ai_services,
        })
    }
}

/// Builds the application router.
///
/// Versioned routes are nested under `api_prefix`; an empty prefix mounts
/// them at the root.
#[must_use]
pub fn router(state: AppState, api_prefix: &str, allowed_origins: &[String]) -> Router {
    let versioned = Router::new()
        .route("/tasks", post(handlers::create_task).get(handlers::list_tasks))
        .route("/tasks/{id}/status", get(handlers::task_status))
        .route("/tasks/{id}/cancel", post(handlers::cancel_task))
        .route("/status", get(handlers::system_status))
        .route("/status/tasks", get(handlers::task_statistics))
        .route("/status/health", get(handlers::health_check));

    let base = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health));
    let routes = if api_prefix.is_empty() {
        base.merge(versioned)
    } else {
        base.nest(api_prefix, versioned)
    };

    routes
        .fallback(handlers::not_found)
        .layer(cors::cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
