//! Route handlers.

use super::dto::{CreateTaskBody, ErrorBody, ListTasksQuery, MessageBody, TaskCreatedResponse};
use super::{ApiError, AppState};
use crate::task::domain::{TaskId, TaskRecord, TaskStatistics};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use mockable::Clock;
use serde_json::{Value, json};
use tracing::info;

const TASK_QUEUED: &str = "Task created and queued for execution";

pub(super) async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": format!("{} is running", state.info.project_name),
        "version": state.info.version,
        "status": "healthy",
    }))
}

pub(super) async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "services": state.services(),
    }))
}

pub(super) async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<CreateTaskBody>, JsonRejection>,
) -> Result<Json<TaskCreatedResponse>, ApiError> {
    let Json(body) = payload?;
    let request = body.into_request()?;
    let record = state
        .tasks
        .submit(request)
        .await
        .map_err(|err| ApiError::internal("Failed to create task", err))?;
    info!(task_id = %record.id(), "task queued");

    Ok(Json(TaskCreatedResponse {
        id: record.id().clone(),
        status: record.status(),
        message: TASK_QUEUED.to_owned(),
        created_at: record.created_at(),
        estimated_duration: state.info.limits.max_task_duration.map(|limit| limit.as_secs()),
    }))
}

pub(super) async fn task_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TaskRecord>, ApiError> {
    state
        .tasks
        .task_status(&TaskId::from(id))
        .await
        .map_err(|err| ApiError::internal("Failed to get task status", err))?
        .map(Json)
        .ok_or(ApiError::NotFound("Task not found"))
}

pub(super) async fn cancel_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageBody>, ApiError> {
    let cancelled = state
        .tasks
        .cancel(&TaskId::from(id))
        .await
        .map_err(|err| ApiError::internal("Failed to cancel task", err))?;
    if !cancelled {
        return Err(ApiError::NotFound("Task not found or already completed"));
    }
    Ok(Json(MessageBody {
        message: "Task cancelled successfully".to_owned(),
    }))
}

pub(super) async fn list_tasks(
    State(state): State<AppState>,
    params: Result<Query<ListTasksQuery>, QueryRejection>,
) -> Result<Json<Vec<TaskRecord>>, ApiError> {
    let Query(query) = params?;
    state
        .tasks
        .list(query.limit, query.offset)
        .await
        .map(Json)
        .map_err(|err| ApiError::internal("Failed to list tasks", err))
}

pub(super) async fn system_status(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let statistics = state
        .tasks
        .statistics()
        .await
        .map_err(|err| ApiError::internal("Failed to get system status", err))?;
    let limits = state.info.limits;

    Ok(Json(json!({
        "status": "healthy",
        "services": state.services(),
        "statistics": statistics,
        "uptime": state.info.started.elapsed().as_secs_f64(),
        "in_flight": state.tasks.in_flight(),
        "limits": {
            "max_concurrent_tasks": limits.max_concurrent_tasks,
            "rate_limit_per_minute": limits.rate_limit_per_minute,
            "max_task_duration": limits.max_task_duration.map(|limit| limit.as_secs()),
        },
    })))
}

pub(super) async fn task_statistics(
    State(state): State<AppState>,
) -> Result<Json<TaskStatistics>, ApiError> {
    state
        .tasks
        .statistics()
        .await
        .map(Json)
        .map_err(|err| ApiError::internal("Failed to get task statistics", err))
}

pub(super) async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": state.clock.utc(),
    }))
}

/// Fallback for unknown routes.
pub(super) async fn not_found() -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            detail: "Not Found".to_owned(),
        }),
    )
}
