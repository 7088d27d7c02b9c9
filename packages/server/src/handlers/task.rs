use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{TaskRecord, TaskSubmission};
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::task::{TaskListQuery, validate_submission};
use crate::state::AppState;
use crate::store::StoreError;

#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = "Tasks",
    operation_id = "createTask",
    summary = "Store a generated task package",
    description = "Records the descriptor, rubric and file metadata of a generated package. The archive itself is not uploaded.",
    request_body = TaskSubmission,
    responses(
        (status = 201, description = "Task stored", body = TaskRecord),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Duplicate task_id (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(task_id = %payload.task_id))]
pub async fn create_task(
    State(state): State<AppState>,
    AppJson(payload): AppJson<TaskSubmission>,
) -> Result<impl IntoResponse, AppError> {
    validate_submission(&payload)?;

    let record = state.store.insert(payload).map_err(|e| match e {
        StoreError::Duplicate => AppError::Conflict(e.to_string()),
    })?;
    info!(id = %record.id, sector = %record.sector, "Task stored");

    Ok((StatusCode::CREATED, Json(record)))
}

#[utoipa::path(
    get,
    path = "/api/tasks/{task_id}",
    tag = "Tasks",
    operation_id = "getTask",
    summary = "Fetch a stored task",
    params(("task_id" = String, Path, description = "Package identifier, `<prefix>_<name>`")),
    responses(
        (status = 200, description = "Task record", body = TaskRecord),
        (status = 404, description = "Unknown task (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskRecord>, AppError> {
    state
        .store
        .get(&task_id)
        .map(|t| Json(t.record))
        .ok_or_else(|| AppError::NotFound("Task not found".into()))
}

#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = "Tasks",
    operation_id = "listTasks",
    summary = "List stored tasks, newest first",
    params(TaskListQuery),
    responses(
        (status = 200, description = "Matching tasks", body = [TaskRecord]),
        (status = 400, description = "Malformed query (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_tasks(
    State(state): State<AppState>,
    query: Result<Query<TaskListQuery>, axum::extract::rejection::QueryRejection>,
) -> Result<Json<Vec<TaskRecord>>, AppError> {
    let Query(query) = query.map_err(|e| AppError::Validation(e.body_text()))?;
    Ok(Json(state.store.list(&query)))
}
