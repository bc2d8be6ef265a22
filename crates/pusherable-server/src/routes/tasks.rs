//! Task views.
//!
//! Each view runs its base operation and calls the matching lifecycle hook
//! at the point the hook table prescribes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    Json,
};
use pusherable_core::{script_tag, subscribe_script};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::model::{Task, TaskForm};
use crate::state::AppState;

async fn load(state: &AppState, id: u64) -> ApiResult<Task> {
    state
        .get_task(id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("Task with id '{}' not found", id)))
}

/// Request body for creating a task.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
}

/// Create a task.
/// POST /tasks
pub async fn create_task(
    State(state): State<AppState>,
    Json(request): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let form = TaskForm {
        title: Some(request.title.clone()),
        ..Default::default()
    };
    form.validate().map_err(|errors| {
        ApiError::validation("Invalid task form").with_details(serde_json::Value::Object(errors))
    })?;

    let task = state.create_task(request.title.trim().to_string()).await;
    Ok((StatusCode::CREATED, Json(task)))
}

/// List tasks.
/// GET /tasks
pub async fn list_tasks(State(state): State<AppState>) -> Json<Vec<Task>> {
    Json(state.list_tasks().await)
}

/// Task detail; announces the view after rendering.
/// GET /tasks/:id
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    CurrentUser(actor): CurrentUser,
) -> ApiResult<Json<Task>> {
    let task = load(&state, id).await?;
    let hooks = state.hooks();

    let response = Json(task.clone());
    hooks.viewed(&task, &actor).await?;

    Ok(response)
}

/// Update a task.
/// PUT /tasks/:id
///
/// Announces `update_pending` on entry, then either `update_failed` before
/// the 422 response or `update_succeeded` after the save.
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    CurrentUser(actor): CurrentUser,
    Json(form): Json<TaskForm>,
) -> ApiResult<Json<Task>> {
    let task = load(&state, id).await?;
    let hooks = state.hooks();

    let before = hooks.update_pending(&task, &actor).await?;

    if let Err(errors) = form.validate() {
        hooks.update_failed(&*before, &actor).await?;
        return Err(ApiError::validation("Invalid task form")
            .with_details(serde_json::Value::Object(errors)));
    }

    let saved = state
        .save_existing(form.apply(&before))
        .await
        .ok_or_else(|| ApiError::not_found(format!("Task with id '{}' not found", id)))?;
    hooks.update_succeeded(&saved, &actor).await?;

    Ok(Json(saved))
}

/// Delete a task.
/// DELETE /tasks/:id
///
/// The task is captured before removal so `delete_succeeded` can still
/// describe it.
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    CurrentUser(actor): CurrentUser,
) -> ApiResult<Json<serde_json::Value>> {
    let task = load(&state, id).await?;
    let hooks = state.hooks();

    let snapshot = hooks.delete_pending(&task, &actor).await?;

    state
        .remove_task(id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("Task with id '{}' not found", id)))?;

    hooks.delete_succeeded(&snapshot, &actor).await?;

    Ok(Json(serde_json::json!({
        "message": "Task deleted successfully"
    })))
}

/// Browser subscription snippet for a task's channel.
/// GET /tasks/:id/subscribe
pub async fn subscribe(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Html<String>> {
    let task = load(&state, id).await?;
    let script = subscribe_script(state.settings(), &task)?;

    Ok(Html(format!("{}\n{}", script_tag(), script)))
}
