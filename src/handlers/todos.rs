use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::db::models::DbTodo;
use crate::middleware::{AuthUser, JsonBody};
use crate::{BridgeError, router::BridgeState};

#[derive(Debug, Deserialize)]
pub struct NewTodo {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct TodoPatch {
    pub content: Option<String>,
    pub completed: Option<bool>,
}

pub async fn list(
    State(state): State<BridgeState>,
    user: AuthUser,
) -> Result<Json<Vec<DbTodo>>, BridgeError> {
    Ok(Json(state.storage.list_todos(user.id).await?))
}

pub async fn create(
    State(state): State<BridgeState>,
    user: AuthUser,
    JsonBody(body): JsonBody<NewTodo>,
) -> Result<(StatusCode, Json<DbTodo>), BridgeError> {
    let content = body.content.trim();
    if content.is_empty() {
        return Err(BridgeError::validation("Content is required"));
    }
    let todo = state.storage.create_todo(user.id, content).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

pub async fn update(
    State(state): State<BridgeState>,
    user: AuthUser,
    Path(id): Path<i64>,
    JsonBody(body): JsonBody<TodoPatch>,
) -> Result<Json<DbTodo>, BridgeError> {
    let content = body.content.as_deref().map(str::trim);
    if content.is_some_and(str::is_empty) {
        return Err(BridgeError::validation("Content must not be empty"));
    }
    state
        .storage
        .update_todo(user.id, id, content, body.completed)
        .await?
        .map(Json)
        .ok_or(BridgeError::NotFound("Todo"))
}

pub async fn delete(
    State(state): State<BridgeState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, BridgeError> {
    if state.storage.delete_todo(user.id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(BridgeError::NotFound("Todo"))
    }
}
