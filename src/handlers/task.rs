//! 任务的 HTTP 处理器
//!
//! 所有者始终取自认证上下文，请求体中的任何所有者字段都会被忽略。

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::AppState,
    models::task::*,
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

/// 列出任务，支持 `?title=` 与 `?description=` 搜索
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    query: Result<Query<TaskFilter>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(filter) = query?;

    let tasks = state
        .task_service
        .list(auth_context.account_id, &filter)
        .await?;

    Ok(Json(tasks))
}

pub async fn create_task(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;

    let task = state
        .task_service
        .create(auth_context.account_id, req)
        .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = path?;

    let task = state.task_service.get(auth_context.account_id, id).await?;

    Ok(Json(task))
}

pub async fn update_task(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = path?;
    let Json(req) = payload?;

    let task = state
        .task_service
        .update(auth_context.account_id, id, req)
        .await?;

    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = path?;

    state
        .task_service
        .delete(auth_context.account_id, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
