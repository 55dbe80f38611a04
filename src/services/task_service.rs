//! 任务服务
//!
//! 所有操作都以调用者的账户 ID 为作用域，不属于调用者的任务一律视为不存在。

use crate::{
    error::AppError,
    models::task::*,
    repository::{AccountRepository, TaskRepository},
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub struct TaskService {
    accounts: Arc<dyn AccountRepository>,
    tasks: Arc<dyn TaskRepository>,
}

impl TaskService {
    pub fn new(accounts: Arc<dyn AccountRepository>, tasks: Arc<dyn TaskRepository>) -> Self {
        Self { accounts, tasks }
    }

    /// 列出调用者的任务（按创建时间倒序）
    pub async fn list(
        &self,
        owner_id: Uuid,
        filter: &TaskFilter,
    ) -> Result<Vec<TaskResponse>, AppError> {
        let now = Utc::now();
        let tasks = self.tasks.list_for_owner(owner_id, &filter.normalized()).await?;
        Ok(tasks.into_iter().map(|t| TaskResponse::at(t, now)).collect())
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        req: CreateTaskRequest,
    ) -> Result<TaskResponse, AppError> {
        req.validate()?;

        // 账户删除后令牌仍可通过验证，不能再为其创建任务
        if self.accounts.find_by_id(owner_id).await?.is_none() {
            return Err(AppError::not_found("user"));
        }

        let task = self.tasks.create(owner_id, &req).await?;

        tracing::info!(task_id = %task.id, owner_id = %owner_id, "Task created");
        Ok(task.into())
    }

    pub async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<TaskResponse, AppError> {
        self.tasks
            .find_owned(owner_id, id)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::not_found("task"))
    }

    /// 部分更新，未出现的字段保持不变
    pub async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        req: UpdateTaskRequest,
    ) -> Result<TaskResponse, AppError> {
        req.validate()?;

        let task = self
            .tasks
            .update_owned(owner_id, id, &req)
            .await?
            .ok_or_else(|| AppError::not_found("task"))?;

        tracing::info!(task_id = %task.id, "Task updated");
        Ok(task.into())
    }

    pub async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.tasks.delete_owned(owner_id, id).await? {
            return Err(AppError::not_found("task"));
        }

        tracing::info!(task_id = %id, "Task deleted");
        Ok(())
    }
}
