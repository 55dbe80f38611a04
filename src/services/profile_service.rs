//! 个人资料服务

use crate::{
    error::AppError,
    models::account::*,
    repository::{AccountRepository, TaskRepository},
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub struct ProfileService {
    accounts: Arc<dyn AccountRepository>,
    tasks: Arc<dyn TaskRepository>,
}

impl ProfileService {
    pub fn new(accounts: Arc<dyn AccountRepository>, tasks: Arc<dyn TaskRepository>) -> Self {
        Self { accounts, tasks }
    }

    pub async fn get(&self, account_id: Uuid) -> Result<AccountResponse, AppError> {
        self.accounts
            .find_by_id(account_id)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::not_found("user"))
    }

    /// 更新资料，只修改请求中出现的字段
    pub async fn update(
        &self,
        account_id: Uuid,
        req: UpdateProfileRequest,
    ) -> Result<AccountResponse, AppError> {
        req.validate()?;

        if req.is_empty() {
            return self.get(account_id).await;
        }

        let account = self
            .accounts
            .update_by_id(account_id, &req)
            .await?
            .ok_or_else(|| AppError::not_found("user"))?;

        tracing::info!(account_id = %account.id, "Profile updated");
        Ok(account.into())
    }

    /// 删除账户及其全部任务
    ///
    /// 先删账户：PostgreSQL 由外键级联删除任务，内存后端随后单独清理。
    /// 令牌不会被吊销，但之后的任务操作只会得到空结果或 404。
    pub async fn delete(&self, account_id: Uuid) -> Result<(), AppError> {
        if !self.accounts.delete_by_id(account_id).await? {
            return Err(AppError::not_found("user"));
        }

        let removed_tasks = self.tasks.delete_all_for_owner(account_id).await?;

        tracing::info!(account_id = %account_id, removed_tasks, "Account deleted");
        Ok(())
    }
}
