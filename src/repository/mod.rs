//! Database repository layer
//!
//! Every task operation takes the caller's account id as its first argument;
//! there is intentionally no unscoped task lookup.

pub mod account_repo;
pub mod memory;
pub mod task_repo;

pub use account_repo::PgAccountRepository;
pub use memory::{InMemoryAccountRepository, InMemoryTaskRepository};
pub use task_repo::PgTaskRepository;

use crate::{
    config::DatabaseConfig,
    db::{self, DbError},
    error::AppError,
    models::{account::*, task::*},
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Account persistence
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Exact, case-sensitive match
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError>;

    /// Fails with `AccountExists` when the email is already taken.
    /// Implementations must enforce this atomically.
    async fn create(&self, account: NewAccount) -> Result<Account, AppError>;

    async fn update_by_id(
        &self,
        id: Uuid,
        patch: &UpdateProfileRequest,
    ) -> Result<Option<Account>, AppError>;

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Owner-scoped task persistence
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Newest first
    async fn list_for_owner(&self, owner_id: Uuid, filter: &TaskFilter)
        -> Result<Vec<Task>, AppError>;

    async fn create(&self, owner_id: Uuid, req: &CreateTaskRequest) -> Result<Task, AppError>;

    async fn find_owned(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Task>, AppError>;

    async fn update_owned(
        &self,
        owner_id: Uuid,
        id: Uuid,
        patch: &UpdateTaskRequest,
    ) -> Result<Option<Task>, AppError>;

    async fn delete_owned(&self, owner_id: Uuid, id: Uuid) -> Result<bool, AppError>;

    async fn delete_all_for_owner(&self, owner_id: Uuid) -> Result<u64, AppError>;
}

/// 存储后端集合
#[derive(Clone)]
pub struct Storage {
    pub accounts: Arc<dyn AccountRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    /// 仅 PostgreSQL 后端存在，用于就绪探针
    pub pool: Option<PgPool>,
}

impl Storage {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            accounts: Arc::new(PgAccountRepository::new(pool.clone())),
            tasks: Arc::new(PgTaskRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            accounts: Arc::new(InMemoryAccountRepository::new()),
            tasks: Arc::new(InMemoryTaskRepository::new()),
            pool: None,
        }
    }

    /// 按配置连接存储后端（PostgreSQL 会先执行迁移）
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbError> {
        if config.is_memory() {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            return Ok(Self::in_memory());
        }

        let pool = db::create_pool(config).await?;
        db::run_migrations(&pool).await?;
        Ok(Self::postgres(pool))
    }
}
