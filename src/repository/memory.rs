//! In-memory storage backend
//!
//! Used for local development (`database.backend = memory`) and tests.
//! Not persistent: data is lost on drop.

use super::{AccountRepository, TaskRepository};
use crate::{
    error::AppError,
    models::{account::*, task::*},
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, AppError> {
    lock.read()
        .map_err(|_| AppError::storage("in-memory store lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, AppError> {
    lock.write()
        .map_err(|_| AppError::storage("in-memory store lock poisoned"))
}

#[derive(Default)]
pub struct InMemoryAccountRepository {
    accounts: RwLock<HashMap<Uuid, Account>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts
    pub fn len(&self) -> usize {
        self.accounts.read().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        Ok(read(&self.accounts)?
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        Ok(read(&self.accounts)?.get(&id).cloned())
    }

    async fn create(&self, account: NewAccount) -> Result<Account, AppError> {
        // 检查与插入在同一把写锁内完成
        let mut accounts = write(&self.accounts)?;
        if accounts.values().any(|a| a.email == account.email) {
            return Err(AppError::AccountExists);
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            email: account.email,
            password_hash: account.password_hash,
            first_name: account.first_name,
            last_name: account.last_name,
            avatar: None,
            created_at: now,
            updated_at: now,
        };
        accounts.insert(account.id, account.clone());

        Ok(account)
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        patch: &UpdateProfileRequest,
    ) -> Result<Option<Account>, AppError> {
        let mut accounts = write(&self.accounts)?;
        let Some(account) = accounts.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(first_name) = &patch.first_name {
            account.first_name = first_name.clone();
        }
        if let Some(last_name) = &patch.last_name {
            account.last_name = last_name.clone();
        }
        if let Some(avatar) = &patch.avatar {
            account.avatar = Some(avatar.clone());
        }
        account.updated_at = Utc::now();

        Ok(Some(account.clone()))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(write(&self.accounts)?.remove(&id).is_some())
    }
}

/// Tasks kept in insertion order
#[derive(Default)]
pub struct InMemoryTaskRepository {
    tasks: RwLock<Vec<Task>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn list_for_owner(
        &self,
        owner_id: Uuid,
        filter: &TaskFilter,
    ) -> Result<Vec<Task>, AppError> {
        let filter = filter.normalized();
        let mut tasks: Vec<Task> = read(&self.tasks)?
            .iter()
            .rev()
            .filter(|t| t.owner_id == owner_id && filter.matches(t))
            .cloned()
            .collect();

        // 稳定排序：时间戳相同的保持后插入者在前
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(tasks)
    }

    async fn create(&self, owner_id: Uuid, req: &CreateTaskRequest) -> Result<Task, AppError> {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            owner_id,
            title: req.title.clone(),
            description: req.description.clone(),
            status: req.status.unwrap_or_default(),
            category: req.category.clone(),
            deadline: req.deadline,
            image: None,
            created_at: now,
            updated_at: now,
        };
        write(&self.tasks)?.push(task.clone());

        Ok(task)
    }

    async fn find_owned(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Task>, AppError> {
        Ok(read(&self.tasks)?
            .iter()
            .find(|t| t.id == id && t.owner_id == owner_id)
            .cloned())
    }

    async fn update_owned(
        &self,
        owner_id: Uuid,
        id: Uuid,
        patch: &UpdateTaskRequest,
    ) -> Result<Option<Task>, AppError> {
        let mut tasks = write(&self.tasks)?;
        let Some(task) = tasks.iter_mut().find(|t| t.id == id && t.owner_id == owner_id) else {
            return Ok(None);
        };

        if let Some(title) = &patch.title {
            task.title = title.clone();
        }
        if let Some(description) = &patch.description {
            task.description = Some(description.clone());
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(category) = &patch.category {
            task.category = Some(category.clone());
        }
        if let Some(deadline) = patch.deadline {
            task.deadline = Some(deadline);
        }
        if let Some(image) = &patch.image {
            task.image = Some(image.clone());
        }
        task.updated_at = Utc::now();

        Ok(Some(task.clone()))
    }

    async fn delete_owned(&self, owner_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut tasks = write(&self.tasks)?;
        let before = tasks.len();
        tasks.retain(|t| !(t.id == id && t.owner_id == owner_id));
        Ok(tasks.len() < before)
    }

    async fn delete_all_for_owner(&self, owner_id: Uuid) -> Result<u64, AppError> {
        let mut tasks = write(&self.tasks)?;
        let before = tasks.len();
        tasks.retain(|t| t.owner_id != owner_id);
        Ok((before - tasks.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
        }
    }

    fn new_task(title: &str) -> CreateTaskRequest {
        CreateTaskRequest {
            title: title.to_string(),
            description: None,
            status: None,
            category: None,
            deadline: None,
        }
    }

    #[tokio::test]
    async fn test_account_email_uniqueness_is_enforced_on_create() {
        let repo = InMemoryAccountRepository::new();
        repo.create(new_account("alice@example.com")).await.unwrap();

        let err = repo.create(new_account("alice@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::AccountExists));

        // 邮箱按存储值精确匹配，区分大小写
        repo.create(new_account("Alice@example.com")).await.unwrap();
        assert_eq!(repo.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_creates_yield_one_account() {
        let repo = std::sync::Arc::new(InMemoryAccountRepository::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.create(new_account("race@example.com")).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_task_operations_are_owner_scoped() {
        let repo = InMemoryTaskRepository::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let task = repo.create(alice, &new_task("alice's task")).await.unwrap();

        assert!(repo.find_owned(bob, task.id).await.unwrap().is_none());
        let patch = UpdateTaskRequest {
            title: Some("hijacked".to_string()),
            ..Default::default()
        };
        assert!(repo.update_owned(bob, task.id, &patch).await.unwrap().is_none());
        assert!(!repo.delete_owned(bob, task.id).await.unwrap());

        let stored = repo.find_owned(alice, task.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "alice's task");
        assert!(repo.list_for_owner(bob, &TaskFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let repo = InMemoryTaskRepository::new();
        let owner = Uuid::new_v4();

        for title in ["first", "second", "third"] {
            repo.create(owner, &new_task(title)).await.unwrap();
        }

        let titles: Vec<String> = repo
            .list_for_owner(owner, &TaskFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_delete_all_for_owner() {
        let repo = InMemoryTaskRepository::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        repo.create(alice, &new_task("a1")).await.unwrap();
        repo.create(alice, &new_task("a2")).await.unwrap();
        repo.create(bob, &new_task("b1")).await.unwrap();

        assert_eq!(repo.delete_all_for_owner(alice).await.unwrap(), 2);
        assert_eq!(repo.list_for_owner(bob, &TaskFilter::default()).await.unwrap().len(), 1);
    }
}
