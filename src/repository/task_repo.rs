//! Task repository (数据库访问层)
//! 所有语句都带 owner_id 条件

use super::TaskRepository;
use crate::{error::AppError, models::task::*};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

pub struct PgTaskRepository {
    db: PgPool,
}

impl PgTaskRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// 所有者已不存在（外键冲突）时返回 NotFound，而不是数据库错误
fn map_insert_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_foreign_key_violation() {
            return AppError::not_found("user");
        }
    }
    AppError::Database(e)
}

/// 转义 LIKE 通配符，使搜索词按字面匹配
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn list_for_owner(
        &self,
        owner_id: Uuid,
        filter: &TaskFilter,
    ) -> Result<Vec<Task>, AppError> {
        let filter = filter.normalized();

        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT * FROM tasks
            WHERE owner_id = $1
                AND ($2::text IS NULL OR title ILIKE '%' || $2 || '%' ESCAPE '\')
                AND ($3::text IS NULL OR description ILIKE '%' || $3 || '%' ESCAPE '\')
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .bind(filter.title.as_deref().map(escape_like))
        .bind(filter.description.as_deref().map(escape_like))
        .fetch_all(&self.db)
        .await?;

        Ok(tasks)
    }

    async fn create(&self, owner_id: Uuid, req: &CreateTaskRequest) -> Result<Task, AppError> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (id, owner_id, title, description, status, category, deadline)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.status.unwrap_or_default().as_str())
        .bind(&req.category)
        .bind(req.deadline)
        .fetch_one(&self.db)
        .await
        .map_err(map_insert_error)?;

        Ok(task)
    }

    async fn find_owned(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.db)
            .await?;

        Ok(task)
    }

    async fn update_owned(
        &self,
        owner_id: Uuid,
        id: Uuid,
        patch: &UpdateTaskRequest,
    ) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                status = COALESCE($5, status),
                category = COALESCE($6, category),
                deadline = COALESCE($7, deadline),
                image = COALESCE($8, image),
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(&patch.category)
        .bind(patch.deadline)
        .bind(&patch.image)
        .fetch_optional(&self.db)
        .await?;

        Ok(task)
    }

    async fn delete_owned(&self, owner_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_for_owner(&self, owner_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE owner_id = $1")
            .bind(owner_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }
}
