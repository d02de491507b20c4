use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use super::{ListQuery, Page, StoreError, StoreResult, TodoStore};
use crate::model::{NewTodo, Todo, TodoPatch};

const TODO_COLUMNS: &str = "id, title, description, completed, created_at, updated_at";

/// PostgreSQL-backed store. Every operation is a single statement, so the
/// database's per-statement atomicity is the only locking needed.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the versioned schema under `migrations/`.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("database schema is up to date");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TodoStore for PgStore {
    async fn create(&self, input: NewTodo) -> StoreResult<Todo> {
        input.validate()?;

        let now = Utc::now();
        let sql = format!(
            "INSERT INTO todos (id, title, description, completed, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $5)
             RETURNING {TODO_COLUMNS}"
        );
        let todo = sqlx::query_as::<_, Todo>(&sql)
            .bind(Uuid::new_v4())
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.completed)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        debug!(id = %todo.id, "created todo");
        Ok(todo)
    }

    async fn list(&self, query: ListQuery) -> StoreResult<Page> {
        debug!(?query, "listing todos");

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM todos
             WHERE deleted_at IS NULL
             AND ($1::BOOLEAN IS NULL OR completed = $1)",
        )
        .bind(query.completed)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            "SELECT {TODO_COLUMNS} FROM todos
             WHERE deleted_at IS NULL
             AND ($1::BOOLEAN IS NULL OR completed = $1)
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        let items = sqlx::query_as::<_, Todo>(&sql)
            .bind(query.completed)
            .bind(i64::from(query.limit))
            .bind(i64::try_from(query.offset).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            items,
            total: total.max(0) as u64,
        })
    }

    async fn get(&self, id: Uuid) -> StoreResult<Todo> {
        let sql = format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Todo>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn update(&self, id: Uuid, patch: TodoPatch) -> StoreResult<Todo> {
        patch.validate()?;

        let sql = format!(
            "UPDATE todos SET
                 title = COALESCE($2, title),
                 description = COALESCE($3, description),
                 completed = COALESCE($4, completed),
                 updated_at = GREATEST($5, updated_at)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {TODO_COLUMNS}"
        );
        sqlx::query_as::<_, Todo>(&sql)
            .bind(id)
            .bind(patch.title.into_option())
            .bind(patch.description.into_option())
            .bind(patch.completed.into_option())
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn set_completed(&self, id: Uuid, completed: bool) -> StoreResult<Todo> {
        let sql = format!(
            "UPDATE todos SET completed = $2, updated_at = GREATEST($3, updated_at)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {TODO_COLUMNS}"
        );
        sqlx::query_as::<_, Todo>(&sql)
            .bind(id)
            .bind(completed)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE todos SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        debug!(%id, "soft-deleted todo");
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
