//! Persistence for todos.
//!
//! # Design
//! `TodoStore` is the only mutator of persisted state. Handlers hold it as
//! `Arc<dyn TodoStore>` so the in-memory and PostgreSQL backends are
//! interchangeable and the HTTP layer can be tested without a database.
//! Soft-deleted records are invisible to every operation here; their ids
//! stay reserved.

mod memory;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{NewTodo, Todo, TodoPatch, ValidationError};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("todo not found")]
    NotFound,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub type SharedStore = Arc<dyn TodoStore>;

/// Filter and window for `TodoStore::list`. Values are taken as given;
/// normalization of user input happens in the payload layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListQuery {
    pub completed: Option<bool>,
    pub limit: u32,
    pub offset: u64,
}

/// One window of a filtered listing. `total` counts every matching record,
/// not just the ones in `items`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<Todo>,
    pub total: u64,
}

#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn create(&self, input: NewTodo) -> StoreResult<Todo>;

    /// Newest first, filtered before counting and windowing. An offset past
    /// the end yields an empty page.
    async fn list(&self, query: ListQuery) -> StoreResult<Page>;

    async fn get(&self, id: Uuid) -> StoreResult<Todo>;

    async fn update(&self, id: Uuid, patch: TodoPatch) -> StoreResult<Todo>;

    /// Set `completed` to exactly `completed`. This is not a flip.
    async fn set_completed(&self, id: Uuid, completed: bool) -> StoreResult<Todo>;

    async fn delete(&self, id: Uuid) -> StoreResult<()>;

    async fn ping(&self) -> StoreResult<()>;
}
