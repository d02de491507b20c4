use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{ListQuery, Page, StoreError, StoreResult, TodoStore};
use crate::model::{NewTodo, Todo, TodoPatch};

struct Record {
    todo: Todo,
    seq: u64,
    deleted_at: Option<DateTime<Utc>>,
}

impl Record {
    fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

#[derive(Default)]
struct Inner {
    records: HashMap<Uuid, Record>,
    next_seq: u64,
}

impl Inner {
    fn live_mut(&mut self, id: Uuid) -> StoreResult<&mut Record> {
        self.records
            .get_mut(&id)
            .filter(|record| record.is_live())
            .ok_or(StoreError::NotFound)
    }
}

/// Process-local store. Each operation holds the lock for its whole
/// read-modify-write.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with a couple of sample todos.
    pub async fn with_samples() -> StoreResult<Self> {
        let store = Self::new();
        store
            .create(
                NewTodo::new("Learn Rust")
                    .with_description("Work through the book and build a sample API"),
            )
            .await?;
        store
            .create(
                NewTodo::new("Build a frontend")
                    .with_description("Create a web frontend for the todo application"),
            )
            .await?;
        Ok(store)
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn create(&self, input: NewTodo) -> StoreResult<Todo> {
        input.validate()?;

        let now = Utc::now();
        let mut inner = self.inner.write().await;
        let mut id = Uuid::new_v4();
        while inner.records.contains_key(&id) {
            id = Uuid::new_v4();
        }

        let todo = Todo {
            id,
            title: input.title,
            description: input.description,
            completed: input.completed,
            created_at: now,
            updated_at: now,
        };
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.records.insert(
            id,
            Record {
                todo: todo.clone(),
                seq,
                deleted_at: None,
            },
        );
        debug!(%id, "created todo");
        Ok(todo)
    }

    async fn list(&self, query: ListQuery) -> StoreResult<Page> {
        let inner = self.inner.read().await;
        let mut matching: Vec<&Record> = inner
            .records
            .values()
            .filter(|record| record.is_live())
            .filter(|record| query.completed.map_or(true, |c| record.todo.completed == c))
            .collect();
        matching.sort_by(|a, b| {
            b.todo
                .created_at
                .cmp(&a.todo.created_at)
                .then(b.seq.cmp(&a.seq))
        });

        let total = matching.len();
        let items = matching
            .into_iter()
            .skip(usize::try_from(query.offset).unwrap_or(usize::MAX))
            .take(query.limit as usize)
            .map(|record| record.todo.clone())
            .collect();

        Ok(Page {
            items,
            total: total as u64,
        })
    }

    async fn get(&self, id: Uuid) -> StoreResult<Todo> {
        let inner = self.inner.read().await;
        inner
            .records
            .get(&id)
            .filter(|record| record.is_live())
            .map(|record| record.todo.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn update(&self, id: Uuid, patch: TodoPatch) -> StoreResult<Todo> {
        patch.validate()?;
        let mut inner = self.inner.write().await;
        let record = inner.live_mut(id)?;
        patch.apply(&mut record.todo, Utc::now());
        Ok(record.todo.clone())
    }

    async fn set_completed(&self, id: Uuid, completed: bool) -> StoreResult<Todo> {
        let mut inner = self.inner.write().await;
        let record = inner.live_mut(id)?;
        record.todo.completed = completed;
        record.todo.touch(Utc::now());
        Ok(record.todo.clone())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let record = inner.live_mut(id)?;
        record.deleted_at = Some(Utc::now());
        debug!(%id, "soft-deleted todo");
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
