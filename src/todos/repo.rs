use std::path::PathBuf;

use crate::storage::{JsonStore, StoreError};
use crate::todos::repo_types::{NewTodo, Todo, TodoPatch};

/// Todo collection backed by `todos.json`. Holds every user's todos; owner
/// filtering is done by the services.
#[derive(Clone)]
pub struct TodoRepository {
    store: JsonStore<Todo>,
}

impl TodoRepository {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self {
            store: JsonStore::open(path).await?,
        })
    }

    pub async fn find_all(&self) -> Result<Vec<Todo>, StoreError> {
        self.store.find_all().await
    }

    pub async fn find_one(&self, id: i64) -> Result<Option<Todo>, StoreError> {
        self.store.find_one(id).await
    }

    pub async fn create(&self, new: NewTodo) -> Result<Todo, StoreError> {
        self.store.create(new).await
    }

    pub async fn update(&self, id: i64, patch: TodoPatch) -> Result<Option<Todo>, StoreError> {
        self.store.update(id, patch).await
    }

    pub async fn remove(&self, id: i64) -> Result<bool, StoreError> {
        self.store.remove(id).await
    }
}
