use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::storage::Record;

/// Todo record as persisted in `todos.json` and returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: i64,
    pub user_id: i64, // owner, fixed at creation
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewTodo {
    pub user_id: i64,
    pub title: String,
    pub description: String,
}

/// Sparse change set. There is no owner field: `user_id` cannot be patched.
#[derive(Debug, Clone, Default)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl Record for Todo {
    type New = NewTodo;
    type Patch = TodoPatch;

    fn id(&self) -> i64 {
        self.id
    }

    fn build(id: i64, new: NewTodo, now: OffsetDateTime) -> Self {
        Self {
            id,
            user_id: new.user_id,
            title: new.title,
            description: new.description,
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, patch: TodoPatch, now: OffsetDateTime) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        self.updated_at = now;
    }
}
