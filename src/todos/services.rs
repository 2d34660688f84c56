use tracing::{info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::todos::{
    dto::{truthy, CreateTodoRequest, UpdateTodoRequest},
    repo::TodoRepository,
    repo_types::{NewTodo, Todo, TodoPatch},
};

const MAX_TITLE_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 1000;

fn check_todo_id(id: i64) -> ServiceResult<()> {
    if id <= 0 {
        return Err(ServiceError::invalid("Invalid todo ID"));
    }
    Ok(())
}

// Same outcome whether the todo is missing or belongs to someone else.
fn todo_not_found(id: i64) -> ServiceError {
    ServiceError::not_found(format!("Todo with ID {id} not found"))
}

/// Lengths are counted in UTF-16 code units, the unit browser clients count in.
fn text_len(s: &str) -> usize {
    s.encode_utf16().count()
}

/// Length is measured before trimming, emptiness after.
fn clean_title(raw: &str, empty_msg: &str) -> ServiceResult<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ServiceError::invalid(empty_msg));
    }
    if text_len(raw) > MAX_TITLE_LEN {
        return Err(ServiceError::invalid(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(title.to_string())
}

fn clean_description(raw: Option<&str>) -> ServiceResult<String> {
    let raw = raw.unwrap_or_default();
    if text_len(raw) > MAX_DESCRIPTION_LEN {
        return Err(ServiceError::invalid(format!(
            "Description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(raw.trim().to_string())
}

/// Loads a todo only if `owner_id` owns it.
async fn find_owned(todos: &TodoRepository, owner_id: i64, id: i64) -> ServiceResult<Todo> {
    check_todo_id(id)?;
    match todos.find_one(id).await? {
        Some(todo) if todo.user_id == owner_id => Ok(todo),
        Some(_) => {
            warn!(todo_id = id, user_id = owner_id, "todo owned by another user");
            Err(todo_not_found(id))
        }
        None => Err(todo_not_found(id)),
    }
}

pub async fn list_todos(todos: &TodoRepository, owner_id: i64) -> ServiceResult<Vec<Todo>> {
    let all = todos.find_all().await?;
    Ok(all.into_iter().filter(|t| t.user_id == owner_id).collect())
}

pub async fn get_todo(todos: &TodoRepository, owner_id: i64, id: i64) -> ServiceResult<Todo> {
    find_owned(todos, owner_id, id).await
}

pub async fn create_todo(
    todos: &TodoRepository,
    owner_id: i64,
    req: CreateTodoRequest,
) -> ServiceResult<Todo> {
    let title = clean_title(req.title.as_deref().unwrap_or_default(), "Title is required")?;
    let description = clean_description(req.description.as_deref())?;

    let todo = todos
        .create(NewTodo {
            user_id: owner_id,
            title,
            description,
        })
        .await?;

    info!(todo_id = todo.id, user_id = owner_id, "todo created");
    Ok(todo)
}

pub async fn update_todo(
    todos: &TodoRepository,
    owner_id: i64,
    id: i64,
    req: UpdateTodoRequest,
) -> ServiceResult<Todo> {
    find_owned(todos, owner_id, id).await?;

    let mut patch = TodoPatch::default();
    // An explicit null title is an empty title; a null description clears it.
    if let Some(raw) = req.title {
        let raw = raw.unwrap_or_default();
        patch.title = Some(clean_title(&raw, "Title cannot be empty")?);
    }
    if let Some(raw) = req.description {
        patch.description = Some(clean_description(raw.as_deref())?);
    }
    if let Some(value) = req.completed.as_ref() {
        patch.completed = Some(truthy(value));
    }

    let todo = todos.update(id, patch).await?.ok_or_else(|| todo_not_found(id))?;
    info!(todo_id = id, user_id = owner_id, "todo updated");
    Ok(todo)
}

pub async fn toggle_todo(todos: &TodoRepository, owner_id: i64, id: i64) -> ServiceResult<Todo> {
    let current = find_owned(todos, owner_id, id).await?;
    let patch = TodoPatch {
        completed: Some(!current.completed),
        ..Default::default()
    };
    let todo = todos.update(id, patch).await?.ok_or_else(|| todo_not_found(id))?;
    info!(todo_id = id, completed = todo.completed, "todo toggled");
    Ok(todo)
}

pub async fn delete_todo(todos: &TodoRepository, owner_id: i64, id: i64) -> ServiceResult<()> {
    find_owned(todos, owner_id, id).await?;
    if !todos.remove(id).await? {
        return Err(todo_not_found(id));
    }
    info!(todo_id = id, user_id = owner_id, "todo deleted");
    Ok(())
}
