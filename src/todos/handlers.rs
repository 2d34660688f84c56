use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::AuthUser,
    error::bad_body,
    state::AppState,
    todos::{
        dto::{CreateTodoRequest, UpdateTodoRequest},
        repo_types::Todo,
        services,
    },
};

pub fn todo_routes() -> Router<AppState> {
    Router::new()
        .route("/todos", post(create_todo).get(list_todos))
        .route(
            "/todos/:id",
            get(get_todo).patch(update_todo).delete(delete_todo),
        )
        .route("/todos/:id/toggle", patch(toggle_todo))
}

#[instrument(skip(state, payload))]
pub async fn create_todo(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), (StatusCode, String)> {
    let Json(payload) = payload.map_err(bad_body)?;
    let todo = services::create_todo(&state.todos, auth.user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

#[instrument(skip(state))]
pub async fn list_todos(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<Todo>>, (StatusCode, String)> {
    Ok(Json(services::list_todos(&state.todos, auth.user_id).await?))
}

#[instrument(skip(state))]
pub async fn get_todo(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Todo>, (StatusCode, String)> {
    Ok(Json(services::get_todo(&state.todos, auth.user_id, id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_todo(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<Json<Todo>, (StatusCode, String)> {
    let Json(payload) = payload.map_err(bad_body)?;
    Ok(Json(
        services::update_todo(&state.todos, auth.user_id, id, payload).await?,
    ))
}

#[instrument(skip(state))]
pub async fn toggle_todo(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Todo>, (StatusCode, String)> {
    Ok(Json(services::toggle_todo(&state.todos, auth.user_id, id).await?))
}

#[instrument(skip(state))]
pub async fn delete_todo(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, String)> {
    services::delete_todo(&state.todos, auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
