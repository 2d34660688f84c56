use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    error::bad_body,
    state::AppState,
    users::{
        dto::{CreateUserRequest, UpdateUserRequest},
        repo_types::PublicUser,
        services,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user).get(list_users))
        .route(
            "/users/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PublicUser>), (StatusCode, String)> {
    let Json(payload) = payload.map_err(bad_body)?;
    let user = services::create_user(&state.users, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicUser>>, (StatusCode, String)> {
    Ok(Json(services::list_users(&state.users).await?))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    Ok(Json(services::get_user(&state.users, id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let Json(payload) = payload.map_err(bad_body)?;
    let user = services::update_user(&state.users, id, payload).await?;
    state.sessions.refresh_user(&user).await;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, String)> {
    services::delete_user(&state.users, id).await?;
    let revoked = state.sessions.revoke_user(id).await;
    if revoked > 0 {
        info!(user_id = id, revoked, "sessions revoked");
    }
    Ok(StatusCode::NO_CONTENT)
}
