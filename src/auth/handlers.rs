use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, MeResponse, MessageResponse},
        extractors::AuthUser,
        jwt::JwtKeys,
        services,
    },
    error::bad_body,
    state::AppState,
    users::repo_types::PublicUser,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", post(me))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, (StatusCode, String)> {
    let Json(payload) = payload.map_err(bad_body)?;
    let keys = JwtKeys::from_ref(&state);
    let (token, user) = services::login(&state.users, &state.sessions, &keys, payload).await?;
    Ok(Json(LoginResponse {
        message: "Login successful".into(),
        token,
        user: user.into(),
    }))
}

/// Always succeeds; clears the presented session if there is one.
#[instrument(skip(state))]
pub async fn logout(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
) -> Json<MessageResponse> {
    if let Some(auth) = auth {
        state.sessions.clear(auth.session_id).await;
        info!(user_id = auth.user_id, sid = %auth.session_id, "user logged out");
    }
    Json(MessageResponse {
        message: "Logout successful".into(),
    })
}

#[instrument(skip(state))]
pub async fn me(State(state): State<AppState>, auth: Option<AuthUser>) -> Json<MeResponse> {
    let user = match auth {
        Some(auth) => state.sessions.current(auth.session_id).await,
        None => None,
    };
    match user {
        Some(user) => Json(MeResponse {
            message: "Current user".into(),
            user: Some(PublicUser::from(user)),
        }),
        None => Json(MeResponse {
            message: "No user logged in".into(),
            user: None,
        }),
    }
}
