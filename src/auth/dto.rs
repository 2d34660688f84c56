use serde::{Deserialize, Serialize};

use crate::users::repo_types::PublicUser;

/// Request body for login.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Current session user, or `null` when no session is presented.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub message: String,
    pub user: Option<PublicUser>,
}
