use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{dto::LoginRequest, jwt::JwtKeys, session::SessionStore},
    error::{ServiceError, ServiceResult},
    users::{repo::UserDirectory, repo_types::User, services::normalize_email},
};

fn invalid_credentials() -> ServiceError {
    ServiceError::unauthorized("Invalid credentials")
}

/// Looks the user up by email and compares the stored password verbatim.
pub async fn validate_credentials(
    users: &UserDirectory,
    email: &str,
    password: &str,
) -> ServiceResult<User> {
    let email = normalize_email(email);
    if email.is_empty() || password.is_empty() {
        warn!("login without email or password");
        return Err(invalid_credentials());
    }

    let Some(user) = users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(invalid_credentials());
    };
    if user.password != password {
        warn!(email = %email, user_id = user.id, "login invalid password");
        return Err(invalid_credentials());
    }
    Ok(user)
}

/// Validates credentials and binds the user to a new session. Returns the
/// bearer token naming that session together with the bound user.
pub async fn login(
    users: &UserDirectory,
    sessions: &SessionStore,
    keys: &JwtKeys,
    req: LoginRequest,
) -> ServiceResult<(String, User)> {
    let user = validate_credentials(
        users,
        req.email.as_deref().unwrap_or_default(),
        req.password.as_deref().unwrap_or_default(),
    )
    .await?;

    let sid = Uuid::new_v4();
    let (token, expires_at) = keys.sign(user.id, sid)?;
    sessions.bind(sid, user.clone(), expires_at).await;

    info!(user_id = user.id, email = %user.email, %sid, "user logged in");
    Ok((token, user))
}
