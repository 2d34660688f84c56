use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::users::{
    dto::{CreateUserRequest, UpdateUserRequest},
    repo::UserDirectory,
    repo_types::{NewUser, PublicUser, User, UserPatch},
};

const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn check_user_id(id: i64) -> ServiceResult<()> {
    if id <= 0 {
        return Err(ServiceError::invalid("Invalid user ID"));
    }
    Ok(())
}

fn user_not_found(id: i64) -> ServiceError {
    ServiceError::not_found(format!("User with ID {id} not found"))
}

fn check_password(password: &str) -> ServiceResult<()> {
    if password.encode_utf16().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::invalid(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn check_email(email: &str) -> ServiceResult<()> {
    if !is_valid_email(email) {
        warn!(email = %email, "invalid email");
        return Err(ServiceError::invalid("Invalid email format"));
    }
    Ok(())
}

pub async fn list_users(users: &UserDirectory) -> ServiceResult<Vec<PublicUser>> {
    let all = users.find_all().await?;
    Ok(all.into_iter().map(PublicUser::from).collect())
}

pub async fn get_user(users: &UserDirectory, id: i64) -> ServiceResult<PublicUser> {
    check_user_id(id)?;
    users
        .find_one(id)
        .await?
        .map(PublicUser::from)
        .ok_or_else(|| user_not_found(id))
}

pub async fn create_user(
    users: &UserDirectory,
    req: CreateUserRequest,
) -> ServiceResult<PublicUser> {
    let username = req.username.as_deref().map(str::trim).unwrap_or_default();
    if username.is_empty() {
        return Err(ServiceError::invalid("Username is required"));
    }

    let email = normalize_email(req.email.as_deref().unwrap_or_default());
    if email.is_empty() {
        return Err(ServiceError::invalid("Email is required"));
    }

    let password = req.password.unwrap_or_default();
    check_password(&password)?;
    check_email(&email)?;

    if users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ServiceError::conflict("Email already exists"));
    }
    if users.find_by_username(username).await?.is_some() {
        warn!(username = %username, "username already taken");
        return Err(ServiceError::conflict("Username already exists"));
    }

    let user = users
        .create(NewUser {
            username: username.to_string(),
            email,
            password,
        })
        .await?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(user.into())
}

/// Applies a partial profile update. Returns the full record so callers can
/// refresh any session holding the old one; project it before replying.
pub async fn update_user(
    users: &UserDirectory,
    id: i64,
    req: UpdateUserRequest,
) -> ServiceResult<User> {
    check_user_id(id)?;
    if users.find_one(id).await?.is_none() {
        return Err(user_not_found(id));
    }

    let mut patch = UserPatch::default();

    if let Some(raw) = req.username.as_deref() {
        let username = raw.trim();
        if username.is_empty() {
            return Err(ServiceError::invalid("Username cannot be empty"));
        }
        if let Some(other) = users.find_by_username(username).await? {
            if other.id != id {
                warn!(username = %username, "username already taken");
                return Err(ServiceError::conflict("Username already exists"));
            }
        }
        patch.username = Some(username.to_string());
    }

    if let Some(raw) = req.email.as_deref() {
        let email = normalize_email(raw);
        if email.is_empty() {
            return Err(ServiceError::invalid("Email cannot be empty"));
        }
        check_email(&email)?;
        if let Some(other) = users.find_by_email(&email).await? {
            if other.id != id {
                warn!(email = %email, "email already registered");
                return Err(ServiceError::conflict("Email already exists"));
            }
        }
        patch.email = Some(email);
    }

    if let Some(password) = req.password {
        check_password(&password)?;
        patch.password = Some(password);
    }

    let user = users.update(id, patch).await?.ok_or_else(|| user_not_found(id))?;
    info!(user_id = user.id, "user updated");
    Ok(user)
}

pub async fn delete_user(users: &UserDirectory, id: i64) -> ServiceResult<()> {
    check_user_id(id)?;
    if !users.remove(id).await? {
        return Err(user_not_found(id));
    }
    info!(user_id = id, "user deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn directory() -> (TempDir, UserDirectory) {
        let dir = TempDir::new().unwrap();
        let users = UserDirectory::open(dir.path().join("users.json")).await.unwrap();
        (dir, users)
    }

    fn register(username: &str, email: &str, password: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: Some(username.into()),
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last@sub.example.org"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("a@nodot"));
        assert!(!is_valid_email("a b@example.com"));
        assert!(!is_valid_email("a@@example.com"));
    }

    #[tokio::test]
    async fn create_normalizes_and_hides_password() {
        let (_dir, users) = directory().await;
        let created = create_user(&users, register("  ada ", " Ada@Example.COM ", "secret1"))
            .await
            .unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.username, "ada");
        assert_eq!(created.email, "ada@example.com");

        let json = serde_json::to_value(&created).unwrap();
        assert!(json.get("password").is_none());

        let fetched = serde_json::to_value(get_user(&users, 1).await.unwrap()).unwrap();
        assert!(fetched.get("password").is_none());
    }

    #[tokio::test]
    async fn create_rejects_missing_or_malformed_fields() {
        let (_dir, users) = directory().await;
        let cases = [
            register("   ", "a@b.co", "secret1"),
            register("ada", "  ", "secret1"),
            register("ada", "not-an-email", "secret1"),
            register("ada", "a@b.co", "12345"),
            CreateUserRequest {
                username: Some("ada".into()),
                email: Some("a@b.co".into()),
                password: None,
            },
            CreateUserRequest::default(),
        ];
        for req in cases {
            let err = create_user(&users, req).await.unwrap_err();
            assert!(matches!(err, ServiceError::InvalidInput(_)), "{err:?}");
        }
        assert!(users.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts_regardless_of_case() {
        let (_dir, users) = directory().await;
        create_user(&users, register("one", "x@y.com", "secret1")).await.unwrap();

        let err = create_user(&users, register("two", "x@y.com", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let err = create_user(&users, register("three", "X@Y.com", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let (_dir, users) = directory().await;
        create_user(&users, register("ada", "a@y.com", "secret1")).await.unwrap();
        let err = create_user(&users, register("ada", "b@y.com", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_allows_own_values_but_not_others() {
        let (_dir, users) = directory().await;
        create_user(&users, register("ada", "ada@y.com", "secret1")).await.unwrap();
        create_user(&users, register("bob", "bob@y.com", "secret1")).await.unwrap();

        let same = update_user(
            &users,
            1,
            UpdateUserRequest {
                username: Some("ada".into()),
                email: Some("ADA@y.com".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(same.email, "ada@y.com");
        assert!(same.updated_at >= same.created_at);

        let err = update_user(
            &users,
            1,
            UpdateUserRequest {
                email: Some("Bob@y.com".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let err = update_user(
            &users,
            1,
            UpdateUserRequest {
                username: Some("bob".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_validates_supplied_fields_only() {
        let (_dir, users) = directory().await;
        create_user(&users, register("ada", "ada@y.com", "secret1")).await.unwrap();

        let err = update_user(
            &users,
            1,
            UpdateUserRequest {
                password: Some("short".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let err = update_user(
            &users,
            1,
            UpdateUserRequest {
                username: Some("  ".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let updated = update_user(
            &users,
            1,
            UpdateUserRequest {
                password: Some("longer-secret".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.password, "longer-secret");
        assert_eq!(updated.username, "ada");
    }

    #[tokio::test]
    async fn missing_and_invalid_ids() {
        let (_dir, users) = directory().await;
        assert!(matches!(
            get_user(&users, 0).await.unwrap_err(),
            ServiceError::InvalidInput(_)
        ));
        assert!(matches!(
            get_user(&users, 42).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
        assert!(matches!(
            update_user(&users, 42, UpdateUserRequest::default()).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
        assert!(matches!(
            delete_user(&users, -1).await.unwrap_err(),
            ServiceError::InvalidInput(_)
        ));
        assert!(matches!(
            delete_user(&users, 42).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn delete_then_list() {
        let (_dir, users) = directory().await;
        create_user(&users, register("ada", "ada@y.com", "secret1")).await.unwrap();
        create_user(&users, register("bob", "bob@y.com", "secret1")).await.unwrap();

        delete_user(&users, 1).await.unwrap();
        let remaining = list_users(&users).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].username, "bob");
    }

    #[tokio::test]
    async fn password_length_counts_utf16_units() {
        let (_dir, users) = directory().await;
        // Three chars, six UTF-16 units.
        assert!(create_user(&users, register("ada", "ada@y.com", "😀😀😀")).await.is_ok());

        let err = create_user(&users, register("bob", "bob@y.com", "ééééé"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}
