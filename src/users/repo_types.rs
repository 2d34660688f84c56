use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::storage::Record;

/// User record as persisted in `users.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,                // lowercased
    pub password: String,             // stored as given
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Fields of a user about to be created, already validated and normalized.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Sparse profile change; `None` leaves the field as it is.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Record for User {
    type New = NewUser;
    type Patch = UserPatch;

    fn id(&self) -> i64 {
        self.id
    }

    fn build(id: i64, new: NewUser, now: OffsetDateTime) -> Self {
        Self {
            id,
            username: new.username,
            email: new.email,
            password: new.password,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, patch: UserPatch, now: OffsetDateTime) {
        if let Some(username) = patch.username {
            self.username = username;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(password) = patch.password {
            self.password = password;
        }
        self.updated_at = now;
    }
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}
