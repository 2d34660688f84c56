use std::path::PathBuf;

use crate::storage::{JsonStore, StoreError};
use crate::users::repo_types::{NewUser, User, UserPatch};

/// User collection backed by `users.json`.
#[derive(Clone)]
pub struct UserDirectory {
    store: JsonStore<User>,
}

impl UserDirectory {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self {
            store: JsonStore::open(path).await?,
        })
    }

    pub async fn find_all(&self) -> Result<Vec<User>, StoreError> {
        self.store.find_all().await
    }

    pub async fn find_one(&self, id: i64) -> Result<Option<User>, StoreError> {
        self.store.find_one(id).await
    }

    /// Exact match; callers lowercase the email first.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.store.find_first(|u| u.email == email).await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.store.find_first(|u| u.username == username).await
    }

    pub async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        self.store.create(new).await
    }

    pub async fn update(&self, id: i64, patch: UserPatch) -> Result<Option<User>, StoreError> {
        self.store.update(id, patch).await
    }

    pub async fn remove(&self, id: i64) -> Result<bool, StoreError> {
        self.store.remove(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: email.into(),
            password: "password123".into(),
        }
    }

    #[tokio::test]
    async fn lookups_are_exact_matches() {
        let dir = TempDir::new().unwrap();
        let users = UserDirectory::open(dir.path().join("users.json")).await.unwrap();
        users.create(new_user("ada", "ada@example.com")).await.unwrap();
        users.create(new_user("bob", "bob@example.com")).await.unwrap();

        let bob = users.find_by_email("bob@example.com").await.unwrap().unwrap();
        assert_eq!(bob.id, 2);
        assert!(users.find_by_email("BOB@example.com").await.unwrap().is_none());

        let ada = users.find_by_username("ada").await.unwrap().unwrap();
        assert_eq!(ada.id, 1);
        assert!(users.find_by_username("Ada").await.unwrap().is_none());
    }
}
