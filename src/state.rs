use std::sync::Arc;

use anyhow::Context;

use crate::auth::session::SessionStore;
use crate::config::AppConfig;
use crate::todos::repo::TodoRepository;
use crate::users::repo::UserDirectory;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: UserDirectory,
    pub todos: TodoRepository,
    pub sessions: SessionStore,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        Self::from_config(config).await
    }

    /// Opens both collections under `config.data_dir`, creating them if absent.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let users = UserDirectory::open(config.users_path())
            .await
            .context("open users collection")?;
        let todos = TodoRepository::open(config.todos_path())
            .await
            .context("open todos collection")?;

        Ok(Self {
            config: Arc::new(config),
            users,
            todos,
            sessions: SessionStore::new(),
        })
    }
}
