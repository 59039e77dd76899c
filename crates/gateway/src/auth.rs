//! Bearer-token state shared by the client and the login flow.
//!
//! The token lives behind a [`TokenStore`] so the client can run against a
//! JSON file on disk in the shell and a plain map in tests.

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;
use tokio::{fs, sync::RwLock};
use tracing::{debug, warn};

/// Key under which the bearer token is persisted.
pub const TOKEN_KEY: &str = "token";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token storage error: {0}")]
    Storage(String),
}

/// Key-value storage for session state.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<String>, AuthError>;
    async fn save(&self, key: &str, value: &str) -> Result<(), AuthError>;
    async fn remove(&self, key: &str) -> Result<(), AuthError>;
}

/// Process-local store; nothing survives a restart.
#[derive(Default)]
pub struct MemoryTokenStore {
    inner: RwLock<HashMap<String, String>>,
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), AuthError> {
        self.inner.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AuthError> {
        self.inner.write().await.remove(key);
        Ok(())
    }
}

/// JSON file-backed store, the shell's equivalent of browser local storage.
///
/// The whole map is rewritten on every change; it only ever holds a few keys.
pub struct FileTokenStore {
    inner: RwLock<HashMap<String, String>>,
    file_path: PathBuf,
}

impl FileTokenStore {
    /// Open the store at `path`, creating the file with an empty map if missing.
    /// A corrupt file is treated as empty and overwritten on the next write.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Self, AuthError> {
        let file_path = path.into();
        common::env::ensure_parent_dir(&file_path)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        let map: HashMap<String, String> = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(path = %file_path.display(), error = %e, "session file unreadable; starting empty");
                HashMap::new()
            }),
            Err(_) => {
                let empty: HashMap<String, String> = HashMap::new();
                write_map(&file_path, &empty).await?;
                empty
            }
        };

        Ok(Self { inner: RwLock::new(map), file_path })
    }

    pub fn path(&self) -> &PathBuf {
        &self.file_path
    }

    async fn persist(&self, map: &HashMap<String, String>) -> Result<(), AuthError> {
        write_map(&self.file_path, map).await
    }
}

async fn write_map(path: &PathBuf, map: &HashMap<String, String>) -> Result<(), AuthError> {
    let data = serde_json::to_vec(map).map_err(|e| AuthError::Storage(e.to_string()))?;
    fs::write(path, data)
        .await
        .map_err(|e| AuthError::Storage(e.to_string()))
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), AuthError> {
        let mut map = self.inner.write().await;
        map.insert(key.to_string(), value.to_string());
        self.persist(&map).await
    }

    async fn remove(&self, key: &str) -> Result<(), AuthError> {
        let mut map = self.inner.write().await;
        if map.remove(key).is_some() {
            self.persist(&map).await?;
        }
        Ok(())
    }
}

/// Handle to the current bearer token, injected into the client and the login flow.
#[derive(Clone)]
pub struct AuthContext {
    store: Arc<dyn TokenStore>,
}

impl AuthContext {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStore::default()))
    }

    /// Current token; empty values and storage failures read as absent.
    pub async fn token(&self) -> Option<String> {
        match self.store.load(TOKEN_KEY).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "failed to read auth token");
                None
            }
        }
    }

    pub async fn set_token(&self, token: impl Into<String>) -> Result<(), AuthError> {
        let token = token.into();
        self.store.save(TOKEN_KEY, &token).await?;
        debug!("auth token stored");
        Ok(())
    }

    pub async fn clear_token(&self) -> Result<(), AuthError> {
        self.store.remove(TOKEN_KEY).await?;
        debug!("auth token cleared");
        Ok(())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token().await.is_some()
    }
}
