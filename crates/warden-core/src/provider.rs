//! Provider scope for the session store
//!
//! The store is reachable only between `mount` and `unmount`; any access
//! outside that window is a programming error reported as `NoProvider`.

use parking_lot::RwLock;
use std::sync::Arc;

use warden_session::SessionStore;
use warden_storage::{Database, FileStore, KeyValueStore, MemoryStore};

use crate::config::{Config, StorageBackend};
use crate::error::CoreError;
use crate::Result;

/// Cloning shares the same scope.
#[derive(Clone, Default)]
pub struct AuthProvider {
    store: Arc<RwLock<Option<SessionStore>>>,
}

impl AuthProvider {
    /// Unmounted provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the configured storage and mount a fresh store over it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(&self, config: &Config) -> Result<SessionStore> {
        let storage = open_storage(config)?;
        Ok(self.mount_with(storage, config.session_key.clone()))
    }

    /// Mount a store over an already opened storage collaborator.
    pub fn mount_with(&self, storage: Arc<dyn KeyValueStore>, key: String) -> SessionStore {
        let store = SessionStore::open(storage, key);

        if self.store.write().replace(store.clone()).is_some() {
            tracing::warn!("Replaced an already mounted session store");
        }

        tracing::info!(key = %store.key(), "Mounted session provider");
        store
    }

    /// End the scope. Outstanding store handles keep working.
    pub fn unmount(&self) -> Option<SessionStore> {
        let store = self.store.write().take();
        if store.is_some() {
            tracing::info!("Unmounted session provider");
        }
        store
    }

    pub fn is_mounted(&self) -> bool {
        self.store.read().is_some()
    }

    /// Handle to the mounted store
    pub fn use_auth(&self) -> Result<SessionStore> {
        self.with_store(|store| Ok(store.clone()))
    }

    pub fn with_store<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&SessionStore) -> Result<T>,
    {
        let guard = self.store.read();
        match guard.as_ref() {
            Some(store) => f(store),
            None => Err(CoreError::NoProvider),
        }
    }
}

/// Open the storage collaborator selected by `config`.
pub fn open_storage(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    let storage: Arc<dyn KeyValueStore> = match config.backend {
        StorageBackend::Sqlite => {
            let path = config.database_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Arc::new(Database::open(&path)?)
        }
        StorageBackend::File => Arc::new(FileStore::new(config.session_dir())),
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
    };

    tracing::debug!(backend = %config.backend, data_dir = %config.data_dir.display(), "Opened storage");
    Ok(storage)
}
