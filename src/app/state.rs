//! Application state shared across routes

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::app::{ListView, Preferences, Session};
use crate::config::Config;
use crate::store::{FileStorage, KeyValueStorage, MemoryStorage, ProductStore, StoreError};

/// Product store together with the list view driving it.
/// Held under one lock so every operation runs to completion before the next.
pub struct Inventory {
    pub store: ProductStore,
    pub view: ListView,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub inventory: Arc<Mutex<Inventory>>,
    pub session: Session,
    pub preferences: Preferences,
}

impl AppState {
    /// Build state from configuration, opening file storage when configured
    pub fn new(config: Config) -> Result<Self, StoreError> {
        let storage: Arc<dyn KeyValueStorage> = match &config.storage_path {
            Some(path) => {
                let storage = FileStorage::open(path)?;
                debug!("Using file storage at {}", storage.path().display());
                Arc::new(storage)
            }
            None => {
                debug!("Using in-memory storage");
                Arc::new(MemoryStorage::new())
            }
        };

        Self::with_storage(config, storage)
    }

    /// Build state over an existing persistent storage.
    /// Session storage is always volatile.
    pub fn with_storage(
        config: Config,
        storage: Arc<dyn KeyValueStorage>,
    ) -> Result<Self, StoreError> {
        let store = ProductStore::open(storage.clone())?;

        Ok(Self {
            config: Arc::new(config),
            inventory: Arc::new(Mutex::new(Inventory {
                store,
                view: ListView::new(),
            })),
            session: Session::new(Arc::new(MemoryStorage::new())),
            preferences: Preferences::new(storage),
        })
    }
}
