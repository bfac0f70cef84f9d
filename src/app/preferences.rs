//! Display preferences kept in persistent storage

use std::sync::Arc;

use tracing::debug;

use crate::store::storage::{keys, KeyValueStorage, StorageError};

#[derive(Clone)]
pub struct Preferences {
    storage: Arc<dyn KeyValueStorage>,
}

impl Preferences {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    pub fn dark_mode(&self) -> Result<bool, StorageError> {
        Ok(self.storage.get(keys::DARK_MODE)?.as_deref() == Some("true"))
    }

    /// Flip dark mode and return the new setting
    pub fn toggle_dark_mode(&self) -> Result<bool, StorageError> {
        let enabled = !self.dark_mode()?;
        self.storage
            .set(keys::DARK_MODE, if enabled { "true" } else { "false" })?;
        debug!(enabled, "Dark mode toggled");
        Ok(enabled)
    }
}
