//! Login flag held in session storage

use std::sync::Arc;

use tracing::info;

use crate::store::storage::{keys, KeyValueStorage, StorageError};

/// Message shown when the login form is incomplete
pub const MSG_LOGIN_REQUIRED: &str = "Email & password wajib diisi.";

/// The "logged in" session. Credentials are only checked for presence.
#[derive(Clone)]
pub struct Session {
    storage: Arc<dyn KeyValueStorage>,
}

impl Session {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Whether the session flag is set
    pub fn is_logged_in(&self) -> Result<bool, StorageError> {
        Ok(self.storage.get(keys::LOGGED_IN)?.as_deref() == Some("1"))
    }

    /// Set the session flag when both fields are filled in
    pub fn login(&self, email: &str, password: &str) -> Result<(), SessionError> {
        let email = email.trim();
        if email.is_empty() || password.trim().is_empty() {
            return Err(SessionError::MissingCredentials);
        }

        self.storage.set(keys::LOGGED_IN, "1")?;
        info!(email, "Session started");
        Ok(())
    }

    /// Drop everything in session storage
    pub fn logout(&self) -> Result<(), StorageError> {
        self.storage.clear()?;
        info!("Session cleared");
        Ok(())
    }
}

/// Session errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{}", MSG_LOGIN_REQUIRED)]
    MissingCredentials,

    #[error(transparent)]
    Storage(#[from] StorageError),
}
