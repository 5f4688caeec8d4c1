//! Access keys accepted when verifying presigned URLs.

use std::collections::HashMap;
use std::fmt;

use crate::error::AuthError;

/// Access key ID to secret key lookup.
#[derive(Clone, Default)]
pub struct Keyring {
    secrets: HashMap<String, String>,
}

impl fmt::Debug for Keyring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.secrets.keys().map(String::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("Keyring").field("access_keys", &ids).finish()
    }
}

impl Keyring {
    /// An empty keyring.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a key.
    #[must_use]
    pub fn with_key(mut self, access_key_id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.secrets.insert(access_key_id.into(), secret.into());
        self
    }

    /// The secret paired with `access_key_id`.
    pub fn secret(&self, access_key_id: &str) -> Result<&str, AuthError> {
        self.secrets
            .get(access_key_id)
            .map(String::as_str)
            .ok_or_else(|| AuthError::UnknownAccessKey(access_key_id.to_owned()))
    }
}
