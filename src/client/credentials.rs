//! Persisted credentials cache.
//!
//! Bridges federated logins where the redirect flow hands the client a
//! bearer token instead of (or before) a readable session cookie. The file
//! is a cache, never authoritative: it is cleared on logout and whenever a
//! privileged call returns 401.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Cached authentication material.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    /// Mirror of the last known authenticated state.
    #[serde(default)]
    pub authenticated: bool,
    /// Bearer token from a federated login, if any.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl Credentials {
    /// True when the cache asserts an authenticated session with a token.
    pub fn is_usable(&self) -> bool {
        self.authenticated && self.token.is_some()
    }
}

/// Load/store/clear for the credentials file.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load cached credentials. Missing or unreadable files yield `None`;
    /// a corrupt cache is treated the same as no cache.
    pub fn load(&self) -> Option<Credentials> {
        let text = fs::read_to_string(&self.path).ok()?;
        match toml::from_str(&text) {
            Ok(creds) => Some(creds),
            Err(e) => {
                debug!("Ignoring corrupt credentials cache: {}", e);
                None
            }
        }
    }

    /// Persist credentials, creating the parent directory if needed.
    pub fn save(&self, creds: &Credentials) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = toml::to_string_pretty(creds)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, text)
    }

    /// Remove the cache file if present.
    pub fn clear(&self) -> std::io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
