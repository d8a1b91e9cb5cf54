//! Session state as reported by the backend.

use serde::{Deserialize, Serialize};

/// The backend's answer to "am I logged in".
///
/// The source of truth is always the backend; the client mirrors this into
/// local state (and optionally into the credentials cache for federated
/// logins) but never treats the mirror as authoritative.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    /// Premium flag, when the backend includes it in the session payload.
    #[serde(default)]
    pub premium: Option<bool>,
    /// Bearer token issued for federated logins; cached locally when present.
    #[serde(default)]
    pub token: Option<String>,
}

impl SessionState {
    /// An authenticated state backed only by a cached token (no round-trip).
    pub fn from_cached_token() -> Self {
        Self {
            authenticated: true,
            ..Default::default()
        }
    }
}
