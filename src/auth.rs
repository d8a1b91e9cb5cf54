//! Authentication-state tracking.
//!
//! `SessionTracker` owns the `checking -> {authenticated, unauthenticated}`
//! state machine and the credentials cache. It is passed explicitly to every
//! component that gates on authentication; nothing else reads or writes
//! auth state.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::client::{ApiClient, ApiError, CredentialStore, Credentials};
use crate::models::SessionState;

/// Delay before the single retry when a session cookie is present but the
/// backend has not yet acknowledged it (federated-redirect race).
const COOKIE_RACE_RETRY: Duration = Duration::from_millis(300);

/// Tracker state machine.
#[derive(Debug, Clone)]
pub enum AuthState {
    Checking,
    Authenticated(SessionState),
    Unauthenticated,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }
}

/// Tracks whether the current session is authenticated.
#[derive(Clone)]
pub struct SessionTracker {
    inner: Arc<TrackerInner>,
}

struct TrackerInner {
    client: ApiClient,
    store: CredentialStore,
    state: Mutex<AuthState>,
    retry_delay: Duration,
}

impl SessionTracker {
    pub fn new(client: ApiClient, store: CredentialStore) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                client,
                store,
                state: Mutex::new(AuthState::Checking),
                retry_delay: COOKIE_RACE_RETRY,
            }),
        }
    }

    /// Override the cookie-race retry delay (tests).
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        let inner = Arc::get_mut(&mut self.inner)
            .expect("retry delay must be set before the tracker is shared");
        inner.retry_delay = delay;
        self
    }

    /// Current state without any network activity.
    pub fn state(&self) -> AuthState {
        self.inner.state.lock().expect("auth state lock poisoned").clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    fn set_state(&self, state: AuthState) {
        *self.inner.state.lock().expect("auth state lock poisoned") = state;
    }

    /// Resolve the authentication state against the backend.
    ///
    /// Order of checks:
    /// 1. A usable cached token (federated login) authenticates immediately,
    ///    with an opportunistic refresh spawned in the background.
    /// 2. Otherwise ask the backend, with the ambient session cookie.
    /// 3. On a negative answer, try to start a session, and if the jar
    ///    observably holds a cookie retry once after a short delay - a
    ///    federated redirect may not have propagated server-side yet.
    pub async fn resolve(&self) -> AuthState {
        self.set_state(AuthState::Checking);

        if let Some(creds) = self.inner.store.load() {
            if creds.is_usable() {
                debug!("Authenticated from cached token");
                self.inner.client.set_token(creds.token.clone());
                let session = SessionState {
                    authenticated: true,
                    user_id: creds.user_id,
                    session_id: creds.session_id,
                    ..Default::default()
                };
                let state = AuthState::Authenticated(session);
                self.set_state(state.clone());

                let tracker = self.clone();
                tokio::spawn(async move {
                    tracker.refresh().await;
                });
                return state;
            }
        }

        match self.inner.client.session().await {
            Ok(session) if session.authenticated => return self.accept(session),
            Ok(_) => {}
            Err(e) => debug!("Session check failed: {}", e),
        }

        // Start an anonymous session so the backend sets a cookie for
        // subsequent calls; failure here is not fatal.
        if let Err(e) = self.inner.client.start_session().await {
            debug!("Session start failed: {}", e);
        }

        if self.inner.client.has_session_cookie() {
            debug!("Session cookie present but unacknowledged; retrying once");
            tokio::time::sleep(self.inner.retry_delay).await;
            if let Ok(session) = self.inner.client.session().await {
                if session.authenticated {
                    return self.accept(session);
                }
            }
        }

        self.set_state(AuthState::Unauthenticated);
        AuthState::Unauthenticated
    }

    /// Re-check the session and update local state from the answer.
    ///
    /// A definitive "not authenticated" from the backend invalidates the
    /// cache; transport errors leave the current state alone.
    pub async fn refresh(&self) {
        match self.inner.client.session().await {
            Ok(session) if session.authenticated => {
                self.accept(session);
            }
            Ok(_) => {
                debug!("Backend reports session gone; clearing cached credentials");
                self.invalidate();
            }
            Err(e) => debug!("Session refresh failed: {}", e),
        }
    }

    /// Log in with email and password.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionState, ApiError> {
        let session = self.inner.client.login(email, password).await?;
        self.accept(session.clone());
        Ok(session)
    }

    /// Accept an externally obtained bearer token (federated login bridge),
    /// verifying it against the backend when reachable.
    pub async fn login_with_token(&self, token: &str) -> Result<SessionState, ApiError> {
        self.inner.client.set_token(Some(token.to_string()));
        self.persist(&SessionState {
            authenticated: true,
            token: Some(token.to_string()),
            ..Default::default()
        });

        match self.inner.client.session().await {
            Ok(session) if session.authenticated => {
                self.accept(session.clone());
                Ok(session)
            }
            Ok(_) => {
                self.invalidate();
                Err(ApiError::AuthExpired)
            }
            Err(e) => {
                // Unreachable backend: keep the cached token, the way the
                // federated flow trusts it until a privileged call says no.
                warn!("Could not verify token against backend: {}", e);
                Ok(SessionState::from_cached_token())
            }
        }
    }

    /// Log out: best-effort server-side, then clear all local state.
    pub async fn logout(&self) {
        if let Err(e) = self.inner.client.logout().await {
            debug!("Server-side logout failed: {}", e);
        }
        self.invalidate();
        info!("Logged out");
    }

    /// React to an authentication-expired signal (401 mid-flow): clear the
    /// cached token and return to unauthenticated.
    pub fn invalidate(&self) {
        if let Err(e) = self.inner.store.clear() {
            warn!("Failed to clear credentials cache: {}", e);
        }
        self.inner.client.set_token(None);
        self.set_state(AuthState::Unauthenticated);
    }

    fn accept(&self, session: SessionState) -> AuthState {
        if session.token.is_some() {
            self.inner.client.set_token(session.token.clone());
        }
        self.persist(&session);
        let state = AuthState::Authenticated(session);
        self.set_state(state.clone());
        state
    }

    fn persist(&self, session: &SessionState) {
        let creds = Credentials {
            authenticated: session.authenticated,
            token: session.token.clone().or_else(|| self.inner.client.token()),
            user_id: session.user_id.clone(),
            session_id: session.session_id.clone(),
        };
        if let Err(e) = self.inner.store.save(&creds) {
            warn!("Failed to persist credentials cache: {}", e);
        }
    }
}
