//! HTTP client for the DataPulse backend.
//!
//! One reqwest client per `ApiClient`, with a shared cookie jar so the
//! backend's session cookie flows across calls, plus an optional bearer
//! token for federated logins. All privileged endpoints send both.

mod credentials;

pub use credentials::{CredentialStore, Credentials};

use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::config::Settings;
use crate::models::{Audience, SessionState, UsageStats};
use crate::utils::UploadCandidate;

/// Header carrying the content-derived idempotency key on the analyze upload.
pub const IDEMPOTENCY_HEADER: &str = "X-Idempotency-Key";

/// Errors from backend calls, mapped onto the client's error taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A privileged call returned 401: the session is no longer valid.
    #[error("session expired")]
    AuthExpired,
    /// The analyze call returned 402: quota exhausted, upgrade required.
    #[error("usage limit reached")]
    QuotaExceeded { checkout_url: Option<String> },
    /// Any other non-success status, with the response body text when
    /// readable.
    #[error("backend returned {status}: {message}")]
    Backend { status: u16, message: String },
    /// Transport-level failure (DNS, TLS, timeout, connection reset).
    #[error("connection error: {0}")]
    Connection(#[from] reqwest::Error),
    /// The response body did not parse as the expected shape.
    #[error("failed to parse response: {0}")]
    Parse(String),
    /// The configured API base URL is not a valid URL.
    #[error("invalid API base URL: {0}")]
    InvalidBase(String),
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SummaryRequest<'a> {
    upload_id: &'a str,
    business_goal: &'a str,
    audience: Audience,
}

/// Client for the DataPulse backend API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base: String,
    base_url: Url,
    jar: Arc<Jar>,
    token: Arc<RwLock<Option<String>>>,
    upload_timeout: Duration,
}

impl ApiClient {
    /// Create a new API client from settings.
    pub fn new(settings: &Settings) -> Result<Self, ApiError> {
        let base = settings.api_base.trim_end_matches('/').to_string();
        let base_url =
            Url::parse(&base).map_err(|e| ApiError::InvalidBase(format!("{}: {}", base, e)))?;

        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .user_agent(&settings.user_agent)
            .timeout(Duration::from_secs(settings.request_timeout))
            .cookie_provider(jar.clone())
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            base,
            base_url,
            jar,
            token: Arc::new(RwLock::new(None)),
            upload_timeout: Duration::from_secs(settings.upload_timeout),
        })
    }

    /// Set or clear the cached bearer token attached to privileged calls.
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().expect("token lock poisoned") = token;
    }

    /// Current bearer token, if any.
    pub fn token(&self) -> Option<String> {
        self.token.read().expect("token lock poisoned").clone()
    }

    /// Whether the cookie jar holds anything for the backend host.
    ///
    /// Used by the session tracker to tell "definitely logged out" apart
    /// from "session cookie present but not yet propagated server-side".
    pub fn has_session_cookie(&self) -> bool {
        self.jar.cookies(&self.base_url).is_some()
    }

    fn attach_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Check the current session ("am I logged in").
    ///
    /// A 401 here is a normal answer, not an error: it maps to an
    /// unauthenticated state.
    pub async fn session(&self) -> Result<SessionState, ApiError> {
        let url = format!("{}/api/auth/session", self.base);
        let resp = self.attach_auth(self.client.get(&url)).send().await?;

        match resp.status() {
            StatusCode::UNAUTHORIZED => Ok(SessionState::default()),
            status if status.is_success() => resp
                .json::<SessionState>()
                .await
                .map_err(|e| ApiError::Parse(e.to_string())),
            status => Err(Self::backend_error(status, resp).await),
        }
    }

    /// Ask the backend to start an anonymous session (sets a cookie).
    pub async fn start_session(&self) -> Result<(), ApiError> {
        let url = format!("{}/api/session/start", self.base);
        let resp = self.client.post(&url).send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::backend_error(resp.status(), resp).await)
        }
    }

    /// Log in with email and password. The session cookie lands in the jar;
    /// a token in the response covers federated flows.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionState, ApiError> {
        let url = format!("{}/api/auth/login", self.base);
        let resp = self
            .client
            .post(&url)
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        if resp.status().is_success() {
            resp.json::<SessionState>()
                .await
                .map_err(|e| ApiError::Parse(e.to_string()))
        } else {
            Err(Self::backend_error(resp.status(), resp).await)
        }
    }

    /// Log out server-side (best-effort; local state is cleared regardless).
    pub async fn logout(&self) -> Result<(), ApiError> {
        let url = format!("{}/api/auth/logout", self.base);
        let resp = self.attach_auth(self.client.post(&url)).send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::backend_error(resp.status(), resp).await)
        }
    }

    /// Fetch the caller's usage/quota state.
    pub async fn usage(&self) -> Result<UsageStats, ApiError> {
        let url = format!("{}/api/usage", self.base);
        let resp = self.attach_auth(self.client.get(&url)).send().await?;

        match resp.status() {
            StatusCode::UNAUTHORIZED => Err(ApiError::AuthExpired),
            status if status.is_success() => resp
                .json::<UsageStats>()
                .await
                .map_err(|e| ApiError::Parse(e.to_string())),
            status => Err(Self::backend_error(status, resp).await),
        }
    }

    /// Phase 1: upload the file and run the quick analysis.
    ///
    /// Returns the raw response body; shape normalization happens in
    /// `analyze::normalize`. The upload gets a longer per-request timeout
    /// than the small API calls.
    pub async fn analyze(
        &self,
        candidate: &UploadCandidate,
        content: Vec<u8>,
        idempotency_key: &str,
    ) -> Result<serde_json::Value, ApiError> {
        let media_type = if candidate.media_type.is_empty() {
            "application/octet-stream"
        } else {
            &candidate.media_type
        };
        let part = Part::bytes(content)
            .file_name(candidate.name.clone())
            .mime_str(media_type)?;
        let form = Form::new().part("file", part);

        let url = format!("{}/api/analyze", self.base);
        debug!("Uploading {} for analysis", candidate.name);
        let resp = self
            .attach_auth(self.client.post(&url))
            .header(IDEMPOTENCY_HEADER, idempotency_key)
            .multipart(form)
            .timeout(self.upload_timeout)
            .send()
            .await?;

        match resp.status() {
            StatusCode::UNAUTHORIZED => Err(ApiError::AuthExpired),
            StatusCode::PAYMENT_REQUIRED => {
                let checkout_url = resp
                    .json::<serde_json::Value>()
                    .await
                    .ok()
                    .and_then(|body| {
                        body.get("checkout_url")
                            .and_then(|v| v.as_str())
                            .map(str::to_string)
                    });
                Err(ApiError::QuotaExceeded { checkout_url })
            }
            status if status.is_success() => resp
                .json::<serde_json::Value>()
                .await
                .map_err(|e| ApiError::Parse(e.to_string())),
            status => Err(Self::backend_error(status, resp).await),
        }
    }

    /// Phase 2: request the AI summary for an already-uploaded file.
    ///
    /// No file bytes are re-sent; the backend retains the upload keyed by
    /// the handle from phase 1.
    pub async fn ai_summary(
        &self,
        upload_id: &str,
        business_goal: &str,
        audience: Audience,
    ) -> Result<serde_json::Value, ApiError> {
        let url = format!("{}/api/ai-summary", self.base);
        let resp = self
            .attach_auth(self.client.post(&url))
            .json(&SummaryRequest {
                upload_id,
                business_goal,
                audience,
            })
            .send()
            .await?;

        if resp.status().is_success() {
            resp.json::<serde_json::Value>()
                .await
                .map_err(|e| ApiError::Parse(e.to_string()))
        } else {
            Err(Self::backend_error(resp.status(), resp).await)
        }
    }

    /// Confirm a checkout session after a paywall redirect.
    pub async fn verify_payment(&self, session_id: &str) -> Result<serde_json::Value, ApiError> {
        let url = format!("{}/api/payments/verify", self.base);
        let resp = self
            .attach_auth(self.client.get(&url))
            .query(&[("session_id", session_id)])
            .send()
            .await?;

        match resp.status() {
            StatusCode::UNAUTHORIZED => Err(ApiError::AuthExpired),
            status if status.is_success() => resp
                .json::<serde_json::Value>()
                .await
                .map_err(|e| ApiError::Parse(e.to_string())),
            status => Err(Self::backend_error(status, resp).await),
        }
    }

    /// Map a non-success response to a `Backend` error, carrying the body
    /// text when readable.
    async fn backend_error(status: StatusCode, resp: reqwest::Response) -> ApiError {
        let message = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            _ => format!("request failed with {}", status),
        };
        ApiError::Backend {
            status: status.as_u16(),
            message,
        }
    }
}
