//! Usage-limit tracking.
//!
//! Fetches and caches the caller's remaining-report quota. Advisory only:
//! it gates submission for UX, but the authoritative deny is the analyze
//! call's 402, which never consults this tracker.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::client::ApiClient;
use crate::models::UsageStats;

/// Cached view of the caller's usage/quota state.
#[derive(Clone)]
pub struct UsageTracker {
    client: ApiClient,
    cached: Arc<Mutex<Option<UsageStats>>>,
}

impl UsageTracker {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            cached: Arc::new(Mutex::new(None)),
        }
    }

    /// Fetch fresh stats from the backend.
    ///
    /// On failure this falls back to a permissive default rather than
    /// blocking the user on a transient network error.
    pub async fn refresh(&self) -> UsageStats {
        let stats = match self.client.usage().await {
            Ok(stats) => stats,
            Err(e) => {
                debug!("Usage fetch failed, assuming generation allowed: {}", e);
                UsageStats::permissive()
            }
        };
        *self.cached.lock().expect("usage cache lock poisoned") = Some(stats.clone());
        stats
    }

    /// Current stats, fetching on first use.
    pub async fn current(&self) -> UsageStats {
        let cached = self
            .cached
            .lock()
            .expect("usage cache lock poisoned")
            .clone();
        match cached {
            Some(stats) => stats,
            None => self.refresh().await,
        }
    }

    /// Last fetched stats without any network activity.
    pub fn cached(&self) -> Option<UsageStats> {
        self.cached.lock().expect("usage cache lock poisoned").clone()
    }
}
