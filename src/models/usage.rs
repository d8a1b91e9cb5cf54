//! Usage/quota state as reported by the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Remaining-report quota and premium status for the caller.
///
/// `can_generate` is the only field consulted for gating: premium and
/// unlimited accounts bypass the numeric comparison, so the client must not
/// infer eligibility from `today_used < daily_limit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageStats {
    #[serde(default)]
    pub today_used: u32,
    #[serde(default)]
    pub daily_limit: u32,
    pub can_generate: bool,
    #[serde(default)]
    pub is_premium: bool,
    /// When the next report becomes available, if currently exhausted.
    #[serde(default)]
    pub next_available: Option<DateTime<Utc>>,
    /// Backend reason code explaining the current state.
    #[serde(default)]
    pub reason: Option<String>,
}

impl UsageStats {
    /// Permissive default used when the usage fetch fails: the tracker is
    /// advisory only, and the authoritative deny is the analyze call's 402.
    pub fn permissive() -> Self {
        Self {
            today_used: 0,
            daily_limit: 0,
            can_generate: true,
            is_premium: false,
            next_available: None,
            reason: None,
        }
    }
}
