//! Upload-and-analyze orchestration.
//!
//! The service owns the `idle -> uploading -> analyzing -> done` state
//! machine, the re-entrancy guard and the simulated progress value, and
//! emits events for the UI layer to render. Nothing outside this module
//! mutates any of that state.

pub mod normalize;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::auth::SessionTracker;
use crate::client::{ApiClient, ApiError};
use crate::models::{AnalysisResult, Audience};
use crate::usage::UsageTracker;
use crate::utils::{sha256_hex, UploadCandidate};

/// Simulated progress constants. The browser-era design could not observe
/// real multipart-upload progress through a single exchange, so the value is
/// timer-driven: it starts at 10, climbs by 5 every 200 ms, plateaus below
/// 100, and only completion sets 100.
const PROGRESS_START: u8 = 10;
const PROGRESS_STEP: u8 = 5;
const PROGRESS_PLATEAU: u8 = 92;
const PROGRESS_TICK: Duration = Duration::from_millis(200);

/// Orchestrator phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzeStatus {
    Idle,
    Uploading,
    Analyzing,
    Done,
}

impl AnalyzeStatus {
    /// Status line shown next to the progress bar.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Waiting for file…",
            Self::Uploading => "Uploading file…",
            Self::Analyzing => "Analyzing data…",
            Self::Done => "Analysis complete.",
        }
    }

    fn in_flight(&self) -> bool {
        matches!(self, Self::Uploading | Self::Analyzing)
    }
}

/// Progress events emitted to the UI layer.
#[derive(Debug, Clone)]
pub enum AnalyzeEvent {
    Status(AnalyzeStatus),
    Progress(u8),
}

/// Failures surfaced by the orchestrator. Every variant leaves the state
/// machine back at idle with progress 0 and the re-entrancy guard released.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    /// Another invocation is in flight; this one is a no-op.
    #[error("another analysis is already running")]
    Busy,
    /// Not authenticated; no network activity was attempted.
    #[error("please log in first to generate a report")]
    NotAuthenticated,
    /// The advisory usage gate says the quota is exhausted.
    #[error("daily report limit reached")]
    LimitReached {
        next_available: Option<DateTime<Utc>>,
    },
    /// The analyze call returned 401 mid-flow.
    #[error("your session has expired, please log in again")]
    SessionExpired,
    /// The analyze call returned 402: the authoritative paywall.
    #[error("report quota exhausted, upgrade required")]
    QuotaExceeded { checkout_url: Option<String> },
    /// Anything else: transient network or backend failure.
    #[error("{0}")]
    Failed(String),
}

/// One submission: the validated candidate, its bytes, and the summary
/// parameters.
#[derive(Debug)]
pub struct AnalyzeRequest {
    pub candidate: UploadCandidate,
    pub content: Vec<u8>,
    pub business_goal: String,
    pub audience: Audience,
}

struct Flow {
    status: AnalyzeStatus,
    progress: u8,
    /// Generation of the run that last wrote this state. Stale runs (an
    /// orphaned request resolving after a reset) fail the currency check
    /// and leave newer state untouched.
    generation: u64,
}

struct ServiceInner {
    client: ApiClient,
    session: SessionTracker,
    usage: UsageTracker,
    flow: Mutex<Flow>,
    generations: AtomicU64,
}

/// The upload-and-analyze orchestrator.
#[derive(Clone)]
pub struct AnalyzeService {
    inner: Arc<ServiceInner>,
}

impl AnalyzeService {
    pub fn new(client: ApiClient, session: SessionTracker, usage: UsageTracker) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                client,
                session,
                usage,
                flow: Mutex::new(Flow {
                    status: AnalyzeStatus::Idle,
                    progress: 0,
                    generation: 0,
                }),
                generations: AtomicU64::new(0),
            }),
        }
    }

    /// Current phase.
    pub fn status(&self) -> AnalyzeStatus {
        self.lock_flow().status
    }

    /// Current simulated progress (0-100).
    pub fn progress(&self) -> u8 {
        self.lock_flow().progress
    }

    /// Run the full two-phase exchange for one validated upload.
    ///
    /// Preconditions are checked synchronously, in order, before any network
    /// activity: re-entrancy guard free, authenticated, advisory usage gate
    /// open. The guard is acquired only once all of them pass and is
    /// released on every exit path.
    pub async fn analyze(
        &self,
        request: AnalyzeRequest,
        events: &mpsc::UnboundedSender<AnalyzeEvent>,
    ) -> Result<AnalysisResult, AnalyzeError> {
        if self.lock_flow().status.in_flight() {
            debug!("Ignoring submission: analysis already in flight");
            return Err(AnalyzeError::Busy);
        }
        if !self.inner.session.is_authenticated() {
            return Err(AnalyzeError::NotAuthenticated);
        }
        if let Some(stats) = self.inner.usage.cached() {
            if !stats.can_generate {
                return Err(AnalyzeError::LimitReached {
                    next_available: stats.next_available,
                });
            }
        }

        let AnalyzeRequest {
            candidate,
            content,
            business_goal,
            audience,
        } = request;

        let mut guard = self.begin_run(events)?;
        let generation = guard.generation;
        let _ticker = self.spawn_ticker(generation, events.clone());

        // The idempotency key is computed over the same bytes the multipart
        // body carries; without it the upload cannot proceed.
        let idempotency_key = sha256_hex(&content);

        self.transition(generation, AnalyzeStatus::Analyzing, events);

        let body = match self
            .inner
            .client
            .analyze(&candidate, content, &idempotency_key)
            .await
        {
            Ok(body) => body,
            Err(ApiError::AuthExpired) => {
                // 401 mid-flow: drop local auth state before reporting.
                self.inner.session.invalidate();
                return Err(AnalyzeError::SessionExpired);
            }
            Err(ApiError::QuotaExceeded { checkout_url }) => {
                return Err(AnalyzeError::QuotaExceeded { checkout_url });
            }
            Err(e) => {
                warn!("Analyze request failed: {}", e);
                return Err(AnalyzeError::Failed(e.to_string()));
            }
        };

        let quick = normalize::quick_analysis_from_value(&body);
        let mut result = quick.result;

        // Phase 2: best-effort AI enrichment, keyed by the server-issued
        // handle. Failure here never fails the run; the result keeps
        // whatever detailed_summary phase 1 embedded.
        if let Some(handle) = quick.upload_handle {
            match self
                .inner
                .client
                .ai_summary(&handle, &business_goal, audience)
                .await
            {
                Ok(summary_body) => {
                    if let Some(summary) = normalize::detailed_summary_from_value(&summary_body) {
                        result.detailed_summary = Some(summary);
                    }
                }
                Err(e) => debug!("AI enrichment unavailable: {}", e),
            }
        } else {
            debug!("No upload handle in quick analysis; skipping enrichment");
        }

        guard.complete();
        info!(
            "Analysis complete: {} rows, {} columns",
            result.profiling.rows, result.profiling.columns
        );

        // The usage count changed server-side as a side effect of the run.
        self.inner.usage.refresh().await;

        Ok(result)
    }

    fn lock_flow(&self) -> std::sync::MutexGuard<'_, Flow> {
        self.inner.flow.lock().expect("flow lock poisoned")
    }

    /// Acquire the re-entrancy guard and enter `uploading`.
    fn begin_run(
        &self,
        events: &mpsc::UnboundedSender<AnalyzeEvent>,
    ) -> Result<RunGuard, AnalyzeError> {
        let mut flow = self.lock_flow();
        if flow.status.in_flight() {
            return Err(AnalyzeError::Busy);
        }
        let generation = self.inner.generations.fetch_add(1, Ordering::SeqCst) + 1;
        flow.status = AnalyzeStatus::Uploading;
        flow.progress = PROGRESS_START;
        flow.generation = generation;
        drop(flow);

        let _ = events.send(AnalyzeEvent::Status(AnalyzeStatus::Uploading));
        let _ = events.send(AnalyzeEvent::Progress(PROGRESS_START));

        Ok(RunGuard {
            service: self.clone(),
            generation,
            events: events.clone(),
            completed: false,
        })
    }

    /// Move to a new phase, if this run is still the current one.
    fn transition(
        &self,
        generation: u64,
        status: AnalyzeStatus,
        events: &mpsc::UnboundedSender<AnalyzeEvent>,
    ) {
        let mut flow = self.lock_flow();
        if flow.generation != generation {
            return;
        }
        flow.status = status;
        drop(flow);
        let _ = events.send(AnalyzeEvent::Status(status));
    }

    /// Spawn the simulated-progress ticker for one run. The returned handle
    /// aborts the task on drop, so a stale timer can never outlive its run.
    fn spawn_ticker(
        &self,
        generation: u64,
        events: mpsc::UnboundedSender<AnalyzeEvent>,
    ) -> ProgressTicker {
        let service = self.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(PROGRESS_TICK);
            // The first tick fires immediately; progress starts stepping one
            // tick after the run begins.
            interval.tick().await;
            loop {
                interval.tick().await;
                if !service.bump_progress(generation, &events) {
                    break;
                }
            }
        });
        ProgressTicker { handle }
    }

    /// One ticker step. Returns false once this run is no longer current.
    fn bump_progress(
        &self,
        generation: u64,
        events: &mpsc::UnboundedSender<AnalyzeEvent>,
    ) -> bool {
        let mut flow = self.lock_flow();
        if flow.generation != generation || !flow.status.in_flight() {
            return false;
        }
        if flow.progress < PROGRESS_PLATEAU {
            flow.progress += PROGRESS_STEP;
            let progress = flow.progress;
            drop(flow);
            let _ = events.send(AnalyzeEvent::Progress(progress));
        }
        true
    }
}

/// RAII release of the re-entrancy guard: unless the run completed, any exit
/// (error return, panic unwind) resets the machine to idle with progress 0.
struct RunGuard {
    service: AnalyzeService,
    generation: u64,
    events: mpsc::UnboundedSender<AnalyzeEvent>,
    completed: bool,
}

impl RunGuard {
    /// Mark the run done: progress 100, state `done`, guard disarmed.
    fn complete(&mut self) {
        let mut flow = self.service.lock_flow();
        if flow.generation == self.generation {
            flow.status = AnalyzeStatus::Done;
            flow.progress = 100;
            drop(flow);
            let _ = self.events.send(AnalyzeEvent::Progress(100));
            let _ = self.events.send(AnalyzeEvent::Status(AnalyzeStatus::Done));
        }
        self.completed = true;
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        let mut flow = self.service.lock_flow();
        if flow.generation != self.generation {
            return;
        }
        flow.status = AnalyzeStatus::Idle;
        flow.progress = 0;
        drop(flow);
        let _ = self.events.send(AnalyzeEvent::Progress(0));
        let _ = self.events.send(AnalyzeEvent::Status(AnalyzeStatus::Idle));
    }
}

/// Scoped handle for the progress timer task.
struct ProgressTicker {
    handle: JoinHandle<()>,
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
