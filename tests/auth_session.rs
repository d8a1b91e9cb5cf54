//! Session tracker and usage tracker tests against the mock backend.

mod common;

use std::time::Duration;

use serde_json::json;

use datapulse::auth::SessionTracker;
use datapulse::client::{ApiClient, CredentialStore, Credentials};
use datapulse::config::Settings;
use datapulse::usage::UsageTracker;

use common::{test_settings, MockBackend};

fn store_for(settings: &Settings) -> CredentialStore {
    CredentialStore::new(settings.credentials_path())
}

#[tokio::test]
async fn login_resolves_to_authenticated() {
    let mock = MockBackend::new();
    let base = mock.clone().spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let settings = test_settings(&base, dir.path());

    let client = ApiClient::new(&settings).unwrap();
    let tracker = SessionTracker::new(client.clone(), store_for(&settings));

    let session = tracker.login("ana@example.com", "correct horse").await.unwrap();
    assert!(session.authenticated);
    assert_eq!(session.user_id.as_deref(), Some("ana@example.com"));
    assert!(tracker.is_authenticated());
    // The backend set a session cookie on login.
    assert!(client.has_session_cookie());
}

#[tokio::test]
async fn login_with_wrong_password_fails() {
    let mock = MockBackend::new();
    let base = mock.clone().spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let settings = test_settings(&base, dir.path());

    let client = ApiClient::new(&settings).unwrap();
    let tracker = SessionTracker::new(client, store_for(&settings));

    assert!(tracker.login("ana@example.com", "wrong").await.is_err());
    assert!(!tracker.is_authenticated());
}

#[tokio::test]
async fn cached_token_authenticates_without_reaching_backend() {
    // Point at a dead address: the cached-token fast path must not need a
    // round-trip, and the background refresh failing must not flip state.
    let dir = tempfile::tempdir().unwrap();
    let settings = test_settings("http://127.0.0.1:9", dir.path());

    let store = store_for(&settings);
    store
        .save(&Credentials {
            authenticated: true,
            token: Some("tok-cached".to_string()),
            user_id: Some("u1".to_string()),
            session_id: None,
        })
        .unwrap();

    let client = ApiClient::new(&settings).unwrap();
    let tracker = SessionTracker::new(client.clone(), store);

    let state = tracker.resolve().await;
    assert!(state.is_authenticated());
    assert_eq!(client.token().as_deref(), Some("tok-cached"));
}

#[tokio::test]
async fn cookie_race_retries_once_before_giving_up() {
    let mock = MockBackend::new();
    // First answer: not authenticated (the federated redirect has not
    // propagated). Second answer: authenticated.
    mock.queue_session(vec![
        (200, Some(json!({"authenticated": false}))),
        (200, Some(json!({"authenticated": true, "user_id": "u1"}))),
    ]);
    let base = mock.clone().spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let settings = test_settings(&base, dir.path());

    let client = ApiClient::new(&settings).unwrap();
    let tracker = SessionTracker::new(client, store_for(&settings))
        .with_retry_delay(Duration::from_millis(20));

    // start_session sets the cookie, making the retry path eligible.
    let state = tracker.resolve().await;
    assert!(state.is_authenticated());
    assert_eq!(mock.session_hits.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[tokio::test]
async fn definitive_unauthenticated_answer_ends_checking() {
    let mock = MockBackend::new();
    mock.set_session(200, Some(json!({"authenticated": false})));
    let base = mock.clone().spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let settings = test_settings(&base, dir.path());

    let client = ApiClient::new(&settings).unwrap();
    let tracker = SessionTracker::new(client, store_for(&settings))
        .with_retry_delay(Duration::from_millis(20));

    let state = tracker.resolve().await;
    assert!(!state.is_authenticated());
}

#[tokio::test]
async fn logout_clears_cached_credentials() {
    let mock = MockBackend::new();
    let base = mock.clone().spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let settings = test_settings(&base, dir.path());

    let client = ApiClient::new(&settings).unwrap();
    let store = store_for(&settings);
    let tracker = SessionTracker::new(client.clone(), store.clone());

    tracker.login("ana@example.com", "correct horse").await.unwrap();
    assert!(store.load().is_some());

    tracker.logout().await;
    assert!(store.load().is_none());
    assert!(!tracker.is_authenticated());
    assert!(client.token().is_none());
}

#[tokio::test]
async fn token_login_verifies_against_backend() {
    let mock = MockBackend::new();
    mock.set_session(
        200,
        Some(json!({"authenticated": true, "user_id": "federated-user"})),
    );
    let base = mock.clone().spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let settings = test_settings(&base, dir.path());

    let client = ApiClient::new(&settings).unwrap();
    let tracker = SessionTracker::new(client.clone(), store_for(&settings));

    let session = tracker.login_with_token("tok-ext").await.unwrap();
    assert!(session.authenticated);
    assert!(tracker.is_authenticated());
    // The token rides along on the verification call.
    assert_eq!(mock.last_bearer.lock().unwrap().as_deref(), Some("tok-ext"));
}

#[tokio::test]
async fn rejected_token_is_not_kept() {
    let mock = MockBackend::new();
    mock.set_session(200, Some(json!({"authenticated": false})));
    let base = mock.clone().spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let settings = test_settings(&base, dir.path());

    let client = ApiClient::new(&settings).unwrap();
    let store = store_for(&settings);
    let tracker = SessionTracker::new(client.clone(), store.clone());

    assert!(tracker.login_with_token("tok-bad").await.is_err());
    assert!(!tracker.is_authenticated());
    assert!(store.load().is_none());
    assert!(client.token().is_none());
}

#[tokio::test]
async fn usage_fetch_failure_falls_back_permissive() {
    let dir = tempfile::tempdir().unwrap();
    let settings = test_settings("http://127.0.0.1:9", dir.path());

    let client = ApiClient::new(&settings).unwrap();
    let tracker = UsageTracker::new(client);

    let stats = tracker.refresh().await;
    assert!(stats.can_generate);
    assert!(!stats.is_premium);
}

#[tokio::test]
async fn usage_stats_parse_from_backend() {
    let mock = MockBackend::new();
    mock.set_usage(
        200,
        Some(json!({
            "today_used": 2,
            "daily_limit": 3,
            "can_generate": true,
            "is_premium": false,
            "next_available": "2026-08-07T09:30:00Z",
            "reason": "within_limit"
        })),
    );
    let base = mock.clone().spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let settings = test_settings(&base, dir.path());

    let client = ApiClient::new(&settings).unwrap();
    let tracker = UsageTracker::new(client);

    let stats = tracker.refresh().await;
    assert_eq!(stats.today_used, 2);
    assert_eq!(stats.daily_limit, 3);
    assert!(stats.can_generate);
    assert!(stats.next_available.is_some());
    assert_eq!(stats.reason.as_deref(), Some("within_limit"));
    assert_eq!(tracker.cached().unwrap().today_used, 2);
}
