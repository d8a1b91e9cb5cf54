//! Payment verification command.

use console::style;

use crate::client::{ApiClient, CredentialStore};
use crate::auth::SessionTracker;
use crate::config::Settings;

/// Confirm a checkout session after the paywall redirect.
pub async fn cmd_verify(settings: &Settings, session_id: &str) -> anyhow::Result<()> {
    let client = ApiClient::new(settings)?;
    let store = CredentialStore::new(settings.credentials_path());
    let session = SessionTracker::new(client.clone(), store);
    session.resolve().await;

    let verdict = client.verify_payment(session_id).await?;

    // Surface the backend's verdict unchanged.
    let paid = verdict
        .get("paid")
        .and_then(|v| v.as_bool())
        .or_else(|| verdict.get("verified").and_then(|v| v.as_bool()));
    match paid {
        Some(true) => println!("{} Payment confirmed", style("✓").green()),
        Some(false) => println!("{} Payment not confirmed yet", style("!").yellow()),
        None => {}
    }
    if let Some(message) = verdict.get("message").and_then(|v| v.as_str()) {
        println!("  {}", message);
    } else if paid.is_none() {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    }
    Ok(())
}
