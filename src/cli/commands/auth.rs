//! Login, logout and session commands.

use std::io::{BufRead, Write};

use console::style;

use crate::auth::{AuthState, SessionTracker};
use crate::client::{ApiClient, CredentialStore};
use crate::config::Settings;

fn tracker(settings: &Settings) -> anyhow::Result<SessionTracker> {
    let client = ApiClient::new(settings)?;
    let store = CredentialStore::new(settings.credentials_path());
    Ok(SessionTracker::new(client, store))
}

/// Log in with email/password or an externally obtained token.
pub async fn cmd_login(
    settings: &Settings,
    email: Option<&str>,
    token: Option<&str>,
    password: Option<String>,
) -> anyhow::Result<()> {
    let tracker = tracker(settings)?;

    if let Some(token) = token {
        let session = tracker.login_with_token(token).await?;
        println!(
            "{} Token accepted{}",
            style("✓").green(),
            session
                .user_id
                .as_deref()
                .map(|id| format!(" for {}", id))
                .unwrap_or_default()
        );
        return Ok(());
    }

    let Some(email) = email else {
        anyhow::bail!("Provide an email, or --token for federated logins");
    };

    let password = match password {
        Some(password) => password,
        None => prompt_password()?,
    };

    let session = tracker.login(email, &password).await?;
    println!(
        "{} Logged in as {}",
        style("✓").green(),
        session.user_id.as_deref().unwrap_or(email)
    );
    if session.premium == Some(true) {
        println!("  {}", style("Premium account").cyan());
    }
    Ok(())
}

/// Log out and clear the cached credentials.
pub async fn cmd_logout(settings: &Settings) -> anyhow::Result<()> {
    let tracker = tracker(settings)?;
    tracker.logout().await;
    println!("{} Logged out", style("✓").green());
    Ok(())
}

/// Show the resolved session state.
pub async fn cmd_session(settings: &Settings) -> anyhow::Result<()> {
    let tracker = tracker(settings)?;
    match tracker.resolve().await {
        AuthState::Authenticated(session) => {
            println!("{} Authenticated", style("✓").green());
            if let Some(user) = &session.user_id {
                println!("  {:<12} {}", "User", user);
            }
            if let Some(id) = &session.session_id {
                println!("  {:<12} {}", "Session", id);
            }
            if session.premium == Some(true) {
                println!("  {:<12} {}", "Plan", style("premium").cyan());
            }
        }
        _ => {
            println!("{} Not authenticated", style("✗").red());
            println!("  Run 'dp login <email>' to log in");
        }
    }
    Ok(())
}

fn prompt_password() -> anyhow::Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\n', '\r']).to_string();
    if password.is_empty() {
        anyhow::bail!("Empty password");
    }
    Ok(password)
}
