//! Usage/quota command.

use console::style;

use crate::client::{ApiClient, ApiError, CredentialStore};
use crate::auth::SessionTracker;
use crate::config::Settings;

/// Show the caller's usage and quota state.
pub async fn cmd_usage(settings: &Settings) -> anyhow::Result<()> {
    let client = ApiClient::new(settings)?;
    let store = CredentialStore::new(settings.credentials_path());
    let session = SessionTracker::new(client.clone(), store);

    if !session.resolve().await.is_authenticated() {
        eprintln!("{} Not authenticated. Run 'dp login <email>' first.", style("✗").red());
        std::process::exit(1);
    }

    match client.usage().await {
        Ok(stats) => {
            println!("\n{}", style("Usage").bold());
            println!("{}", "-".repeat(50));
            if stats.is_premium {
                println!("  {:<16} {}", "Plan", style("premium").cyan());
                println!("  {:<16} unlimited", "Reports");
            } else {
                println!("  {:<16} free", "Plan");
                println!(
                    "  {:<16} {}/{} today",
                    "Reports",
                    stats.today_used,
                    stats.daily_limit
                );
            }
            let gate = if stats.can_generate {
                style("yes").green()
            } else {
                style("no").red()
            };
            println!("  {:<16} {}", "Can generate", gate);
            if let Some(next) = stats.next_available {
                println!(
                    "  {:<16} {}",
                    "Next available",
                    next.format("%Y-%m-%d %H:%M UTC")
                );
            }
            if let Some(reason) = &stats.reason {
                println!("  {:<16} {}", "Reason", style(reason).dim());
            }
            Ok(())
        }
        Err(ApiError::AuthExpired) => {
            session.invalidate();
            eprintln!(
                "{} Your session has expired. Please log in again.",
                style("✗").red()
            );
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
