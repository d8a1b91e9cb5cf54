//! Upload-and-analyze command.

use std::fs;
use std::path::Path;

use console::style;
use tokio::sync::mpsc;

use crate::analyze::{AnalyzeError, AnalyzeRequest, AnalyzeService};
use crate::auth::SessionTracker;
use crate::cli::AnalyzeProgress;
use crate::client::{ApiClient, CredentialStore};
use crate::config::Settings;
use crate::models::Audience;
use crate::report;
use crate::usage::UsageTracker;
use crate::utils::{candidate_from_path, format_size, validate_candidate};

/// Run the full analyze flow for one file.
pub async fn cmd_analyze(
    settings: &Settings,
    file: &Path,
    goal: Option<&str>,
    audience: Option<Audience>,
    pdf: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    // Acceptance gate first: a rejected file never causes a network call.
    let metadata = fs::metadata(file)
        .map_err(|e| anyhow::anyhow!("Cannot read '{}': {}", file.display(), e))?;
    let candidate = candidate_from_path(file, metadata.len());
    if let Err(e) = validate_candidate(&candidate) {
        eprintln!("{} {}", style("✗").red(), e);
        std::process::exit(1);
    }
    let content = fs::read(file)?;

    println!(
        "{} {} ({})",
        style("→").cyan(),
        candidate.name,
        format_size(candidate.size)
    );

    let client = ApiClient::new(settings)?;
    let store = CredentialStore::new(settings.credentials_path());
    let session = SessionTracker::new(client.clone(), store);

    if !session.resolve().await.is_authenticated() {
        eprintln!(
            "{} Please log in first to generate a report: dp login <email>",
            style("✗").red()
        );
        std::process::exit(1);
    }

    // Advisory usage gate; the backend's 402 stays authoritative.
    let usage = UsageTracker::new(client.clone());
    let stats = usage.refresh().await;
    if !stats.can_generate {
        eprintln!(
            "{} Daily report limit reached ({}/{} used).",
            style("✗").red(),
            stats.today_used,
            stats.daily_limit
        );
        if let Some(next) = stats.next_available {
            eprintln!(
                "  Next report available {}",
                next.format("%Y-%m-%d %H:%M UTC")
            );
        }
        if let Some(reason) = &stats.reason {
            eprintln!("  {}", style(reason).dim());
        }
        std::process::exit(1);
    }

    let service = AnalyzeService::new(client.clone(), session.clone(), usage.clone());
    let request = AnalyzeRequest {
        candidate,
        content,
        business_goal: goal.unwrap_or(&settings.business_goal).to_string(),
        audience: audience.unwrap_or(settings.audience),
    };

    // The orchestrator emits events; this layer only renders them.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let progress = AnalyzeProgress::new();
    let display = progress.clone();
    let ui = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            display.handle(&event);
        }
    });

    let outcome = service.analyze(request, &event_tx).await;
    drop(event_tx);
    let _ = ui.await;
    progress.finish(outcome.is_ok());

    match outcome {
        Ok(result) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                report::print_result(&result);
            }
            if let Some(pdf_path) = pdf {
                report::export_pdf(&result, pdf_path)?;
            }
            if let Some(stats) = usage.cached() {
                if stats.daily_limit > 0 {
                    println!(
                        "\n  {} {}/{} reports used today",
                        style("→").dim(),
                        stats.today_used,
                        stats.daily_limit
                    );
                }
            }
            Ok(())
        }
        Err(AnalyzeError::QuotaExceeded { checkout_url }) => {
            // The authoritative paywall. A checkout URL is the CLI
            // equivalent of the browser redirect: print it prominently.
            match checkout_url {
                Some(url) => {
                    eprintln!(
                        "{} You've used your free report. Complete your upgrade here:",
                        style("!").yellow()
                    );
                    eprintln!("  {}", style(&url).cyan().underlined());
                    eprintln!("  Afterwards, confirm with: dp payments verify <session_id>");
                }
                None => {
                    eprintln!(
                        "{} You've used your free report. Please upgrade to continue.",
                        style("!").yellow()
                    );
                }
            }
            std::process::exit(1);
        }
        Err(AnalyzeError::SessionExpired) => {
            eprintln!(
                "{} Your session has expired. Please log in again: dp login <email>",
                style("✗").red()
            );
            std::process::exit(1);
        }
        Err(e @ AnalyzeError::NotAuthenticated) | Err(e @ AnalyzeError::LimitReached { .. }) => {
            eprintln!("{} {}", style("✗").red(), e);
            std::process::exit(1);
        }
        Err(AnalyzeError::Busy) => {
            // A second submission while one is in flight is a no-op.
            Ok(())
        }
        Err(AnalyzeError::Failed(detail)) => {
            tracing::warn!("Analysis failed: {}", detail);
            eprintln!(
                "{} Analysis failed. Check your network connection and try again.",
                style("✗").red()
            );
            if is_verbose_detail(&detail) {
                eprintln!("  {}", style(&detail).dim());
            }
            std::process::exit(1);
        }
    }
}

/// Show backend detail only when it is short enough to be useful.
fn is_verbose_detail(detail: &str) -> bool {
    !detail.is_empty() && detail.len() <= 200
}
