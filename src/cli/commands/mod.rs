//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod analyze;
mod auth;
mod init;
mod payments;
mod usage;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Settings;
use crate::models::Audience;

#[derive(Parser)]
#[command(name = "dp")]
#[command(about = "DataPulse - upload a spreadsheet, get an analyzed report")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init,

    /// Upload a spreadsheet/CSV and run the full analysis
    Analyze {
        /// File to analyze (.xls, .xlsx or .csv)
        file: PathBuf,
        /// Business goal guiding the AI summary
        #[arg(long)]
        goal: Option<String>,
        /// Audience the AI summary is written for
        #[arg(long, value_enum)]
        audience: Option<Audience>,
        /// Export the report as a text PDF to this path
        #[arg(long, value_name = "FILE")]
        pdf: Option<PathBuf>,
        /// Print the normalized result as JSON instead of the report view
        #[arg(long)]
        json: bool,
    },

    /// Log in to the DataPulse backend
    Login {
        /// Account email (password read from DATAPULSE_PASSWORD or prompted)
        email: Option<String>,
        /// Use an externally obtained bearer token (federated logins)
        #[arg(long, conflicts_with = "email")]
        token: Option<String>,
        /// Password (prefer the env var over passing this on the command line)
        #[arg(long, env = "DATAPULSE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Log out and clear cached credentials
    Logout,

    /// Show the current session state
    Session,

    /// Show usage and quota state
    Usage,

    /// Payment operations
    Payments {
        #[command(subcommand)]
        command: PaymentCommands,
    },
}

#[derive(Subcommand)]
enum PaymentCommands {
    /// Verify a checkout session after upgrading
    Verify {
        /// Checkout session id from the payment redirect
        session_id: String,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Init => init::cmd_init(&settings),
        Commands::Analyze {
            file,
            goal,
            audience,
            pdf,
            json,
        } => {
            analyze::cmd_analyze(
                &settings,
                &file,
                goal.as_deref(),
                audience,
                pdf.as_deref(),
                json,
            )
            .await
        }
        Commands::Login {
            email,
            token,
            password,
        } => auth::cmd_login(&settings, email.as_deref(), token.as_deref(), password).await,
        Commands::Logout => auth::cmd_logout(&settings).await,
        Commands::Session => auth::cmd_session(&settings).await,
        Commands::Usage => usage::cmd_usage(&settings).await,
        Commands::Payments { command } => match command {
            PaymentCommands::Verify { session_id } => {
                payments::cmd_verify(&settings, &session_id).await
            }
        },
    }
}
