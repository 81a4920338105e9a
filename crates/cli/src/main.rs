//! Reubica CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! reubica-cli migrate
//!
//! # Create an admin account (password from REUBICA_ADMIN_PASSWORD)
//! REUBICA_ADMIN_PASSWORD='...' reubica-cli admin create \
//!     -e admin@reubica.cr -f Ana -l Mora -p 8888-0000
//!
//! # Delete password reset codes that expired more than a day ago
//! reubica-cli tokens purge
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "reubica-cli")]
#[command(author, version, about = "Reubica CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Maintain password reset codes
    Tokens {
        #[command(subcommand)]
        action: TokensAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// First name
        #[arg(short, long)]
        first_name: String,

        /// Last name
        #[arg(short, long)]
        last_name: String,

        /// Phone number (XXXX-XXXX)
        #[arg(short, long)]
        phone: String,
    },
}

#[derive(Subcommand)]
enum TokensAction {
    /// Delete expired reset codes
    Purge,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                first_name,
                last_name,
                phone,
            } => {
                commands::admin::create_user(&email, &first_name, &last_name, &phone).await?;
            }
        },
        Commands::Tokens { action } => match action {
            TokensAction::Purge => commands::tokens::purge().await?,
        },
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_admin_create_flags() {
        let cli = Cli::try_parse_from([
            "reubica-cli",
            "admin",
            "create",
            "-e",
            "admin@reubica.cr",
            "-f",
            "Ana",
            "-l",
            "Mora",
            "-p",
            "8888-0000",
        ])
        .unwrap();

        let Commands::Admin {
            action: AdminAction::Create { email, phone, .. },
        } = cli.command
        else {
            panic!("expected admin create");
        };
        assert_eq!(email, "admin@reubica.cr");
        assert_eq!(phone, "8888-0000");
    }
}
