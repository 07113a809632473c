//! dein.shop CLI - Database migrations and maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! ds-cli migrate
//!
//! # Create an admin account (password from DS_ADMIN_PASSWORD)
//! ds-cli admin create -u jana -e jana@dein.shop --owner
//!
//! # Delete expired login sessions
//! ds-cli sessions prune
//! ```
//!
//! Every command reads the database location from `--database-url` or
//! `DATABASE_URL`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use secrecy::SecretString;

mod commands;

#[derive(Parser)]
#[command(name = "ds-cli")]
#[command(author, version, about = "dein.shop CLI tools")]
struct Cli {
    /// `SQLite` database URL
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://deinshop.db", global = true)]
    database_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Maintain login sessions
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Login name (3-50 characters)
        #[arg(short, long)]
        username: String,

        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Password (at least 8 characters)
        #[arg(long, env = "DS_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,

        /// Allow this admin to manage other admins
        #[arg(long)]
        owner: bool,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Delete sessions past their expiry
    Prune,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = SecretString::from(cli.database_url);
    match cli.command {
        Commands::Migrate => commands::migrate::run(&database_url).await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                username,
                email,
                password,
                owner,
            } => {
                commands::admin::create_user(&database_url, &username, &email, password, owner)
                    .await?;
            }
        },
        Commands::Sessions { action } => match action {
            SessionAction::Prune => {
                commands::sessions::prune(&database_url).await?;
            }
        },
    }
    Ok(())
}
