//! Emporium CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! emp-cli migrate
//!
//! # Load the catalog from YAML, replacing what is there
//! emp-cli seed products --file catalog.yaml --clear
//!
//! # Create an admin account
//! emp-cli user create -u boss -e boss@example.com -p 's3cret!' --admin
//! ```
//!
//! All commands read `EMPORIUM_DATABASE_URL` (or `DATABASE_URL`), loading a
//! `.env` file first if present.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "emp-cli")]
#[command(author, version, about = "Emporium CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert products from a YAML file
    Products {
        /// YAML file holding a list of products
        #[arg(short, long)]
        file: PathBuf,

        /// Delete every existing product first
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new account
    Create {
        /// Display name (at least 3 characters)
        #[arg(short, long)]
        username: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (at least 6 characters)
        #[arg(short, long)]
        password: String,

        /// Give the account the admin role
        #[arg(long)]
        admin: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
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
        Commands::Seed { target } => match target {
            SeedTarget::Products { file, clear } => {
                commands::seed::products(&file, clear).await?;
            }
        },
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                email,
                password,
                admin,
            } => {
                commands::user::create(username, email, password, admin).await?;
            }
        },
    }
    Ok(())
}
