//! Shopfront CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! shop-cli migrate
//!
//! # Create an admin account
//! shop-cli user create -e admin@example.com -n "Admin Name" -p "long-password" -r admin
//!
//! # Change an existing account's role
//! shop-cli user promote -e someone@example.com
//!
//! # Load catalog products
//! shop-cli seed products crates/cli/seeds/products.yaml
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user create` / `user promote` - Bootstrap and manage accounts
//! - `seed products` - Insert products from a YAML file

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "shop-cli")]
#[command(author, version, about = "Shopfront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new account
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,

        /// Role (`user`, `admin`)
        #[arg(short, long, default_value = "user")]
        role: String,
    },
    /// Change the role of an existing account
    Promote {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// New role (`user`, `admin`)
        #[arg(short, long, default_value = "admin")]
        role: String,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert catalog products from a YAML file, skipping existing names
    Products {
        /// Path to the YAML file
        file: String,
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
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                name,
                password,
                role,
            } => {
                commands::user::create(&email, &name, &password, &role).await?;
            }
            UserAction::Promote { email, role } => {
                commands::user::promote(&email, &role).await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Products { file } => {
                commands::seed::products(&file).await?;
            }
        },
    }
    Ok(())
}
