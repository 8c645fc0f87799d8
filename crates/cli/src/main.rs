//! Contraentrega CO CLI - database migrations and catalog tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! ce-cli migrate
//!
//! # Load products from a YAML file
//! ce-cli seed catalog.yaml
//!
//! # Print an argon2 hash for ADMIN_PASSWORD_HASH
//! ce-cli hash-password
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ce-cli")]
#[command(author, version, about = "Contraentrega CO CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Upsert products from a YAML file into the durable catalog
    Seed {
        /// Path to the YAML file
        file: String,

        /// Validate the file without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Hash an admin password read from stdin
    HashPassword,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed { file, dry_run } => commands::seed::products(&file, dry_run).await?,
        Commands::HashPassword => commands::password::hash_from_stdin()?,
    }
    Ok(())
}
