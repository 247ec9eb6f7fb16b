//! Funda CLI - Table setup and data management tools.
//!
//! # Usage
//!
//! ```bash
//! # Create every table (prints the SQL when the store cannot run it)
//! funda setup all
//!
//! # Insert the dummy rows for one table
//! funda seed cases
//!
//! # Print the CREATE TABLE statement
//! funda sql tracking
//!
//! # Print aggregate stats as JSON
//! funda stats users
//!
//! # Run against an in-process store instead of FUNDA_STORE
//! funda --memory seed mails
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use clap::{Parser, Subcommand};
use funda_core::EntityKind;
use funda_store::{Store, StoreBackend, StoreConfig};

mod commands;

use commands::{CliError, Target};

#[derive(Parser)]
#[command(name = "funda")]
#[command(author, version, about = "Funda CLI tools")]
struct Cli {
    /// Use an empty in-process store (all tables created) instead of `FUNDA_STORE`
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a table, or every table with `all`
    Setup {
        /// cases, mails, users, tracking or all
        target: Target,
    },
    /// Insert the dummy rows for a table
    Seed {
        /// cases, mails, users or tracking
        entity: EntityKind,
    },
    /// Print the CREATE TABLE statement for a table, or every table with `all`
    Sql {
        /// cases, mails, users, tracking or all
        target: Target,
    },
    /// Print aggregate stats for a table as JSON
    Stats {
        /// cases, mails, users or tracking
        entity: EntityKind,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "funda_cli=info,funda_store=warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let memory = cli.memory;
    match cli.command {
        Commands::Sql { target } => {
            commands::sql::print(target);
            Ok(())
        }
        Commands::Setup { target } => commands::setup::run(connect(memory).await?, target).await,
        Commands::Seed { entity } => commands::seed::run(connect(memory).await?, entity).await,
        Commands::Stats { entity } => commands::stats::run(connect(memory).await?, entity).await,
    }
}

async fn connect(memory: bool) -> Result<Arc<dyn Store>, CliError> {
    let config = if memory {
        StoreConfig::for_backend(StoreBackend::Memory)?
    } else {
        StoreConfig::from_env()?
    };
    tracing::debug!(backend = ?config.backend(), "connecting");
    Ok(config.connect().await?)
}
