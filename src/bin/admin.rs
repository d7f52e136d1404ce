//! CLI administration tool for slug-shortener.
//!
//! Provides commands for generating shortening keys, previewing slugs, and
//! inspecting or seeding records without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Generate a new shortening key
//! cargo run --bin admin -- key generate
//!
//! # Show the slug candidates for a URL
//! cargo run --bin admin -- slug derive https://example.com --tries 3
//!
//! # Look up or write a record
//! cargo run --bin admin -- record get Xk3pQ9a
//! cargo run --bin admin -- record put Xk3pQ9a https://example.com
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`: PostgreSQL connection string (record and db commands)
//! - `SHORTENING_KEY`, `SLUG_ALPHABET`, `SLUG_LENGTH`: slug commands

use slug_shortener::domain::{RecordStore, StoreError};
use slug_shortener::infrastructure::store::PgRecordStore;
use slug_shortener::shortening::{DEFAULT_ALPHABET, DEFAULT_SLUG_LENGTH, ShorteningKey, SlugCodec};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing slug-shortener.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage shortening keys
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Inspect slug derivation
    Slug {
        #[command(subcommand)]
        action: SlugAction,
    },

    /// Read and write records
    Record {
        #[command(subcommand)]
        action: RecordAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum KeyAction {
    /// Generate a random 256-bit key
    Generate {
        /// Print only the hex key
        #[arg(long)]
        raw: bool,
    },
}

#[derive(Subcommand)]
enum SlugAction {
    /// Show the candidate slugs for a URL, in the order they are tried
    Derive {
        long_url: String,

        /// Number of candidates to show
        #[arg(short, long, default_value_t = 1)]
        tries: u32,
    },
}

#[derive(Subcommand)]
enum RecordAction {
    /// Print the long URL stored under a slug
    Get { slug: String },

    /// Store a long URL under a slug, overwriting any existing record
    Put {
        slug: String,
        long_url: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Key { action } => handle_key_action(action)?,
        Commands::Slug { action } => handle_slug_action(action)?,
        Commands::Record { action } => handle_record_action(action, &connect().await?).await?,
        Commands::Db { action } => handle_db_action(action, &connect().await?).await?,
    }

    Ok(())
}

async fn connect() -> Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")
}

fn handle_key_action(action: KeyAction) -> Result<()> {
    match action {
        KeyAction::Generate { raw } => {
            let mut key = [0u8; 32];
            getrandom::fill(&mut key)
                .map_err(|e| anyhow::anyhow!("Failed to generate random bytes: {e}"))?;
            let hex_key = hex::encode(key);

            if raw {
                println!("{hex_key}");
                return Ok(());
            }

            println!("{}", "Generated shortening key".bright_blue().bold());
            println!();
            println!("  {}={}", "SHORTENING_KEY".bright_cyan(), hex_key.bright_yellow());
            println!();
            println!(
                "{}",
                "Changing the key changes every slug minted afterwards."
                    .yellow()
            );
        }
    }

    Ok(())
}

/// Builds the codec from the same variables the server reads.
fn codec_from_env() -> Result<SlugCodec> {
    let key_hex = std::env::var("SHORTENING_KEY").context("SHORTENING_KEY must be set")?;
    let key = ShorteningKey::from_hex(key_hex.trim())?;
    let alphabet = std::env::var("SLUG_ALPHABET").unwrap_or_else(|_| DEFAULT_ALPHABET.to_string());
    let length = match std::env::var("SLUG_LENGTH") {
        Ok(v) => v.trim().parse().context("SLUG_LENGTH must be a number")?,
        Err(_) => DEFAULT_SLUG_LENGTH,
    };

    Ok(SlugCodec::new(key, &alphabet, length)?)
}

fn handle_slug_action(action: SlugAction) -> Result<()> {
    match action {
        SlugAction::Derive { long_url, tries } => {
            let codec = codec_from_env()?;

            println!("{}", "Slug candidates".bright_blue().bold());
            println!("  URL: {}", long_url.cyan());
            println!(
                "  {} hash windows per key",
                codec.windows().to_string().bright_white()
            );
            println!();

            for retry_index in 0..tries.max(1) {
                match codec.derive(&long_url, retry_index) {
                    Ok(slug) => println!(
                        "  {:<3} {}",
                        retry_index.to_string().bright_black(),
                        slug.bright_yellow()
                    ),
                    Err(e) => {
                        println!("  {:<3} {}", retry_index.to_string().bright_black(), e.to_string().red());
                        break;
                    }
                }
            }
            println!();
        }
    }

    Ok(())
}

async fn handle_record_action(action: RecordAction, pool: &PgPool) -> Result<()> {
    let store = PgRecordStore::new(Arc::new(pool.clone()));

    match action {
        RecordAction::Get { slug } => match store.get(&slug).await {
            Ok(long_url) => println!("  {} -> {}", slug.cyan(), long_url.bright_white()),
            Err(StoreError::NotFound) => println!("{}", "  No record for this slug".yellow()),
            Err(e) => anyhow::bail!("Lookup failed: {e}"),
        },
        RecordAction::Put {
            slug,
            long_url,
            yes,
        } => {
            if let Ok(existing) = store.get(&slug).await {
                println!("  Current: {}", existing.bright_black());
            }
            println!("  New:     {} -> {}", slug.cyan(), long_url.bright_white());
            println!();

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt("Write this record?")
                    .default(false)
                    .interact()?;

                if !confirmed {
                    println!("{}", "Cancelled".red());
                    return Ok(());
                }
            }

            store
                .put(&slug, &long_url)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to write record: {e}"))?;
            println!("{}", "Record written".green().bold());
        }
    }

    Ok(())
}

/// Dispatches database operation commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "Checking database connection...".bright_blue());

            let store = PgRecordStore::new(Arc::new(pool.clone()));
            if !store.health_check().await {
                anyhow::bail!("Database did not answer");
            }

            let records: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM short_urls")
                .fetch_one(pool)
                .await
                .context("Failed to count records (are migrations applied?)")?;

            println!("{}", "Database connection OK".green().bold());
            println!("  Records: {}", records.to_string().bright_white());
        }
    }

    Ok(())
}
