// ABOUTME: Command-line tool creating invites with fresh random tokens
// ABOUTME: Writes directly to the configured document store and prints each invite URL
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Invite Generator
//!
//! ```bash
//! DATABASE_URL=sqlite:./data/rsvp.db generate-invites --count 3 --route A
//! ```

use anyhow::{bail, Result};
use chrono::Utc;
use clap::Parser;
use rsvp_server::{
    config::{DatabaseUrl, ServerConfig},
    constants::fields,
    database_plugins::{factory::Database, timestamp_value, AdminStore, CreateOutcome},
    logging,
    models::Document,
    tokens,
};
use serde_json::Value;
use tracing::{info, warn};

/// Attempts per invite before giving up on finding a free token
const MAX_ATTEMPTS: usize = 16;

#[derive(Parser)]
#[command(name = "generate-invites")]
#[command(about = "Create RSVP invites with random six character tokens")]
struct Args {
    /// Number of invites to create
    #[arg(long, default_value_t = 1)]
    count: usize,

    /// Guest name stored on every created invite
    #[arg(long)]
    guest_name: Option<String>,

    /// Invite route stored on every created invite
    #[arg(long)]
    route: Option<String>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(url) = args.database_url.as_deref() {
        config.database_url = DatabaseUrl::parse_url(url)?;
    }
    if config.database_url.is_ephemeral() {
        warn!("{} is not persisted; invites vanish on exit", config.database_url);
    }

    let database = Database::new(&config.database_url).await?;
    info!("Creating {} invite(s) in {}", args.count, database.backend_info());

    for _ in 0..args.count {
        let token = create_invite(&database, &args).await?;
        println!(
            "{token}\t{}",
            tokens::build_invite_url(&config.invite_base_url, &token)
        );
    }

    Ok(())
}

/// Store one invite under a fresh token, retrying on collision
async fn create_invite(database: &Database, args: &Args) -> Result<String> {
    for _ in 0..MAX_ATTEMPTS {
        let token = tokens::generate_token();

        let mut document = Document::new();
        document.insert(fields::TOKEN.to_owned(), Value::String(token.clone()));
        if let Some(name) = &args.guest_name {
            document.insert(fields::GUEST_NAME.to_owned(), Value::String(name.clone()));
        }
        if let Some(route) = &args.route {
            document.insert(fields::ROUTE.to_owned(), Value::String(route.clone()));
        }
        document.insert(fields::CREATED_AT.to_owned(), timestamp_value(Utc::now())?);
        document.insert(fields::USED_AT.to_owned(), Value::Null);

        match database.create_invite(&token, document).await? {
            CreateOutcome::Created => return Ok(token),
            CreateOutcome::AlreadyExists => warn!(token = %token, "Token collision, retrying"),
        }
    }
    bail!("No free token found after {MAX_ATTEMPTS} attempts")
}
