// ABOUTME: RSVP token server binary wiring configuration, logging, storage and HTTP routes
// ABOUTME: Loads environment configuration, opens the document store and serves until Ctrl-C
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # RSVP Server Binary
//!
//! Starts the guest token API and the admin panel.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rsvp_server::{
    config::{DatabaseUrl, ServerConfig},
    database_plugins::factory::Database,
    logging,
    server::{build_router, run_server, ServerResources},
};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "rsvp-server")]
#[command(about = "RSVP token server - invite status, redirects, guest replies and admin panel")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL (`sqlite:<path>`, `sqlite::memory:` or `memory`)
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle container environments where clap may not work properly
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Argument parsing failed: {e}");
            eprintln!("Using configuration from environment only");
            Args {
                http_port: None,
                database_url: None,
            }
        }
    };

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(url) = args.database_url.as_deref() {
        config.database_url = DatabaseUrl::parse_url(url)?;
    }

    logging::init_from_env()?;

    info!("Starting RSVP token server");
    info!("{}", config.summary());
    if !config.admin.is_configured() {
        warn!("ADMIN_USER/ADMIN_PASS not set; admin endpoints will answer 500");
    }

    if let DatabaseUrl::SQLite { path } = &config.database_url {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let database = Database::new(&config.database_url).await?;
    info!(
        "Database initialized successfully: {}",
        database.backend_info()
    );

    let resources = ServerResources::new(Arc::new(database), &config)?;
    let router = build_router(resources, &config);

    display_available_endpoints(&config);

    if let Err(e) = run_server(router, &config).await {
        error!("Server error: {e:#}");
        return Err(e);
    }

    Ok(())
}

/// Display all available API endpoints
#[allow(clippy::cognitive_complexity)]
fn display_available_endpoints(config: &ServerConfig) {
    let base = format!("http://{}:{}", config.host, config.http_port);

    info!("=== Available API Endpoints ===");
    info!("Guest Tokens:");
    info!("   Token Status:      GET   {base}/v1/token/{{tokenId}}/status");
    info!("   Token Redirect:    GET   {base}/v1/token/{{tokenId}}/resolve");
    info!("   Submit Reply:      POST  {base}/v1/token/{{tokenId}}/reply");
    info!("Admin (Basic Auth):");
    info!("   Admin Panel:       GET   {base}/v1/admin");
    info!("   All Records:       GET   {base}/v1/admin/data");
    info!("   Create Invite:     POST  {base}/v1/admin/invites");
    info!("   Patch Record:      PATCH {base}/v1/admin/{{collection}}/{{id}}");
    info!("Monitoring:");
    info!("   Health:            GET   {base}/health");
    info!("   Readiness:         GET   {base}/ready");
    info!("=== End of Endpoint List ===");
}
