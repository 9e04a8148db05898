// ABOUTME: HTTP server assembly: shared resources, router composition and startup
// ABOUTME: Mounts token and admin routes under /v1 with tracing, request ids, CORS and body limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Server
//!
//! [`ServerResources`] is built once at startup from an injected store and
//! the loaded configuration; [`build_router`] turns it into the complete
//! axum application.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{info, warn};

use crate::admin::{AdminAuthService, AdminService};
use crate::config::ServerConfig;
use crate::database_plugins::{AdminStore, InviteStore};
use crate::lifecycle::TokenLifecycleEngine;
use crate::middleware::{
    rate_limiting::RateLimitLayerState,
    setup_cors,
    tracing::{propagate_request_id_layer, set_request_id_layer, trace_layer},
};
use crate::rate_limiting::FixedWindowRateLimiter;
use crate::routes::{AdminRoutes, HealthRoutes, TokenRoutes};

/// Key prefix for reply rate limit counters
const REPLY_RATE_LIMIT_PREFIX: &str = "reply";

/// Everything the request handlers share
#[derive(Clone)]
pub struct ServerResources {
    /// Token status, redirect and reply logic
    pub engine: TokenLifecycleEngine,
    /// Admin record operations
    pub admin: AdminService,
    /// Admin credential check
    pub admin_auth: AdminAuthService,
    /// Reply rate limiter
    pub reply_limiter: Arc<FixedWindowRateLimiter>,
}

impl ServerResources {
    /// Build resources over a store implementing both capabilities
    ///
    /// Must be called inside a Tokio runtime; the rate limiter starts its
    /// sweep task here.
    ///
    /// # Errors
    ///
    /// Returns an error if the rate limit configuration is out of range
    pub fn new<S>(store: Arc<S>, config: &ServerConfig) -> Result<Self>
    where
        S: InviteStore + AdminStore + 'static,
    {
        let reply_limiter = FixedWindowRateLimiter::from_config(&config.reply.rate_limit)
            .context("Invalid reply rate limit configuration")?;

        Ok(Self {
            engine: TokenLifecycleEngine::new(
                store.clone(),
                config.redirects.clone(),
                config.reply.allowed_fields.clone(),
            ),
            admin: AdminService::new(store),
            admin_auth: AdminAuthService::new(config.admin.clone()),
            reply_limiter: Arc::new(reply_limiter),
        })
    }
}

/// Assemble the complete application router
pub fn build_router(resources: ServerResources, config: &ServerConfig) -> Router {
    let rate_limit = RateLimitLayerState {
        limiter: resources.reply_limiter,
        prefix: REPLY_RATE_LIMIT_PREFIX,
    };

    let api = Router::new()
        .merge(TokenRoutes::routes(resources.engine, rate_limit))
        .merge(AdminRoutes::routes(resources.admin, resources.admin_auth));

    Router::new()
        .nest("/v1", api)
        .merge(HealthRoutes::routes())
        .layer(RequestBodyLimitLayer::new(config.max_request_body_bytes))
        .layer(setup_cors(&config.cors))
        .layer(propagate_request_id_layer())
        .layer(trace_layer())
        .layer(set_request_id_layer())
}

/// Bind the configured address and serve until Ctrl-C
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails
pub async fn run_server(router: Router, config: &ServerConfig) -> Result<()> {
    let address = format!("{}:{}", config.host, config.http_port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("RSVP server listening on http://{address}");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("HTTP server error")?;

    info!("RSVP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections");
}
