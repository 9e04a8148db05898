// ABOUTME: Main library entry point for the RSVP token server
// ABOUTME: Wires token lifecycle, storage, rate limiting and admin access into an HTTP service
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # RSVP Token Server
//!
//! Backend for a single event website. Guests receive a six character
//! token, check its status, get redirected based on validity and submit an
//! RSVP exactly once. An administrator manages invite and response records
//! behind HTTP Basic authentication.
//!
//! ## Architecture
//!
//! - **Storage**: document store backends (in-memory, `SQLite`) behind the
//!   `InviteStore` and `AdminStore` capabilities
//! - **Lifecycle**: token status, redirect resolution and the reply transaction
//! - **Rate limiting**: fixed-window counters guarding the reply endpoint
//! - **Admin**: credential check and the bulk list/create/patch escape hatch
//! - **Routes**: thin axum handlers translating HTTP into the above
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use rsvp_server::config::environment::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("RSVP server configured on port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Admin credential check and record management
pub mod admin;

/// Configuration loaded from the environment
pub mod config;

/// Document store capabilities and backends
pub mod database_plugins;

/// Unified error handling, re-exported from the core crate
pub mod errors;

/// Token lifecycle engine
pub mod lifecycle;

/// Structured logging setup
pub mod logging;

/// HTTP middleware: rate limiting, admin guard, CORS and request tracing
pub mod middleware;

/// Fixed-window rate limiter
pub mod rate_limiting;

/// HTTP route handlers
pub mod routes;

/// Router assembly and server startup
pub mod server;

pub use rsvp_core::{constants, models, payload, tokens};
