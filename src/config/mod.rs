// ABOUTME: Configuration management module for server settings
// ABOUTME: Environment-driven settings for redirects, admin access, storage and rate limiting
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration module for the RSVP server
//!
//! All settings come from environment variables; nothing the lifecycle
//! engine or admin controller depends on is hardcoded.

/// Environment and server configuration
pub mod environment;

pub use environment::{
    AdminCredentials, CorsConfig, DatabaseUrl, Environment, LogLevel, RateLimitConfig,
    RedirectConfig, ReplyConfig, ServerConfig,
};
