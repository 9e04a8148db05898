// ABOUTME: Route module organization for the RSVP token server HTTP endpoints
// ABOUTME: Groups guest token routes, admin routes and health checks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Route module for the RSVP token server
//!
//! Each domain module contains only route definitions and thin handlers
//! that delegate to the lifecycle engine or the admin service.

/// Admin record browser and record operations
pub mod admin;
/// Health check and readiness routes
pub mod health;
/// Guest token status, redirect and reply routes
pub mod tokens;

/// Admin route handlers
pub use admin::AdminRoutes;
/// Health route handlers
pub use health::HealthRoutes;
/// Token route handlers
pub use tokens::TokenRoutes;
