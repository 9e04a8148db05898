// ABOUTME: Admin module organization and exports
// ABOUTME: Basic-Auth credential check plus the record management operations it gates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//! Admin Access
//!
//! The administrator authenticates with HTTP Basic credentials taken from
//! the environment. A successful check yields an [`AdminPrincipal`], which
//! every [`AdminService`] operation requires.

/// Admin authentication service
pub mod auth;
/// Admin record operations
pub mod service;

pub use auth::{AdminAuthService, AdminPrincipal, AuthFailure};
pub use service::{AdminService, AdminSnapshot};
