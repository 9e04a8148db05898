// ABOUTME: Admin authentication via HTTP Basic credentials checked in constant time
// ABOUTME: Mints AdminPrincipal values, the only key to admin record operations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//! Admin Authentication
//!
//! Credential check order:
//!
//! 1. missing or non-`Basic` `Authorization` header, or undecodable
//!    credentials: 401 "Authentication required"
//! 2. server has no admin username/password configured: 500 (fail closed)
//! 3. username or password mismatch: 401 "Invalid credentials"

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use subtle::ConstantTimeEq;
use tracing::error;

use rsvp_core::constants::messages;

use crate::config::AdminCredentials;
use crate::errors::{AppError, AppResult};

/// Proof that a request passed the admin credential check
///
/// Only [`AdminAuthService::authenticate`] can create one, so holding an
/// `AdminPrincipal` is the capability to call admin operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPrincipal {
    username: String,
}

impl AdminPrincipal {
    pub(crate) const fn new(username: String) -> Self {
        Self { username }
    }

    /// Authenticated admin username
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Reason a credential check failed, for security logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No `Authorization` header
    MissingHeader,
    /// Header present but not `Basic <base64>`
    Malformed,
    /// Server has no credentials configured
    NotConfigured,
    /// Username or password did not match
    Mismatch,
}

impl AuthFailure {
    /// Short label for logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingHeader => "missing_header",
            Self::Malformed => "malformed_header",
            Self::NotConfigured => "not_configured",
            Self::Mismatch => "invalid_credentials",
        }
    }

    /// Client-facing error
    #[must_use]
    pub fn into_error(self) -> AppError {
        match self {
            Self::MissingHeader | Self::Malformed => AppError::auth_required(),
            Self::NotConfigured => AppError::config_missing(messages::ADMIN_NOT_CONFIGURED),
            Self::Mismatch => AppError::auth_invalid(),
        }
    }
}

/// Admin authentication service
#[derive(Clone)]
pub struct AdminAuthService {
    credentials: Arc<AdminCredentials>,
}

impl AdminAuthService {
    /// Create a service checking against the configured credentials
    #[must_use]
    pub fn new(credentials: AdminCredentials) -> Self {
        Self {
            credentials: Arc::new(credentials),
        }
    }

    /// Check an `Authorization` header value
    ///
    /// # Errors
    ///
    /// Returns the failure reason; see the module docs for the order
    pub fn check(&self, authorization: Option<&str>) -> Result<AdminPrincipal, AuthFailure> {
        let header = authorization.ok_or(AuthFailure::MissingHeader)?;
        let encoded = header
            .strip_prefix("Basic ")
            .ok_or(AuthFailure::Malformed)?
            .trim();
        let decoded = STANDARD
            .decode(encoded)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or(AuthFailure::Malformed)?;

        let Some((expected_user, expected_pass)) = self.credentials.pair() else {
            error!("Admin request rejected: ADMIN_USER/ADMIN_PASS not configured");
            return Err(AuthFailure::NotConfigured);
        };

        // Passwords may contain ':'; the username may not
        let (user, pass) = decoded.split_once(':').unwrap_or((decoded.as_str(), ""));

        let user_ok = user.as_bytes().ct_eq(expected_user.as_bytes());
        let pass_ok = pass.as_bytes().ct_eq(expected_pass.as_bytes());
        if bool::from(user_ok & pass_ok) {
            Ok(AdminPrincipal::new(user.to_owned()))
        } else {
            Err(AuthFailure::Mismatch)
        }
    }

    /// Check an `Authorization` header value, mapping failures to client errors
    ///
    /// # Errors
    ///
    /// Returns 401 for missing, malformed or wrong credentials and 500 when
    /// the server has no credentials configured
    pub fn authenticate(&self, authorization: Option<&str>) -> AppResult<AdminPrincipal> {
        self.check(authorization).map_err(AuthFailure::into_error)
    }
}
