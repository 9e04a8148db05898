// ABOUTME: Unified error handling with standard error codes and HTTP status mapping
// ABOUTME: Defines AppError, ErrorCode and the structured JSON error body
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling System
//!
//! Every failure the server reports to a client is an [`AppError`]. The
//! [`ErrorCode`] decides the HTTP status; the message is what the client reads.

use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::messages;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Authentication
    /// No usable credentials were supplied
    AuthRequired,
    /// Credentials were supplied but did not match
    AuthInvalid,

    // Rate limiting
    /// Too many requests in the current window
    RateLimitExceeded,

    // Validation
    /// Request payload failed validation
    InvalidInput,

    // Resources
    /// Requested record does not exist
    ResourceNotFound,
    /// Record with the same identifier already exists
    ResourceAlreadyExists,
    /// Record existed but can no longer be used
    ResourceGone,

    // Configuration
    /// Required server configuration is missing
    ConfigMissing,

    // Internal
    /// Underlying document store failed
    StorageError,
    /// Anything else
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidInput => 400,
            Self::AuthRequired | Self::AuthInvalid => 401,
            Self::ResourceNotFound => 404,
            Self::ResourceAlreadyExists => 409,
            Self::ResourceGone => 410,
            Self::RateLimitExceeded => 429,
            Self::ConfigMissing | Self::StorageError | Self::InternalError => 500,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::AuthRequired => "Authentication is required to access this resource",
            Self::AuthInvalid => "The provided authentication credentials are invalid",
            Self::RateLimitExceeded => "Rate limit exceeded",
            Self::InvalidInput => "The provided input is invalid",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::ResourceAlreadyExists => "A resource with this identifier already exists",
            Self::ResourceGone => "The requested resource is no longer available",
            Self::ConfigMissing => "Required configuration is missing",
            Self::StorageError => "Storage operation failed",
            Self::InternalError => "An internal server error occurred",
        }
    }

    /// Whether responses with this code carry a `WWW-Authenticate` challenge
    #[must_use]
    pub const fn requires_challenge(self) -> bool {
        matches!(self, Self::AuthRequired | Self::AuthInvalid)
    }
}

/// Unified error type for the application
#[derive(Debug)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Machine-readable diagnostics (store error code, rate limit window, ...)
    pub details: Value,
    /// Source error for error chaining
    pub source: Option<Box<dyn Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: Value::Null,
            source: None,
        }
    }

    /// Attach diagnostics to the error
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Missing or malformed credentials
    #[must_use]
    pub fn auth_required() -> Self {
        Self::new(ErrorCode::AuthRequired, messages::AUTH_REQUIRED)
    }

    /// Credentials did not match
    #[must_use]
    pub fn auth_invalid() -> Self {
        Self::new(ErrorCode::AuthInvalid, messages::INVALID_CREDENTIALS)
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Resource not found, with the message sent verbatim
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceNotFound, message)
    }

    /// Token has already been consumed
    #[must_use]
    pub fn already_used() -> Self {
        Self::new(ErrorCode::ResourceGone, messages::TOKEN_NOT_VALID)
    }

    /// Duplicate record
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceAlreadyExists, message)
    }

    /// Required server configuration is missing
    pub fn config_missing(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigMissing, message)
    }

    /// Document store failure with the store's own code and message
    pub fn storage(store_code: &str, store_message: impl Into<String>) -> Self {
        let store_message = store_message.into();
        Self::new(ErrorCode::StorageError, store_message.clone()).with_details(
            serde_json::json!({
                "code": store_code,
                "message": store_message,
            }),
        )
    }

    /// Rate limit exceeded
    #[must_use]
    pub fn rate_limit_exceeded(limit: u32, reset_at: chrono::DateTime<chrono::Utc>) -> Self {
        Self::new(ErrorCode::RateLimitExceeded, messages::TOO_MANY_REQUESTS).with_details(
            serde_json::json!({
                "limit": limit,
                "reset_at": reset_at.to_rfc3339(),
            }),
        )
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Store diagnostics as `(code, message)` when this is a storage error
    #[must_use]
    pub fn storage_diagnostics(&self) -> Option<(String, String)> {
        if self.code != ErrorCode::StorageError {
            return None;
        }
        let code = self.details.get("code").and_then(Value::as_str)?;
        let message = self
            .details
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or(&self.message);
        Some((code.to_owned(), message.to_owned()))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn Error + 'static))
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// HTTP error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message
    pub message: String,
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Optional diagnostics
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self {
            message: error.message,
            code: error.code,
            details: error.details,
        }
    }
}

#[cfg(feature = "http-response")]
mod http_response {
    use axum::{
        response::{IntoResponse, Response},
        Json,
    };
    use http::{header, HeaderValue, StatusCode};

    use super::{AppError, ErrorResponse};
    use crate::constants::ADMIN_AUTH_REALM;

    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            let status = StatusCode::from_u16(self.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let challenge = self.code.requires_challenge();

            let mut response = (status, Json(ErrorResponse::from(self))).into_response();

            if challenge {
                if let Ok(value) =
                    HeaderValue::from_str(&format!("Basic realm=\"{ADMIN_AUTH_REALM}\""))
                {
                    response
                        .headers_mut()
                        .insert(header::WWW_AUTHENTICATE, value);
                }
            }

            response
        }
    }
}
