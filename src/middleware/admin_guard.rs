// ABOUTME: Central admin authorization guard for routes requiring admin privileges
// ABOUTME: Runs the Basic-Auth check and attaches the AdminPrincipal to the request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Admin Authorization Guard
//!
//! Layered over every admin route. Handlers behind it extract the
//! authenticated principal with `Extension<AdminPrincipal>`.
//!
//! ```rust,no_run
//! use axum::{middleware, routing::get, Extension, Router};
//! use rsvp_server::admin::{AdminAuthService, AdminPrincipal};
//! use rsvp_server::config::AdminCredentials;
//! use rsvp_server::middleware::admin_guard::require_admin;
//!
//! async fn whoami(Extension(admin): Extension<AdminPrincipal>) -> String {
//!     admin.username().to_owned()
//! }
//!
//! let auth = AdminAuthService::new(AdminCredentials::new("admin", "secret"));
//! let app: Router = Router::new()
//!     .route("/admin/whoami", get(whoami))
//!     .layer(middleware::from_fn_with_state(auth, require_admin));
//! ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http::header::AUTHORIZATION;

use crate::admin::AdminAuthService;
use crate::errors::AppError;
use crate::logging::AppLogger;
use crate::middleware::rate_limiting::client_address;

/// Require valid admin credentials
///
/// # Errors
///
/// Returns 401 with a `WWW-Authenticate` challenge for missing or wrong
/// credentials, 500 when the server has none configured
pub async fn require_admin(
    State(auth): State<AdminAuthService>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match auth.check(authorization) {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            Ok(next.run(request).await)
        }
        Err(failure) => {
            AppLogger::log_security_event(
                "admin_auth_failed",
                &client_address(&request),
                failure.as_str(),
            );
            Err(failure.into_error())
        }
    }
}
