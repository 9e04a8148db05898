// ABOUTME: Rate limiting middleware for HTTP requests
// ABOUTME: Applies the fixed-window limiter per client, method and path and sets rate limit headers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Rate Limiting Middleware with HTTP Headers
//!
//! Every response that passed through the limiter carries the standard
//! `X-RateLimit-*` headers. Rejected requests get a 429 with `Retry-After`.
//! Limiter failures never block a request.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, OriginalUri, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use http::{HeaderMap, HeaderValue};
use tracing::warn;

use crate::errors::AppError;
use crate::logging::AppLogger;
use crate::rate_limiting::{FixedWindowRateLimiter, RateLimitInfo};

/// HTTP header names for rate limiting
pub mod headers {
    /// HTTP header name for maximum requests allowed in the current window
    pub const X_RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
    /// HTTP header name for remaining requests in the current window
    pub const X_RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
    /// HTTP header name for Unix timestamp when the window resets
    pub const X_RATE_LIMIT_RESET: &str = "x-ratelimit-reset";
    /// HTTP header name for retry-after duration in seconds
    pub const RETRY_AFTER: &str = "retry-after";
    /// Proxy-supplied client address chain
    pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
}

/// Limiter plus the key prefix distinguishing limited route groups
#[derive(Debug, Clone)]
pub struct RateLimitLayerState {
    /// Shared counter map
    pub limiter: Arc<FixedWindowRateLimiter>,
    /// Key prefix, e.g. `reply`
    pub prefix: &'static str,
}

/// Create a `HeaderMap` with rate limit headers
#[must_use]
pub fn create_rate_limit_headers(info: &RateLimitInfo) -> HeaderMap {
    let mut headers = HeaderMap::new();

    headers.insert(headers::X_RATE_LIMIT_LIMIT, HeaderValue::from(info.limit));
    headers.insert(
        headers::X_RATE_LIMIT_REMAINING,
        HeaderValue::from(info.remaining),
    );
    headers.insert(
        headers::X_RATE_LIMIT_RESET,
        HeaderValue::from(info.reset_at.timestamp()),
    );

    if info.is_rate_limited {
        let retry_after = (info.reset_at - Utc::now()).num_seconds().max(0);
        headers.insert(headers::RETRY_AFTER, HeaderValue::from(retry_after));
    }

    headers
}

/// Best-effort client address
///
/// The first `X-Forwarded-For` entry wins, then the socket peer address.
#[must_use]
pub fn client_address(request: &Request) -> String {
    let forwarded = request
        .headers()
        .get(headers::X_FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|chain| chain.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty());

    if let Some(first) = forwarded {
        return first.to_owned();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "unknown".to_owned(), |ConnectInfo(addr)| addr.ip().to_string())
}

/// Limiter key: `prefix:client:METHOD:/full/path`
#[must_use]
pub fn rate_limit_key(prefix: &str, request: &Request) -> String {
    // Nested routers see a stripped URI; key on the path the client sent
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map_or_else(|| request.uri().path(), |OriginalUri(uri)| uri.path());
    format!(
        "{prefix}:{}:{}:{path}",
        client_address(request),
        request.method()
    )
}

/// Fixed-window rate limiting middleware
pub async fn rate_limit_middleware(
    State(state): State<RateLimitLayerState>,
    request: Request,
    next: Next,
) -> Response {
    let key = rate_limit_key(state.prefix, &request);

    match state.limiter.check(&key) {
        Ok(info) if info.is_rate_limited => {
            AppLogger::log_security_event(
                "rate_limit_exceeded",
                &client_address(&request),
                &format!("{} requests per window on {key}", info.limit),
            );
            let mut response = AppError::rate_limit_exceeded(info.limit, info.reset_at).into_response();
            response
                .headers_mut()
                .extend(create_rate_limit_headers(&info));
            response
        }
        Ok(info) => {
            let mut response = next.run(request).await;
            response
                .headers_mut()
                .extend(create_rate_limit_headers(&info));
            response
        }
        Err(e) => {
            warn!(key = %key, error = %e, "Rate limiter failed, allowing request");
            next.run(request).await
        }
    }
}
