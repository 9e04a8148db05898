// ABOUTME: HTTP middleware for request tracing, admin authentication and rate limiting
// ABOUTME: Provides request ID generation, span creation, CORS and the Basic-Auth guard
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub mod admin_guard;
pub mod cors;
pub mod rate_limiting;
pub mod tracing;

// Admin authorization
pub use admin_guard::require_admin;

// CORS configuration
pub use cors::setup_cors;

// Rate limiting middleware and utilities
pub use rate_limiting::{
    client_address, create_rate_limit_headers, headers, rate_limit_middleware,
    RateLimitLayerState,
};

// Request tracing
pub use self::tracing::{create_request_span, make_request_span, trace_layer};
