// ABOUTME: Integration tests for the fixed-window rate limiter and its middleware
// ABOUTME: Exercises window expiry in real time, the background sweep and header behavior
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::post, Router};
use helpers::axum_test::AxumTestRequest;
use rsvp_server::{
    config::RateLimitConfig,
    middleware::rate_limiting::{headers, rate_limit_middleware, RateLimitLayerState},
    rate_limiting::FixedWindowRateLimiter,
};

fn limited_router(limiter: Arc<FixedWindowRateLimiter>) -> Router {
    Router::new()
        .route("/echo", post(|| async { "ok" }))
        .layer(middleware::from_fn_with_state(
            RateLimitLayerState {
                limiter,
                prefix: "test",
            },
            rate_limit_middleware,
        ))
}

#[tokio::test]
async fn test_counter_resets_after_window() {
    common::init_test_logging();
    let limiter = Arc::new(FixedWindowRateLimiter::new(1, Duration::from_secs(1)).unwrap());
    let app = limited_router(limiter);

    let first = AxumTestRequest::post("/echo").send(app.clone()).await;
    assert_eq!(first.status(), 200);
    assert_eq!(first.header(headers::X_RATE_LIMIT_REMAINING), Some("0"));

    let second = AxumTestRequest::post("/echo").send(app.clone()).await;
    assert_eq!(second.status(), 429);
    assert!(second.header(headers::RETRY_AFTER).is_some());

    tokio::time::sleep(Duration::from_millis(1100)).await;

    let third = AxumTestRequest::post("/echo").send(app).await;
    assert_eq!(third.status(), 200);
}

#[tokio::test]
async fn test_background_sweep_evicts_expired_windows() {
    let limiter = FixedWindowRateLimiter::from_config(&RateLimitConfig {
        window_secs: 1,
        max_requests: 5,
        sweep_interval_secs: 1,
    })
    .unwrap();

    limiter.check("client-a").unwrap();
    limiter.check("client-b").unwrap();
    assert_eq!(limiter.tracked_keys(), 2);

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(limiter.tracked_keys(), 0);
}

#[tokio::test]
async fn test_limit_headers_on_allowed_requests() {
    let limiter = Arc::new(FixedWindowRateLimiter::new(5, Duration::from_secs(60)).unwrap());
    let app = limited_router(limiter);

    let response = AxumTestRequest::post("/echo").send(app).await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.header(headers::X_RATE_LIMIT_LIMIT), Some("5"));
    assert_eq!(response.header(headers::X_RATE_LIMIT_REMAINING), Some("4"));
    assert!(response.header(headers::X_RATE_LIMIT_RESET).is_some());
    assert!(response.header(headers::RETRY_AFTER).is_none());
}
