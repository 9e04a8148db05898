// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides logging setup, test configuration, seeded stores and the assembled router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `rsvp_server`

use std::sync::{Arc, Once};

use axum::Router;
use chrono::Utc;
use rsvp_server::{
    config::{AdminCredentials, RateLimitConfig, ServerConfig},
    database_plugins::{memory::MemoryStore, timestamp_value, AdminStore, InviteStore},
    models::Document,
    server::{build_router, ServerResources},
};
use serde_json::{json, Value};

static INIT_LOGGER: Once = Once::new();

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASS: &str = "correct:horse";
pub const FULL_URL: &str = "https://invite.example/full";
pub const FALLBACK_URL: &str = "https://invite.example/sorry";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Configuration with admin credentials and a small reply limit
pub fn test_config(max_replies: u32) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.admin = AdminCredentials::new(ADMIN_USER, ADMIN_PASS);
    config.redirects.full_invite_url = FULL_URL.to_owned();
    config.redirects.fallback_url = FALLBACK_URL.to_owned();
    config.reply.rate_limit = RateLimitConfig {
        window_secs: 60,
        max_requests: max_replies,
        sweep_interval_secs: 60,
    };
    config
}

/// Unused invite document with the given extra fields
pub fn invite_document(token: &str, extra: Value) -> Document {
    let mut document = match extra {
        Value::Object(map) => map,
        _ => Document::new(),
    };
    document.insert("token".to_owned(), json!(token));
    document.insert("createdAt".to_owned(), timestamp_value(Utc::now()).unwrap());
    document.insert("usedAt".to_owned(), Value::Null);
    document
}

/// Insert an unused invite directly into a store
pub async fn seed_invite<S: AdminStore + ?Sized>(store: &S, token: &str, extra: Value) {
    store
        .create_invite(token, invite_document(token, extra))
        .await
        .unwrap();
}

/// Memory store holding invite `AB12cd` for Sam on route A
pub async fn store_with_sam() -> MemoryStore {
    let store = MemoryStore::new();
    seed_invite(&store, "AB12cd", json!({"guestName": "Sam", "route": "A"})).await;
    store
}

/// Full application router over any store
pub fn app_with<S>(store: Arc<S>, config: &ServerConfig) -> Router
where
    S: InviteStore + AdminStore + 'static,
{
    init_test_logging();
    let resources = ServerResources::new(store, config).unwrap();
    build_router(resources, config)
}

/// Full application router over a memory store
pub fn app(store: &MemoryStore, max_replies: u32) -> Router {
    app_with(Arc::new(store.clone()), &test_config(max_replies))
}
