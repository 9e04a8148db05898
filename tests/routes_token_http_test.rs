// ABOUTME: HTTP integration tests for guest token routes
// ABOUTME: Covers status, redirect, reply validation, single use, rate limiting and store failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use helpers::axum_test::AxumTestRequest;
use rsvp_server::{
    database_plugins::{
        memory::MemoryStore, AdminStore, CreateOutcome, InviteStore, PatchOutcome, ReplyCommit,
        StoreError, StoreResult,
    },
    models::{Collection, Document, Invite, RsvpResponse},
};
use serde_json::{json, Value};

// ============================================================================
// End-to-end flow
// ============================================================================

#[tokio::test]
async fn test_invite_reply_flow() {
    let store = common::store_with_sam().await;
    let app = common::app(&store, 10);

    let status: Value = AxumTestRequest::get("/v1/token/AB12cd/status")
        .send(app.clone())
        .await
        .json();
    assert_eq!(status["token"], "AB12cd");
    assert_eq!(status["guestName"], "Sam");
    assert_eq!(status["route"], "A");
    assert_eq!(status["valid"], true);
    assert!(status["usedAt"].is_null());
    assert_eq!(status["message"], "Token is valid");

    let reply = AxumTestRequest::post("/v1/token/AB12cd/reply")
        .json(&json!({"rsvp": "yes"}))
        .send(app.clone())
        .await;
    assert_eq!(reply.status(), 201);
    let body: Value = reply.json();
    assert_eq!(body["recordId"], "AB12cd");
    assert_eq!(body["firestoreCollection"], "responses");
    assert_eq!(body["message"], "Record written successfully to the database");

    let response = store
        .get_document(Collection::Responses, "AB12cd")
        .await
        .unwrap();
    assert_eq!(response["guestName"], "Sam");
    assert_eq!(response["route"], "A");
    assert_eq!(response["rsvp"], "yes");

    let invite = store
        .get_document(Collection::Invites, "AB12cd")
        .await
        .unwrap();
    assert!(invite["usedAt"].is_string());

    let status: Value = AxumTestRequest::get("/v1/token/AB12cd/status")
        .send(app)
        .await
        .json();
    assert_eq!(status["valid"], false);
    assert!(status["usedAt"].is_string());
    assert_eq!(status["message"], "Token is NOT valid");
}

// ============================================================================
// GET /v1/token/:tokenId/status
// ============================================================================

#[tokio::test]
async fn test_status_unknown_token_is_404() {
    let app = common::app(&MemoryStore::new(), 10);

    let response = AxumTestRequest::get("/v1/token/ZZ99zz/status").send(app).await;
    assert_eq!(response.status(), 404);
    let body: Value = response.json();
    assert_eq!(body["message"], "Token not found");
}

#[tokio::test]
async fn test_status_is_side_effect_free() {
    let store = common::store_with_sam().await;
    let app = common::app(&store, 10);

    let first: Value = AxumTestRequest::get("/v1/token/AB12cd/status")
        .send(app.clone())
        .await
        .json();
    let second: Value = AxumTestRequest::get("/v1/token/AB12cd/status")
        .send(app)
        .await
        .json();
    assert_eq!(first["valid"], second["valid"]);
    assert_eq!(first["usedAt"], second["usedAt"]);
}

// ============================================================================
// GET /v1/token/:tokenId/resolve
// ============================================================================

#[tokio::test]
async fn test_resolve_redirects_by_state() {
    let store = common::store_with_sam().await;
    let app = common::app(&store, 10);

    let unused = AxumTestRequest::get("/v1/token/AB12cd/resolve")
        .send(app.clone())
        .await;
    assert_eq!(unused.status(), 302);
    assert_eq!(unused.header("location"), Some(common::FULL_URL));

    let unknown = AxumTestRequest::get("/v1/token/nope42/resolve")
        .send(app.clone())
        .await;
    assert_eq!(unknown.status(), 302);
    assert_eq!(unknown.header("location"), Some(common::FALLBACK_URL));

    AxumTestRequest::post("/v1/token/AB12cd/reply")
        .json(&json!({"rsvp": "no"}))
        .send(app.clone())
        .await;

    let used = AxumTestRequest::get("/v1/token/AB12cd/resolve")
        .send(app)
        .await;
    assert_eq!(used.header("location"), Some(common::FALLBACK_URL));
}

#[tokio::test]
async fn test_resolve_never_consumes_token() {
    let store = common::store_with_sam().await;
    let app = common::app(&store, 10);

    for _ in 0..3 {
        AxumTestRequest::get("/v1/token/AB12cd/resolve")
            .send(app.clone())
            .await;
    }
    let invite = store
        .get_document(Collection::Invites, "AB12cd")
        .await
        .unwrap();
    assert!(invite["usedAt"].is_null());
}

// ============================================================================
// POST /v1/token/:tokenId/reply
// ============================================================================

#[tokio::test]
async fn test_second_reply_is_gone() {
    let store = common::store_with_sam().await;
    let app = common::app(&store, 10);

    let first = AxumTestRequest::post("/v1/token/AB12cd/reply")
        .json(&json!({"rsvp": "yes", "songRequest": "Dancing Queen"}))
        .send(app.clone())
        .await;
    assert_eq!(first.status(), 201);

    let second = AxumTestRequest::post("/v1/token/AB12cd/reply")
        .json(&json!({"rsvp": "no"}))
        .send(app)
        .await;
    assert_eq!(second.status(), 410);

    let response = store
        .get_document(Collection::Responses, "AB12cd")
        .await
        .unwrap();
    assert_eq!(response["rsvp"], "yes");
    assert_eq!(response["songRequest"], "Dancing Queen");
}

#[tokio::test]
async fn test_reply_unknown_token_writes_nothing() {
    let store = MemoryStore::new();
    let app = common::app(&store, 10);

    let response = AxumTestRequest::post("/v1/token/ZZ99zz/reply")
        .json(&json!({"rsvp": "yes"}))
        .send(app)
        .await;
    assert_eq!(response.status(), 404);
    assert_eq!(store.count(Collection::Responses).await, 0);
}

#[tokio::test]
async fn test_reply_validation_errors() {
    let store = common::store_with_sam().await;
    let app = common::app(&store, 100);

    let cases = [
        (json!({"rsvp": "maybe"}), "rsvp"),
        (json!({"rsvp": "yes", "allergies": true}), "allergy description"),
        (json!({"rsvp": "yes", "extra": "x"}), "extra"),
        (json!({"rsvp": "yes", "allergies": "no"}), "allergies"),
    ];
    for (payload, mentioned) in cases {
        let response = AxumTestRequest::post("/v1/token/AB12cd/reply")
            .json(&payload)
            .send(app.clone())
            .await;
        assert_eq!(response.status(), 400, "payload {payload}");
        let body: Value = response.json();
        let message = body["message"].as_str().unwrap().to_lowercase();
        assert!(message.contains(mentioned), "{message} should mention {mentioned}");
    }

    // Validation failures leave the token usable
    let invite = store
        .get_document(Collection::Invites, "AB12cd")
        .await
        .unwrap();
    assert!(invite["usedAt"].is_null());
}

#[tokio::test]
async fn test_reply_malformed_json_is_400() {
    let store = common::store_with_sam().await;
    let app = common::app(&store, 10);

    let response = AxumTestRequest::post("/v1/token/AB12cd/reply")
        .header("content-type", "application/json")
        .raw_body("{not json")
        .send(app)
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_reply_normalizes_case_and_drops_description() {
    let store = common::store_with_sam().await;
    let app = common::app(&store, 10);

    let response = AxumTestRequest::post("/v1/token/AB12cd/reply")
        .json(&json!({
            "rsvp": "Yes",
            "allergies": false,
            "allergyDescription": "peanuts"
        }))
        .send(app)
        .await;
    assert_eq!(response.status(), 201);

    let stored = store
        .get_document(Collection::Responses, "AB12cd")
        .await
        .unwrap();
    assert_eq!(stored["rsvp"], "yes");
    assert_eq!(stored["allergies"], false);
    assert!(!stored.contains_key("allergyDescription"));
}

// ============================================================================
// Rate limiting
// ============================================================================

#[tokio::test]
async fn test_reply_rate_limit() {
    let store = MemoryStore::new();
    let app = common::app(&store, 3);

    for _ in 0..3 {
        let response = AxumTestRequest::post("/v1/token/ZZ99zz/reply")
            .json(&json!({"rsvp": "yes"}))
            .send(app.clone())
            .await;
        assert_eq!(response.status(), 404);
        assert_eq!(response.header("x-ratelimit-limit"), Some("3"));
    }

    let limited = AxumTestRequest::post("/v1/token/ZZ99zz/reply")
        .json(&json!({"rsvp": "yes"}))
        .send(app.clone())
        .await;
    assert_eq!(limited.status(), 429);
    assert!(limited.header("retry-after").is_some());
    let body: Value = limited.json();
    assert_eq!(body["message"], "Too many requests. Please try again shortly.");

    // Other routes are not limited
    let status = AxumTestRequest::get("/v1/token/ZZ99zz/status").send(app).await;
    assert_eq!(status.status(), 404);
}

#[tokio::test]
async fn test_rate_limit_is_per_client() {
    let store = MemoryStore::new();
    let app = common::app(&store, 1);

    let first = AxumTestRequest::post("/v1/token/ZZ99zz/reply")
        .header("x-forwarded-for", "203.0.113.1")
        .json(&json!({"rsvp": "yes"}))
        .send(app.clone())
        .await;
    assert_eq!(first.status(), 404);

    let other_client = AxumTestRequest::post("/v1/token/ZZ99zz/reply")
        .header("x-forwarded-for", "203.0.113.2")
        .json(&json!({"rsvp": "yes"}))
        .send(app)
        .await;
    assert_eq!(other_client.status(), 404);
}

// ============================================================================
// Store failures
// ============================================================================

/// Store that finds every invite but cannot write
struct ReadOnlyStore;

#[async_trait]
impl InviteStore for ReadOnlyStore {
    async fn get_invite(&self, token: &str) -> StoreResult<Option<Invite>> {
        let document = common::invite_document(token, json!({"guestName": "Sam"}));
        Ok(Some(Invite::from_document(token, &document)))
    }

    async fn commit_reply(
        &self,
        _response: &RsvpResponse,
        _used_at: DateTime<Utc>,
    ) -> StoreResult<ReplyCommit> {
        Err(StoreError::Unavailable("disk full".to_owned()))
    }
}

#[async_trait]
impl AdminStore for ReadOnlyStore {
    async fn list_documents(&self, _collection: Collection) -> StoreResult<Vec<Document>> {
        Ok(Vec::new())
    }

    async fn create_invite(&self, _token: &str, _document: Document) -> StoreResult<CreateOutcome> {
        Err(StoreError::Unavailable("read only".to_owned()))
    }

    async fn patch_document(
        &self,
        _collection: Collection,
        _id: &str,
        _fields: Document,
    ) -> StoreResult<PatchOutcome> {
        Err(StoreError::Unavailable("read only".to_owned()))
    }
}

#[tokio::test]
async fn test_store_failure_reports_record_not_written() {
    let app = common::app_with(Arc::new(ReadOnlyStore), &common::test_config(10));

    let response = AxumTestRequest::post("/v1/token/AB12cd/reply")
        .json(&json!({"rsvp": "yes"}))
        .send(app)
        .await;
    assert_eq!(response.status(), 500);

    let body: Value = response.json();
    assert_eq!(body["recordId"], "AB12cd");
    assert_eq!(body["firestoreCollection"], "responses");
    assert_eq!(body["message"], "Record NOT written to the database");
    assert_eq!(body["error"]["code"], "unavailable");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("disk full"));
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_routes_outside_v1() {
    let app = common::app(&MemoryStore::new(), 10);

    let health = AxumTestRequest::get("/health").send(app.clone()).await;
    assert_eq!(health.status(), 200);
    let body: Value = health.json();
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());

    let ready = AxumTestRequest::get("/ready").send(app).await;
    assert_eq!(ready.status(), 200);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let app = common::app(&MemoryStore::new(), 10);

    let generated = AxumTestRequest::get("/health").send(app.clone()).await;
    assert!(generated.header("x-request-id").is_some());

    let supplied = AxumTestRequest::get("/health")
        .header("x-request-id", "req-123")
        .send(app)
        .await;
    assert_eq!(supplied.header("x-request-id"), Some("req-123"));
}
