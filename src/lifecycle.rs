// ABOUTME: Token lifecycle engine computing token status and enforcing single-use replies
// ABOUTME: Orchestrates validation, lookup and the atomic reply commit against an InviteStore
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Token Lifecycle
//!
//! Each token is in one of three states: `NotFound`, `Unused` or `Used`.
//! The only transition is `Unused -> Used`, fired exactly once by a
//! successful reply. Status lookups and redirect resolution never write.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{error, warn};

use rsvp_core::constants::messages;
use rsvp_core::models::{RsvpResponse, TokenState, TokenStatus};
use rsvp_core::payload::{AllowedFields, RsvpPayload};

use crate::config::RedirectConfig;
use crate::database_plugins::{InviteStore, ReplyCommit};
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;

/// Proof of a committed reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyReceipt {
    /// Id of the response record, equal to the invite token
    pub record_id: String,
    /// Server timestamp written to the response and the invite
    pub submitted_at: DateTime<Utc>,
}

/// Token lifecycle engine
#[derive(Clone)]
pub struct TokenLifecycleEngine {
    store: Arc<dyn InviteStore>,
    redirects: RedirectConfig,
    allowed_fields: AllowedFields,
}

impl TokenLifecycleEngine {
    /// Create an engine over an injected store
    #[must_use]
    pub fn new(
        store: Arc<dyn InviteStore>,
        redirects: RedirectConfig,
        allowed_fields: AllowedFields,
    ) -> Self {
        Self {
            store,
            redirects,
            allowed_fields,
        }
    }

    /// Compute the status of a token
    ///
    /// Any string is accepted; malformed tokens simply are not found. The
    /// status carries the trimmed token.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the invite lookup fails
    pub async fn get_status(&self, token: &str) -> AppResult<TokenStatus> {
        let token = token.trim();
        let status = match self.store.get_invite(token).await? {
            Some(invite) => TokenStatus::from_invite(token, &invite),
            None => TokenStatus::not_found(token),
        };
        Ok(status)
    }

    /// Pick the redirect target for a token
    ///
    /// Only an unused token leads to the full invite; a failed lookup is
    /// treated like an unknown token.
    pub async fn resolve_destination(&self, token: &str) -> &str {
        match self.get_status(token).await {
            Ok(status) if status.state == TokenState::Unused => &self.redirects.full_invite_url,
            Ok(_) => &self.redirects.fallback_url,
            Err(e) => {
                warn!(token = %token, error = %e, "Token lookup failed during resolve, using fallback");
                &self.redirects.fallback_url
            }
        }
    }

    /// Validate and persist a guest reply from a raw request body
    ///
    /// # Errors
    ///
    /// - `InvalidInput` (400) when the payload breaks a validation rule
    /// - `ResourceNotFound` (404) when no invite exists for the token
    /// - `ResourceGone` (410) when the token was already used
    /// - `StorageError` (500) when the store fails; nothing is retried
    pub async fn submit_reply(&self, token: &str, body: &[u8]) -> AppResult<ReplyReceipt> {
        let started = Instant::now();
        let result = self.process_reply(token, body).await;

        let outcome = match &result {
            Ok(_) => "committed",
            Err(e) if e.http_status() >= 500 => "failed",
            Err(_) => "rejected",
        };
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        AppLogger::log_reply_submission(token, outcome, elapsed_ms);

        result
    }

    async fn process_reply(&self, token: &str, body: &[u8]) -> AppResult<ReplyReceipt> {
        let payload = RsvpPayload::from_bytes(body, &self.allowed_fields)?;

        let invite = self
            .store
            .get_invite(token)
            .await
            .inspect_err(|e| error!(token = %token, error = %e, "Invite lookup failed"))?
            .ok_or_else(|| AppError::not_found(messages::TOKEN_NOT_FOUND))?;
        if invite.state() == TokenState::Used {
            return Err(AppError::already_used());
        }

        let now = Utc::now();
        let response = RsvpResponse::compose(&invite, payload, now);

        let commit = self
            .store
            .commit_reply(&response, now)
            .await
            .inspect_err(|e| error!(token = %response.token, error = %e, "Reply commit failed"))?;

        match commit {
            ReplyCommit::Committed => Ok(ReplyReceipt {
                record_id: response.token,
                submitted_at: now,
            }),
            // Lost a race with a concurrent reply for the same token
            ReplyCommit::AlreadyUsed => Err(AppError::already_used()),
            ReplyCommit::NotFound => Err(AppError::not_found(messages::TOKEN_NOT_FOUND)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_plugins::memory::MemoryStore;
    use crate::database_plugins::AdminStore;
    use crate::errors::ErrorCode;
    use rsvp_core::models::{Collection, Document};
    use serde_json::{json, Value};

    async fn engine_with_invite() -> (TokenLifecycleEngine, MemoryStore) {
        let store = MemoryStore::new();
        let Value::Object(doc) = json!({"guestName": "Sam", "route": "A", "usedAt": null}) else {
            unreachable!()
        };
        store.create_invite("AB12cd", doc).await.unwrap();
        let engine = TokenLifecycleEngine::new(
            Arc::new(store.clone()),
            RedirectConfig::default(),
            AllowedFields::default(),
        );
        (engine, store)
    }

    #[tokio::test]
    async fn test_invalid_payload_writes_nothing() {
        let (engine, store) = engine_with_invite().await;
        let err = engine
            .submit_reply("AB12cd", br#"{"rsvp":"maybe"}"#)
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert_eq!(store.count(Collection::Responses).await, 0);
        let status = engine.get_status("AB12cd").await.unwrap();
        assert!(status.is_valid());
    }

    #[tokio::test]
    async fn test_validation_runs_before_lookup() {
        let (engine, _) = engine_with_invite().await;
        let err = engine.submit_reply("nope", b"{}").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_response_snapshots_invite() {
        let (engine, store) = engine_with_invite().await;
        let receipt = engine
            .submit_reply("AB12cd", br#"{"rsvp":"Yes","songRequest":"  "}"#)
            .await
            .unwrap();
        assert_eq!(receipt.record_id, "AB12cd");

        let stored: Document = store
            .get_document(Collection::Responses, "AB12cd")
            .await
            .unwrap();
        assert_eq!(stored["guestName"], "Sam");
        assert_eq!(stored["route"], "A");
        assert_eq!(stored["rsvp"], "yes");
        assert!(!stored.contains_key("songRequest"));
    }

    #[tokio::test]
    async fn test_resolve_destination() {
        let (engine, _) = engine_with_invite().await;
        let redirects = RedirectConfig::default();

        assert_eq!(
            engine.resolve_destination("AB12cd").await,
            redirects.full_invite_url
        );
        assert_eq!(
            engine.resolve_destination("ZZZZZZ").await,
            redirects.fallback_url
        );
    }
}
