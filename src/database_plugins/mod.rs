// ABOUTME: Document store abstraction for the RSVP server
// ABOUTME: Lifecycle and admin capabilities with in-memory and SQLite backends
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Document store capabilities
//!
//! Storage is split into two traits so that the lifecycle engine can only
//! read invites and commit replies, while the unschematized admin writes
//! live behind a separate capability.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use rsvp_core::constants::fields;
use rsvp_core::models::{Collection, Document, Invite, RsvpResponse};

pub mod factory;
pub mod memory;
pub mod sqlite;

/// Failures reported by a document store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying database driver failed
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// A stored document could not be decoded
    #[error("stored document {collection}/{id} is corrupt: {reason}")]
    Corrupt {
        /// Collection name
        collection: &'static str,
        /// Document id
        id: String,
        /// Decoder message
        reason: String,
    },
    /// A document could not be encoded
    #[error("failed to encode document: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Store cannot serve requests
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Short machine-readable code reported to clients alongside the message
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Database(_) => "database",
            Self::Corrupt { .. } => "corrupt-document",
            Self::Serialization(_) => "serialization",
            Self::Unavailable(_) => "unavailable",
        }
    }

    pub(crate) fn corrupt(collection: Collection, id: &str, reason: impl ToString) -> Self {
        Self::Corrupt {
            collection: collection.as_str(),
            id: id.to_owned(),
            reason: reason.to_string(),
        }
    }
}

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of committing a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyCommit {
    /// Response written and invite marked used
    Committed,
    /// Invite was already consumed; nothing written
    AlreadyUsed,
    /// Invite does not exist; nothing written
    NotFound,
}

/// Outcome of creating an invite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// New invite stored
    Created,
    /// An invite with the same token exists and was left untouched
    AlreadyExists,
}

/// Outcome of patching a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// Fields merged into the document
    Patched,
    /// No document with that id
    NotFound,
}

/// Capability used by the token lifecycle engine
#[async_trait]
pub trait InviteStore: Send + Sync {
    /// Fetch the invite for a token
    ///
    /// The token is trimmed; an empty token is never found.
    async fn get_invite(&self, token: &str) -> StoreResult<Option<Invite>>;

    /// Persist a reply and consume its invite as one atomic unit
    ///
    /// The response is merged into `responses/<token>` and the invite's
    /// `usedAt` set to `used_at`, but only if the invite still exists with a
    /// null `usedAt` at write time. Either both writes land or neither does.
    async fn commit_reply(
        &self,
        response: &RsvpResponse,
        used_at: DateTime<Utc>,
    ) -> StoreResult<ReplyCommit>;
}

/// Capability used by the admin panel
#[async_trait]
pub trait AdminStore: Send + Sync {
    /// Every document of a collection as `{id, ...fields}`, ordered by id
    async fn list_documents(&self, collection: Collection) -> StoreResult<Vec<Document>>;

    /// Store a new invite unless one with the same token exists
    async fn create_invite(&self, token: &str, document: Document) -> StoreResult<CreateOutcome>;

    /// Merge `fields` into an existing document without schema checks
    async fn patch_document(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> StoreResult<PatchOutcome>;
}

/// Trim a lookup key, rejecting blank keys
#[must_use]
pub fn lookup_key(token: &str) -> Option<&str> {
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Whether an invite document has been consumed
///
/// Any non-null `usedAt` counts as consumed.
#[must_use]
pub fn is_consumed(invite: &Document) -> bool {
    invite.get(fields::USED_AT).is_some_and(|v| !v.is_null())
}

/// Document shape returned by admin listings
#[must_use]
pub fn with_id(id: &str, document: Document) -> Document {
    let mut listed = Document::new();
    listed.insert(fields::ID.to_owned(), Value::String(id.to_owned()));
    listed.extend(document);
    listed
}

/// Shallow merge, later fields win
pub fn merge_into(target: &mut Document, fields: Document) {
    target.extend(fields);
}

/// Encode a timestamp the way documents store it
///
/// # Errors
///
/// Returns an error if serialization fails
pub fn timestamp_value(at: DateTime<Utc>) -> StoreResult<Value> {
    Ok(serde_json::to_value(at)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_key_trims() {
        assert_eq!(lookup_key("  AB12cd "), Some("AB12cd"));
        assert_eq!(lookup_key("   "), None);
        assert_eq!(lookup_key(""), None);
    }

    #[test]
    fn test_is_consumed() {
        let mut doc = Document::new();
        assert!(!is_consumed(&doc));
        doc.insert("usedAt".to_owned(), Value::Null);
        assert!(!is_consumed(&doc));
        doc.insert("usedAt".to_owned(), json!("2025-06-01T12:00:00Z"));
        assert!(is_consumed(&doc));
    }

    #[test]
    fn test_with_id_prepends_id() {
        let mut doc = Document::new();
        doc.insert("guestName".to_owned(), json!("Sam"));
        let listed = with_id("AB12cd", doc);
        assert_eq!(listed["id"], "AB12cd");
        assert_eq!(listed["guestName"], "Sam");
    }
}
