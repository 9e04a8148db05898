// ABOUTME: In-process document store backed by ordered maps behind an async RwLock
// ABOUTME: Used for tests and DATABASE_URL=memory; contents are lost on shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use rsvp_core::constants::fields;
use rsvp_core::models::{Collection, Document, Invite, RsvpResponse};

use super::{
    is_consumed, lookup_key, merge_into, timestamp_value, with_id, AdminStore, CreateOutcome,
    InviteStore, PatchOutcome, ReplyCommit, StoreResult,
};

#[derive(Debug, Default)]
struct Collections {
    invites: BTreeMap<String, Document>,
    responses: BTreeMap<String, Document>,
}

impl Collections {
    const fn get(&self, collection: Collection) -> &BTreeMap<String, Document> {
        match collection {
            Collection::Invites => &self.invites,
            Collection::Responses => &self.responses,
        }
    }

    fn get_mut(&mut self, collection: Collection) -> &mut BTreeMap<String, Document> {
        match collection {
            Collection::Invites => &mut self.invites,
            Collection::Responses => &mut self.responses,
        }
    }
}

/// Document store held entirely in process memory
///
/// Clones share the same underlying maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw document lookup, mostly for tests and diagnostics
    pub async fn get_document(&self, collection: Collection, id: &str) -> Option<Document> {
        self.inner.read().await.get(collection).get(id).cloned()
    }

    /// Number of documents in a collection
    pub async fn count(&self, collection: Collection) -> usize {
        self.inner.read().await.get(collection).len()
    }
}

#[async_trait]
impl InviteStore for MemoryStore {
    async fn get_invite(&self, token: &str) -> StoreResult<Option<Invite>> {
        let Some(token) = lookup_key(token) else {
            return Ok(None);
        };
        let guard = self.inner.read().await;
        Ok(guard
            .invites
            .get(token)
            .map(|doc| Invite::from_document(token, doc)))
    }

    async fn commit_reply(
        &self,
        response: &RsvpResponse,
        used_at: DateTime<Utc>,
    ) -> StoreResult<ReplyCommit> {
        let response_doc = response.to_document()?;
        let used_at = timestamp_value(used_at)?;

        // The write lock makes the check and both writes one atomic unit
        let mut guard = self.inner.write().await;
        let Some(invite) = guard.invites.get_mut(&response.token) else {
            return Ok(ReplyCommit::NotFound);
        };
        if is_consumed(invite) {
            return Ok(ReplyCommit::AlreadyUsed);
        }
        invite.insert(fields::USED_AT.to_owned(), used_at);

        let stored = guard.responses.entry(response.token.clone()).or_default();
        merge_into(stored, response_doc);

        Ok(ReplyCommit::Committed)
    }
}

#[async_trait]
impl AdminStore for MemoryStore {
    async fn list_documents(&self, collection: Collection) -> StoreResult<Vec<Document>> {
        let guard = self.inner.read().await;
        Ok(guard
            .get(collection)
            .iter()
            .map(|(id, doc)| with_id(id, doc.clone()))
            .collect())
    }

    async fn create_invite(&self, token: &str, document: Document) -> StoreResult<CreateOutcome> {
        let mut guard = self.inner.write().await;
        if guard.invites.contains_key(token) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        guard.invites.insert(token.to_owned(), document);
        Ok(CreateOutcome::Created)
    }

    async fn patch_document(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> StoreResult<PatchOutcome> {
        let mut guard = self.inner.write().await;
        match guard.get_mut(collection).get_mut(id) {
            Some(document) => {
                merge_into(document, fields);
                Ok(PatchOutcome::Patched)
            }
            None => Ok(PatchOutcome::NotFound),
        }
    }
}
