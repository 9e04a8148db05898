// ABOUTME: Database factory selecting a document store backend from configuration
// ABOUTME: Provides a single Database type that delegates to the in-memory or SQLite store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//! Database factory for creating document store backends
//!
//! The backend is picked from the configured [`DatabaseUrl`]; callers only
//! ever see the [`InviteStore`] and [`AdminStore`] capabilities.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use rsvp_core::models::{Collection, Document, Invite, RsvpResponse};

use super::memory::MemoryStore;
use super::sqlite::SqliteDatabase;
use super::{
    AdminStore, CreateOutcome, InviteStore, PatchOutcome, ReplyCommit, StoreResult,
};
use crate::config::DatabaseUrl;

/// Supported backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    /// `SQLite` file or in-memory database
    SQLite,
    /// Process-local maps
    Memory,
}

/// Database instance wrapper that delegates to the appropriate implementation
#[derive(Debug, Clone)]
pub enum Database {
    /// `SQLite` backend
    SQLite(SqliteDatabase),
    /// In-memory backend
    Memory(MemoryStore),
}

impl Database {
    /// Create a backend for the configured location
    ///
    /// # Errors
    ///
    /// Returns an error if the `SQLite` connection or migrations fail
    pub async fn new(url: &DatabaseUrl) -> StoreResult<Self> {
        match url {
            DatabaseUrl::InMemory => {
                info!("Initializing in-memory document store");
                Ok(Self::Memory(MemoryStore::new()))
            }
            DatabaseUrl::SQLite { .. } | DatabaseUrl::SQLiteMemory => {
                info!("Initializing SQLite document store at {url}");
                let db = SqliteDatabase::new(&url.to_connection_string()).await?;
                info!("SQLite document store initialized successfully");
                Ok(Self::SQLite(db))
            }
        }
    }

    /// Get the backend type
    #[must_use]
    pub const fn database_type(&self) -> DatabaseType {
        match self {
            Self::SQLite(_) => DatabaseType::SQLite,
            Self::Memory(_) => DatabaseType::Memory,
        }
    }

    /// Get a descriptive string for the current backend
    #[must_use]
    pub const fn backend_info(&self) -> &'static str {
        match self {
            Self::SQLite(_) => "SQLite",
            Self::Memory(_) => "In-memory (not persisted)",
        }
    }
}

#[async_trait]
impl InviteStore for Database {
    async fn get_invite(&self, token: &str) -> StoreResult<Option<Invite>> {
        match self {
            Self::SQLite(db) => db.get_invite(token).await,
            Self::Memory(db) => db.get_invite(token).await,
        }
    }

    async fn commit_reply(
        &self,
        response: &RsvpResponse,
        used_at: DateTime<Utc>,
    ) -> StoreResult<ReplyCommit> {
        match self {
            Self::SQLite(db) => db.commit_reply(response, used_at).await,
            Self::Memory(db) => db.commit_reply(response, used_at).await,
        }
    }
}

#[async_trait]
impl AdminStore for Database {
    async fn list_documents(&self, collection: Collection) -> StoreResult<Vec<Document>> {
        match self {
            Self::SQLite(db) => db.list_documents(collection).await,
            Self::Memory(db) => db.list_documents(collection).await,
        }
    }

    async fn create_invite(&self, token: &str, document: Document) -> StoreResult<CreateOutcome> {
        match self {
            Self::SQLite(db) => db.create_invite(token, document).await,
            Self::Memory(db) => db.create_invite(token, document).await,
        }
    }

    async fn patch_document(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> StoreResult<PatchOutcome> {
        match self {
            Self::SQLite(db) => db.patch_document(collection, id, fields).await,
            Self::Memory(db) => db.patch_document(collection, id, fields).await,
        }
    }
}
