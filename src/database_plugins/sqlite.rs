// ABOUTME: SQLite document store implementation using sqlx
// ABOUTME: Stores JSON documents in a single table keyed by (collection, id)
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::debug;

use rsvp_core::models::{Collection, Document, Invite, RsvpResponse};

use super::{
    lookup_key, merge_into, timestamp_value, with_id, AdminStore, CreateOutcome, InviteStore,
    PatchOutcome, ReplyCommit, StoreError, StoreResult,
};

/// `SQLite`-backed document store
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Connect and run migrations
    ///
    /// File databases are created if missing. In-memory databases use a
    /// single connection so every query sees the same data.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or migrations fail
    pub async fn new(database_url: &str) -> StoreResult<Self> {
        let in_memory = database_url.contains(":memory:");
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if in_memory || database_url.contains("mode=") {
            database_url.to_owned()
        } else {
            format!("{database_url}?mode=rwc")
        };

        let options = if in_memory {
            // Closing the only connection would drop the database
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = options.connect(&connection_options).await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if schema creation fails
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (collection, id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        debug!("SQLite document schema ready");
        Ok(())
    }

    async fn fetch_raw(
        tx: &mut Transaction<'_, Sqlite>,
        collection: Collection,
        id: &str,
    ) -> StoreResult<Option<String>> {
        let row = sqlx::query("SELECT data FROM documents WHERE collection = ? AND id = ?")
            .bind(collection.as_str())
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(row.map(|row| row.get::<String, _>("data")))
    }

    async fn upsert(
        tx: &mut Transaction<'_, Sqlite>,
        collection: Collection,
        id: &str,
        document: &Document,
    ) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO documents (collection, id, data, updated_at)
            VALUES (?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT (collection, id)
            DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at
            ",
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(serde_json::to_string(document)?)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

fn parse_document(collection: Collection, id: &str, raw: &str) -> StoreResult<Document> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(StoreError::corrupt(collection, id, "not a JSON object")),
        Err(e) => Err(StoreError::corrupt(collection, id, e)),
    }
}

#[async_trait]
impl InviteStore for SqliteDatabase {
    async fn get_invite(&self, token: &str) -> StoreResult<Option<Invite>> {
        let Some(token) = lookup_key(token) else {
            return Ok(None);
        };
        let row = sqlx::query("SELECT data FROM documents WHERE collection = ? AND id = ?")
            .bind(Collection::Invites.as_str())
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            let raw: String = row.get("data");
            let document = parse_document(Collection::Invites, token, &raw)?;
            Ok(Invite::from_document(token, &document))
        })
        .transpose()
    }

    async fn commit_reply(
        &self,
        response: &RsvpResponse,
        used_at: DateTime<Utc>,
    ) -> StoreResult<ReplyCommit> {
        let token = response.token.as_str();
        let response_doc = response.to_document()?;
        let used_at = timestamp_value(used_at)?;

        let mut tx = self.pool.begin().await?;

        // Compare-and-swap on usedAt. Must stay the first statement: a read
        // before it would hold a shared lock that cannot be upgraded while a
        // concurrent commit holds the write lock.
        let swapped = sqlx::query(
            r"
            UPDATE documents
            SET data = json_set(data, '$.usedAt', json(?)), updated_at = CURRENT_TIMESTAMP
            WHERE collection = ? AND id = ? AND json_extract(data, '$.usedAt') IS NULL
            ",
        )
        .bind(serde_json::to_string(&used_at)?)
        .bind(Collection::Invites.as_str())
        .bind(token)
        .execute(&mut *tx)
        .await?;

        if swapped.rows_affected() == 0 {
            let exists = Self::fetch_raw(&mut tx, Collection::Invites, token)
                .await?
                .is_some();
            return Ok(if exists {
                ReplyCommit::AlreadyUsed
            } else {
                ReplyCommit::NotFound
            });
        }

        let mut stored = match Self::fetch_raw(&mut tx, Collection::Responses, token).await? {
            Some(raw) => parse_document(Collection::Responses, token, &raw)?,
            None => Document::new(),
        };
        merge_into(&mut stored, response_doc);
        Self::upsert(&mut tx, Collection::Responses, token, &stored).await?;

        tx.commit().await?;
        Ok(ReplyCommit::Committed)
    }
}

#[async_trait]
impl AdminStore for SqliteDatabase {
    async fn list_documents(&self, collection: Collection) -> StoreResult<Vec<Document>> {
        let rows = sqlx::query("SELECT id, data FROM documents WHERE collection = ? ORDER BY id")
            .bind(collection.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let id: String = row.get("id");
                let raw: String = row.get("data");
                parse_document(collection, &id, &raw).map(|doc| with_id(&id, doc))
            })
            .collect()
    }

    async fn create_invite(&self, token: &str, document: Document) -> StoreResult<CreateOutcome> {
        let result = sqlx::query(
            r"
            INSERT INTO documents (collection, id, data)
            VALUES (?, ?, ?)
            ON CONFLICT (collection, id) DO NOTHING
            ",
        )
        .bind(Collection::Invites.as_str())
        .bind(token)
        .bind(serde_json::to_string(&document)?)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            Ok(CreateOutcome::AlreadyExists)
        } else {
            Ok(CreateOutcome::Created)
        }
    }

    async fn patch_document(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> StoreResult<PatchOutcome> {
        let mut tx = self.pool.begin().await?;
        // Write first so the transaction holds the write lock before reading
        let touched = sqlx::query(
            "UPDATE documents SET updated_at = CURRENT_TIMESTAMP WHERE collection = ? AND id = ?",
        )
        .bind(collection.as_str())
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if touched.rows_affected() == 0 {
            return Ok(PatchOutcome::NotFound);
        }
        let Some(raw) = Self::fetch_raw(&mut tx, collection, id).await? else {
            return Ok(PatchOutcome::NotFound);
        };
        let mut document = parse_document(collection, id, &raw)?;
        merge_into(&mut document, fields);
        Self::upsert(&mut tx, collection, id, &document).await?;
        tx.commit().await?;
        Ok(PatchOutcome::Patched)
    }
}
