// ABOUTME: Admin record operations: bulk listing, invite creation and the patch escape hatch
// ABOUTME: Every operation takes an AdminPrincipal so only authenticated callers reach the store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use rsvp_core::models::{Collection, Document};
use rsvp_core::{constants::fields, tokens};

use crate::admin::AdminPrincipal;
use crate::database_plugins::{timestamp_value, AdminStore, CreateOutcome, PatchOutcome};
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;

/// Every invite and response, as returned by `GET /admin/data`
#[derive(Debug, Clone, Serialize)]
pub struct AdminSnapshot {
    /// Invite documents as `{id, ...fields}`
    pub invites: Vec<Document>,
    /// Response documents as `{id, ...fields}`
    pub responses: Vec<Document>,
}

/// Admin record management
#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn AdminStore>,
}

impl AdminService {
    /// Create a service over an injected store
    #[must_use]
    pub fn new(store: Arc<dyn AdminStore>) -> Self {
        Self { store }
    }

    /// List every record of both collections
    ///
    /// # Errors
    ///
    /// Returns a storage error if either listing fails
    pub async fn list_all(&self, admin: &AdminPrincipal) -> AppResult<AdminSnapshot> {
        let invites = self.store.list_documents(Collection::Invites).await?;
        let responses = self.store.list_documents(Collection::Responses).await?;
        AppLogger::log_admin_operation(admin.username(), "list", "*", "*");
        Ok(AdminSnapshot { invites, responses })
    }

    /// Create an invite from a request body, returning its id
    ///
    /// The token comes from `token`, falling back to `id`. Extra fields are
    /// stored alongside; `token`, `createdAt` and `usedAt` are always set by
    /// the server.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` when the body is not an object or has no token
    /// - `ResourceAlreadyExists` when the token is taken
    /// - `StorageError` when the store fails
    pub async fn create_invite(&self, admin: &AdminPrincipal, body: Value) -> AppResult<String> {
        let Value::Object(mut extra) = body else {
            return Err(AppError::invalid_input("Request body must be a JSON object"));
        };

        let token = [fields::TOKEN, fields::ID]
            .iter()
            .find_map(|key| extra.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .unwrap_or_default()
            .to_owned();
        if token.is_empty() {
            return Err(AppError::invalid_input("token is required"));
        }
        if !tokens::is_well_formed_token(&token) {
            warn!(token = %token, "Creating invite with an ill-formed token");
        }

        extra.remove(fields::TOKEN);
        extra.remove(fields::ID);

        let mut document = extra;
        document.insert(fields::TOKEN.to_owned(), Value::String(token.clone()));
        document.insert(fields::CREATED_AT.to_owned(), timestamp_value(Utc::now())?);
        document.insert(fields::USED_AT.to_owned(), Value::Null);

        match self.store.create_invite(&token, document).await? {
            CreateOutcome::Created => {
                AppLogger::log_admin_operation(
                    admin.username(),
                    "create",
                    Collection::Invites.as_str(),
                    &token,
                );
                Ok(token)
            }
            CreateOutcome::AlreadyExists => Err(AppError::conflict("Invite already exists")),
        }
    }

    /// Merge arbitrary fields into an existing record
    ///
    /// No schema checks are made; this is the only way to reset a used token.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for an unknown collection or a non-object body
    /// - `ResourceNotFound` when the record does not exist
    /// - `StorageError` when the store fails
    pub async fn patch_record(
        &self,
        admin: &AdminPrincipal,
        collection: &str,
        id: &str,
        body: Value,
    ) -> AppResult<()> {
        let collection: Collection = collection
            .parse()
            .map_err(|_| AppError::invalid_input("Invalid collection"))?;
        let Value::Object(fields) = body else {
            return Err(AppError::invalid_input("Request body must be a JSON object"));
        };

        match self.store.patch_document(collection, id, fields).await? {
            PatchOutcome::Patched => {
                AppLogger::log_admin_operation(admin.username(), "patch", collection.as_str(), id);
                Ok(())
            }
            PatchOutcome::NotFound => Err(AppError::not_found(format!(
                "No document {id} in {}",
                collection.as_str()
            ))),
        }
    }
}
