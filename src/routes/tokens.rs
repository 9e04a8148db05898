// ABOUTME: Guest-facing token route handlers for status, redirect and reply submission
// ABOUTME: Thin axum handlers translating HTTP into TokenLifecycleEngine calls
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Token routes
//!
//! - `GET  /token/:tokenId/status`
//! - `GET  /token/:tokenId/resolve`
//! - `POST /token/:tokenId/reply` (rate limited)

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header::LOCATION, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;

use rsvp_core::constants::{collections, messages};
use rsvp_core::models::{TokenState, TokenStatusBody};

use crate::errors::{AppError, AppResult};
use crate::lifecycle::TokenLifecycleEngine;
use crate::middleware::rate_limiting::{rate_limit_middleware, RateLimitLayerState};

/// Body of a successful reply
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyAccepted {
    /// Response record id, equal to the token
    pub record_id: String,
    /// Collection the record was written to
    pub firestore_collection: &'static str,
    /// Human-readable outcome
    pub message: &'static str,
}

/// Token routes implementation
pub struct TokenRoutes;

impl TokenRoutes {
    /// Create all token routes
    ///
    /// Only the reply route passes through the rate limiter.
    pub fn routes(engine: TokenLifecycleEngine, rate_limit: RateLimitLayerState) -> Router {
        let engine = Arc::new(engine);

        let reply = Router::new()
            .route("/token/:token_id/reply", post(handle_reply))
            .layer(middleware::from_fn_with_state(
                rate_limit,
                rate_limit_middleware,
            ))
            .with_state(engine.clone());

        Router::new()
            .route("/token/:token_id/status", get(handle_status))
            .route("/token/:token_id/resolve", get(handle_resolve))
            .with_state(engine)
            .merge(reply)
    }
}

/// Handle token status lookup
async fn handle_status(
    State(engine): State<Arc<TokenLifecycleEngine>>,
    Path(token_id): Path<String>,
) -> AppResult<Json<TokenStatusBody>> {
    let status = engine.get_status(&token_id).await?;
    if status.state == TokenState::NotFound {
        return Err(AppError::not_found(messages::TOKEN_NOT_FOUND));
    }
    Ok(Json(TokenStatusBody::from(&status)))
}

/// Handle redirect resolution
async fn handle_resolve(
    State(engine): State<Arc<TokenLifecycleEngine>>,
    Path(token_id): Path<String>,
) -> Response {
    let destination = engine.resolve_destination(&token_id).await.to_owned();
    (StatusCode::FOUND, [(LOCATION, destination)]).into_response()
}

/// Handle reply submission
async fn handle_reply(
    State(engine): State<Arc<TokenLifecycleEngine>>,
    Path(token_id): Path<String>,
    body: Bytes,
) -> Response {
    match engine.submit_reply(&token_id, &body).await {
        Ok(receipt) => (
            StatusCode::CREATED,
            Json(ReplyAccepted {
                record_id: receipt.record_id,
                firestore_collection: collections::RESPONSES,
                message: messages::RECORD_WRITTEN,
            }),
        )
            .into_response(),
        Err(e) if e.http_status() >= 500 => record_not_written(&token_id, &e),
        Err(e) => e.into_response(),
    }
}

/// 500 body naming the record that could not be written
fn record_not_written(token_id: &str, error: &AppError) -> Response {
    let (code, message) = error
        .storage_diagnostics()
        .unwrap_or_else(|| ("internal".to_owned(), error.message.clone()));
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "recordId": token_id.trim(),
            "firestoreCollection": collections::RESPONSES,
            "message": messages::RECORD_NOT_WRITTEN,
            "error": {
                "message": message,
                "code": code,
            },
        })),
    )
        .into_response()
}
