// ABOUTME: Record models for invites and guest responses plus token lifecycle states
// ABOUTME: Converts between schema-less stored documents and typed records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{collections, fields, messages};
use crate::payload::RsvpPayload;

/// A stored record: a JSON object keyed by field name
pub type Document = Map<String, Value>;

/// The two document collections the server knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// Invite records keyed by token
    Invites,
    /// Guest replies keyed by token
    Responses,
}

impl Collection {
    /// Collection name as stored
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Invites => collections::INVITES,
            Self::Responses => collections::RESPONSES,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown collection name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid collection: {0}")]
pub struct UnknownCollection(pub String);

impl FromStr for Collection {
    type Err = UnknownCollection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            collections::INVITES => Ok(Self::Invites),
            collections::RESPONSES => Ok(Self::Responses),
            other => Err(UnknownCollection(other.to_owned())),
        }
    }
}

/// Guest answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsvpChoice {
    /// Attending
    Yes,
    /// Not attending
    No,
}

impl RsvpChoice {
    /// Parse an already-normalized answer
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "yes" => Some(Self::Yes),
            "no" => Some(Self::No),
            _ => None,
        }
    }
}

/// Lifecycle state of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenState {
    /// No invite exists for the token
    NotFound,
    /// Invite exists and has not been consumed
    Unused,
    /// Invite was consumed by a reply
    Used,
}

/// Typed view of an invite document
///
/// Invites are patched through the admin API without schema checks, so
/// reading one never fails: fields of an unexpected type read as absent,
/// except `usedAt`, which is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invite {
    /// Token, equal to the document id
    #[serde(default)]
    pub token: String,
    /// Display name assigned by the admin
    #[serde(default)]
    pub guest_name: Option<String>,
    /// Opaque routing tag
    #[serde(default)]
    pub route: Option<String>,
    /// Raw `usedAt` value; any non-null value means the token was consumed
    #[serde(default)]
    pub used_at: Option<Value>,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Invite {
    /// Read an invite from its stored document
    #[must_use]
    pub fn from_document(id: &str, document: &Document) -> Self {
        let text = |name: &str| {
            document
                .get(name)
                .and_then(Value::as_str)
                .map(ToOwned::to_owned)
        };
        Self {
            token: id.to_owned(),
            guest_name: text(fields::GUEST_NAME),
            route: text(fields::ROUTE),
            used_at: document
                .get(fields::USED_AT)
                .filter(|value| !value.is_null())
                .cloned(),
            created_at: text(fields::CREATED_AT)
                .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
                .map(|at| at.with_timezone(&Utc)),
        }
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> TokenState {
        if self.used_at.is_some() {
            TokenState::Used
        } else {
            TokenState::Unused
        }
    }
}

/// A guest reply as persisted in the `responses` collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpResponse {
    /// Token the reply was submitted with, also the document id
    pub token: String,
    /// Guest name copied from the invite at submission time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_name: Option<String>,
    /// Route copied from the invite at submission time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    /// Guest answer
    pub rsvp: RsvpChoice,
    /// Whether the guest declared allergies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<bool>,
    /// Present only when `allergies` is true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergy_description: Option<String>,
    /// Optional song request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub song_request: Option<String>,
    /// Server-assigned write time
    pub submitted_at: DateTime<Utc>,
}

impl RsvpResponse {
    /// Compose a response from the invite snapshot and a validated payload
    #[must_use]
    pub fn compose(invite: &Invite, payload: RsvpPayload, submitted_at: DateTime<Utc>) -> Self {
        Self {
            token: invite.token.clone(),
            guest_name: invite.guest_name.clone(),
            route: invite.route.clone(),
            rsvp: payload.rsvp,
            allergies: payload.allergies,
            allergy_description: payload.allergy_description,
            song_request: payload.song_request,
            submitted_at,
        }
    }

    /// Convert into a storable document
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_document(&self) -> Result<Document, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(serde::ser::Error::custom(format!(
                "response serialized to a non-object value: {other}"
            ))),
        }
    }
}

/// Result of a token status lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStatus {
    /// Trimmed lookup token
    pub token: String,
    /// Lifecycle state
    pub state: TokenState,
    /// Guest name, absent for unknown tokens
    pub guest_name: Option<String>,
    /// Route, absent for unknown tokens
    pub route: Option<String>,
    /// Stored `usedAt` for used tokens
    pub used_at: Option<Value>,
}

impl TokenStatus {
    /// Status for a token with no invite
    pub fn not_found(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            state: TokenState::NotFound,
            guest_name: None,
            route: None,
            used_at: None,
        }
    }

    /// Status derived from an existing invite
    pub fn from_invite(token: impl Into<String>, invite: &Invite) -> Self {
        Self {
            token: token.into(),
            state: invite.state(),
            guest_name: invite.guest_name.clone(),
            route: invite.route.clone(),
            used_at: invite.used_at.clone(),
        }
    }

    /// Whether the token can still be used for a reply
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.state == TokenState::Unused
    }

    /// Wire message for this status
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self.state {
            TokenState::NotFound => messages::TOKEN_NOT_FOUND,
            TokenState::Unused => messages::TOKEN_VALID,
            TokenState::Used => messages::TOKEN_NOT_VALID,
        }
    }
}

/// JSON body of a successful status lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStatusBody {
    /// Trimmed token
    pub token: String,
    /// Guest name
    pub guest_name: Option<String>,
    /// Route
    pub route: Option<String>,
    /// True only while the token is unused
    pub valid: bool,
    /// Null while unused
    pub used_at: Option<Value>,
    /// Human-readable status
    pub message: String,
}

impl From<&TokenStatus> for TokenStatusBody {
    fn from(status: &TokenStatus) -> Self {
        Self {
            token: status.token.clone(),
            guest_name: status.guest_name.clone(),
            route: status.route.clone(),
            valid: status.is_valid(),
            used_at: status.used_at.clone(),
            message: status.message().to_owned(),
        }
    }
}
