// ABOUTME: Guest reply payload normalization and validation
// ABOUTME: Pure functions turning an untrusted JSON body into a typed RsvpPayload
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Reply Payload Rules
//!
//! A reply body goes through [`normalize`] and then [`validate`]; the first
//! violated rule is reported. Checks run in a fixed order:
//!
//! 1. no fields outside the allowed set
//! 2. `rsvp` is `"yes"` or `"no"`
//! 3. `allergies`, when present, is a boolean
//! 4. `allergyDescription` is a non-blank string when `allergies` is true
//! 5. `songRequest`, when present, is a string

use std::collections::BTreeSet;

use serde_json::Value;

use crate::constants::{fields, DEFAULT_REPLY_ALLOWED_FIELDS};
use crate::errors::AppError;
use crate::models::{Document, RsvpChoice};

/// Reasons a reply payload is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Body is not valid JSON
    #[error("Malformed JSON body: {0}")]
    MalformedJson(String),
    /// Body is valid JSON but not an object
    #[error("Request body must be a JSON object.")]
    NotAnObject,
    /// Body has fields outside the allowed set
    #[error("Unknown field(s): {}", .0.join(", "))]
    UnknownFields(Vec<String>),
    /// `rsvp` missing or not yes/no
    #[error("Invalid RSVP value. Must be 'yes' or 'no'.")]
    InvalidRsvp,
    /// `allergies` present but not a boolean
    #[error("Allergies must be a boolean value.")]
    AllergiesNotBoolean,
    /// `allergies` is true without a usable description
    #[error("Allergy description is required when allergies are true.")]
    AllergyDescriptionRequired,
    /// `songRequest` present but not a string
    #[error("Song request must be a string.")]
    SongRequestNotString,
}

impl From<ValidationError> for AppError {
    fn from(error: ValidationError) -> Self {
        Self::invalid_input(error.to_string())
    }
}

/// Set of field names a guest may send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedFields(BTreeSet<String>);

impl AllowedFields {
    /// Build from an explicit list of names
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// Whether `name` is allowed
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    /// Allowed names in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for AllowedFields {
    fn default() -> Self {
        Self::new(DEFAULT_REPLY_ALLOWED_FIELDS)
    }
}

/// A reply that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsvpPayload {
    /// Guest answer
    pub rsvp: RsvpChoice,
    /// Whether the guest declared allergies
    pub allergies: Option<bool>,
    /// Kept only when `allergies` is true
    pub allergy_description: Option<String>,
    /// Non-empty song request
    pub song_request: Option<String>,
}

impl RsvpPayload {
    /// Parse raw request bytes, normalize and validate them
    ///
    /// An empty body is treated as an empty object, so it fails on `rsvp`.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule
    pub fn from_bytes(bytes: &[u8], allowed: &AllowedFields) -> Result<Self, ValidationError> {
        Self::from_document(parse_body(bytes)?, allowed)
    }

    /// Normalize and validate an already-parsed body
    ///
    /// # Errors
    ///
    /// Returns the first violated rule
    pub fn from_document(body: Document, allowed: &AllowedFields) -> Result<Self, ValidationError> {
        let body = normalize(body);
        validate(&body, allowed)?;

        let rsvp = body
            .get(fields::RSVP)
            .and_then(Value::as_str)
            .and_then(RsvpChoice::parse)
            .ok_or(ValidationError::InvalidRsvp)?;
        let allergies = body.get(fields::ALLERGIES).and_then(Value::as_bool);
        let allergy_description = if allergies == Some(true) {
            string_field(&body, fields::ALLERGY_DESCRIPTION)
        } else {
            None
        };

        Ok(Self {
            rsvp,
            allergies,
            allergy_description,
            song_request: string_field(&body, fields::SONG_REQUEST),
        })
    }
}

fn string_field(body: &Document, name: &str) -> Option<String> {
    body.get(name).and_then(Value::as_str).map(ToOwned::to_owned)
}

/// Parse a request body into a JSON object
///
/// # Errors
///
/// Returns an error for invalid JSON or a non-object body
pub fn parse_body(bytes: &[u8]) -> Result<Document, ValidationError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Document::new());
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ValidationError::NotAnObject),
        Err(e) => Err(ValidationError::MalformedJson(e.to_string())),
    }
}

/// Clean up guest-supplied values
///
/// `rsvp` is trimmed and lowercased. `allergyDescription` and `songRequest`
/// are trimmed and dropped entirely when nothing is left. Values of other
/// types are left for [`validate`] to judge.
#[must_use]
pub fn normalize(mut body: Document) -> Document {
    if let Some(Value::String(rsvp)) = body.get_mut(fields::RSVP) {
        *rsvp = rsvp.trim().to_lowercase();
    }

    for key in [fields::ALLERGY_DESCRIPTION, fields::SONG_REQUEST] {
        let trimmed = match body.get(key) {
            Some(Value::String(value)) => value.trim().to_owned(),
            _ => continue,
        };
        if trimmed.is_empty() {
            body.shift_remove(key);
        } else {
            body.insert(key.to_owned(), Value::String(trimmed));
        }
    }

    body
}

/// Check a normalized body against the reply rules
///
/// Unknown fields are reported in the order the client sent them.
///
/// # Errors
///
/// Returns the first violated rule
pub fn validate(body: &Document, allowed: &AllowedFields) -> Result<(), ValidationError> {
    let unknown: Vec<String> = body
        .keys()
        .filter(|key| !allowed.contains(key))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(ValidationError::UnknownFields(unknown));
    }

    let rsvp_ok = body
        .get(fields::RSVP)
        .and_then(Value::as_str)
        .and_then(RsvpChoice::parse)
        .is_some();
    if !rsvp_ok {
        return Err(ValidationError::InvalidRsvp);
    }

    let allergies = match body.get(fields::ALLERGIES) {
        None => None,
        Some(Value::Bool(flag)) => Some(*flag),
        Some(_) => return Err(ValidationError::AllergiesNotBoolean),
    };

    if allergies == Some(true) {
        let described = body
            .get(fields::ALLERGY_DESCRIPTION)
            .and_then(Value::as_str)
            .is_some_and(|description| !description.trim().is_empty());
        if !described {
            return Err(ValidationError::AllergyDescriptionRequired);
        }
    }

    match body.get(fields::SONG_REQUEST) {
        None | Some(Value::String(_)) => Ok(()),
        Some(_) => Err(ValidationError::SongRequestNotString),
    }
}
