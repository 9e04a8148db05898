// ABOUTME: Application constants for the RSVP token server
// ABOUTME: Wire messages, collection names, reply payload field names and defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Human-readable messages returned on the wire
pub mod messages {
    /// Status message for a token that can still be used
    pub const TOKEN_VALID: &str = "Token is valid";
    /// Status message for a token that has already been consumed
    pub const TOKEN_NOT_VALID: &str = "Token is NOT valid";
    /// Message for tokens with no matching invite
    pub const TOKEN_NOT_FOUND: &str = "Token not found";
    /// Reply accepted and persisted
    pub const RECORD_WRITTEN: &str = "Record written successfully to the database";
    /// Reply could not be persisted
    pub const RECORD_NOT_WRITTEN: &str = "Record NOT written to the database";
    /// Reply endpoint throttled
    pub const TOO_MANY_REQUESTS: &str = "Too many requests. Please try again shortly.";
    /// Admin request without usable credentials
    pub const AUTH_REQUIRED: &str = "Authentication required";
    /// Admin request with wrong credentials
    pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
    /// Admin credentials missing from server configuration
    pub const ADMIN_NOT_CONFIGURED: &str = "Admin credentials not configured";
}

/// Document collection names
pub mod collections {
    /// Invite records, keyed by token
    pub const INVITES: &str = "invites";
    /// Guest replies, keyed by token
    pub const RESPONSES: &str = "responses";
}

/// Field names used in stored documents and reply payloads
pub mod fields {
    /// Document id, added to documents returned by admin listings
    pub const ID: &str = "id";
    /// Token field on both collections
    pub const TOKEN: &str = "token";
    /// Guest display name
    pub const GUEST_NAME: &str = "guestName";
    /// Opaque routing tag
    pub const ROUTE: &str = "route";
    /// Consumption timestamp on invites
    pub const USED_AT: &str = "usedAt";
    /// Creation timestamp on invites
    pub const CREATED_AT: &str = "createdAt";
    /// Submission timestamp on responses
    pub const SUBMITTED_AT: &str = "submittedAt";
    /// Guest answer
    pub const RSVP: &str = "rsvp";
    /// Whether the guest has allergies
    pub const ALLERGIES: &str = "allergies";
    /// Allergy details
    pub const ALLERGY_DESCRIPTION: &str = "allergyDescription";
    /// Song request
    pub const SONG_REQUEST: &str = "songRequest";
}

/// Fields a guest may send in a reply payload unless configured otherwise
pub const DEFAULT_REPLY_ALLOWED_FIELDS: [&str; 4] = [
    fields::RSVP,
    fields::ALLERGIES,
    fields::ALLERGY_DESCRIPTION,
    fields::SONG_REQUEST,
];

/// Realm announced in `WWW-Authenticate` challenges
pub const ADMIN_AUTH_REALM: &str = "RSVP Admin";

/// Service name used in structured logs
pub const SERVICE_NAME: &str = "rsvp-server";
