// ABOUTME: Core types and rules for the RSVP token server
// ABOUTME: Foundation crate with error handling, record models, payload validation and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # RSVP Core
//!
//! Foundation crate providing the framework-independent pieces of the RSVP
//! token server. Nothing in here performs I/O; the server crate wires these
//! types to storage and HTTP.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError` and `ErrorCode`
//! - **constants**: Wire messages, collection names and payload field names
//! - **models**: Invite and response records, token lifecycle states
//! - **payload**: Guest reply normalization and validation
//! - **tokens**: Token shape check, generation and invite URL building

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Invite/response records and token lifecycle states
pub mod models;

/// Guest reply payload normalization and validation
pub mod payload;

/// Token shape, generation and invite URL helpers
pub mod tokens;
