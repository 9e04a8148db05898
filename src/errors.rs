// ABOUTME: Error types for the RSVP server crate
// ABOUTME: Re-exports the core AppError and maps store failures onto it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling System
//!
//! The error taxonomy lives in `rsvp-core`; this module re-exports it so
//! server code can keep using `crate::errors::{AppError, AppResult}`, and
//! adds the conversion from document store failures.

pub use rsvp_core::errors::{AppError, AppResult, ErrorCode, ErrorResponse};

use crate::database_plugins::StoreError;

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        let message = error.to_string();
        Self::storage(error.code(), message).with_source(error)
    }
}
