// ABOUTME: Fixed-window rate limiter keyed by client, method and path
// ABOUTME: Process-local counters in a DashMap with a background sweep of expired windows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Fixed-Window Rate Limiting
//!
//! The first request for a key opens a window of the configured length with
//! a count of one. Later requests inside the window increment the count;
//! once the count exceeds the limit the request is rejected. A request
//! arriving after the window closed opens a fresh one.
//!
//! State is process-local. Expired windows are dropped by a periodic sweep
//! so the map does not grow with every client ever seen.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use crate::config::RateLimitConfig;

/// Rate limit state reported to the client after a check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitInfo {
    /// Whether this request is over the limit
    pub is_rate_limited: bool,
    /// Requests allowed per window
    pub limit: u32,
    /// Requests left in the current window
    pub remaining: u32,
    /// When the current window closes
    pub reset_at: DateTime<Utc>,
}

/// Internal limiter failures; callers fail open on these
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateLimitError {
    /// Window length cannot be represented as a timestamp offset
    #[error("rate limit window of {0:?} is out of range")]
    WindowOutOfRange(Duration),
    /// A window's counter cannot be incremented
    #[error("request counter overflow for key {0}")]
    CounterOverflow(String),
    /// Window end falls outside the representable time range
    #[error("window end overflows the clock")]
    ClockOverflow,
}

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Fixed-window request counter
#[derive(Debug)]
pub struct FixedWindowRateLimiter {
    windows: Arc<DashMap<String, WindowEntry>>,
    limit: u32,
    window: chrono::Duration,
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl FixedWindowRateLimiter {
    /// Create a limiter without a background sweep
    ///
    /// # Errors
    ///
    /// Returns an error if the window cannot be represented
    pub fn new(limit: u32, window: Duration) -> Result<Self, RateLimitError> {
        let window =
            chrono::Duration::from_std(window).map_err(|_| RateLimitError::WindowOutOfRange(window))?;
        Ok(Self {
            windows: Arc::new(DashMap::new()),
            limit,
            window,
            shutdown_tx: None,
        })
    }

    /// Create a limiter from configuration and start its sweep task
    ///
    /// Must be called inside a Tokio runtime. The task stops when the
    /// limiter is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the window cannot be represented
    pub fn from_config(config: &RateLimitConfig) -> Result<Self, RateLimitError> {
        let mut limiter = Self::new(config.max_requests, config.window())?;

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let windows = limiter.windows.clone();
        let sweep_interval = config.sweep_interval();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(sweep_interval);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let removed = Self::sweep(&windows, Utc::now());
                        if removed > 0 {
                            debug!(removed, remaining = windows.len(), "Swept expired rate limit windows");
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        debug!("Rate limit sweep task received shutdown signal");
                        break;
                    }
                }
            }
        });

        limiter.shutdown_tx = Some(shutdown_tx);
        Ok(limiter)
    }

    /// Requests allowed per window
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Count a request for `key` now
    ///
    /// # Errors
    ///
    /// Returns an error on counter or clock overflow
    pub fn check(&self, key: &str) -> Result<RateLimitInfo, RateLimitError> {
        self.check_at(key, Utc::now())
    }

    /// Count a request for `key` at the given instant
    ///
    /// # Errors
    ///
    /// Returns an error on counter or clock overflow
    pub fn check_at(&self, key: &str, now: DateTime<Utc>) -> Result<RateLimitInfo, RateLimitError> {
        let mut entry = self.windows.entry(key.to_owned()).or_insert(WindowEntry {
            count: 0,
            reset_at: now,
        });

        if entry.count == 0 || now > entry.reset_at {
            let reset_at = now
                .checked_add_signed(self.window)
                .ok_or(RateLimitError::ClockOverflow)?;
            *entry = WindowEntry { count: 1, reset_at };
        } else {
            entry.count = entry
                .count
                .checked_add(1)
                .ok_or_else(|| RateLimitError::CounterOverflow(key.to_owned()))?;
        }

        Ok(RateLimitInfo {
            is_rate_limited: entry.count > self.limit,
            limit: self.limit,
            remaining: self.limit.saturating_sub(entry.count),
            reset_at: entry.reset_at,
        })
    }

    /// Drop every window that closed before `now`
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        Self::sweep(&self.windows, now)
    }

    /// Number of tracked windows
    #[must_use]
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }

    fn sweep(windows: &DashMap<String, WindowEntry>, now: DateTime<Utc>) -> usize {
        let before = windows.len();
        windows.retain(|_, entry| entry.reset_at >= now);
        before.saturating_sub(windows.len())
    }
}

impl Drop for FixedWindowRateLimiter {
    fn drop(&mut self) {
        if let Some(tx) = &self.shutdown_tx {
            if let Err(e) = tx.try_send(()) {
                debug!(error = ?e, "Rate limit sweep shutdown signal send failed (channel likely closed)");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> FixedWindowRateLimiter {
        FixedWindowRateLimiter::new(3, Duration::from_secs(300)).unwrap()
    }

    #[test]
    fn test_first_request_opens_window() {
        let limiter = limiter();
        let now = Utc::now();
        let info = limiter.check_at("k", now).unwrap();

        assert!(!info.is_rate_limited);
        assert_eq!(info.remaining, 2);
        assert_eq!(info.reset_at, now + chrono::Duration::seconds(300));
    }

    #[test]
    fn test_request_over_limit_is_rejected() {
        let limiter = limiter();
        let now = Utc::now();
        for _ in 0..3 {
            assert!(!limiter.check_at("k", now).unwrap().is_rate_limited);
        }
        let info = limiter.check_at("k", now).unwrap();
        assert!(info.is_rate_limited);
        assert_eq!(info.remaining, 0);
    }

    #[test]
    fn test_window_resets_after_expiry() {
        let limiter = limiter();
        let start = Utc::now();
        for _ in 0..4 {
            limiter.check_at("k", start).unwrap();
        }
        let later = start + chrono::Duration::seconds(301);
        let info = limiter.check_at("k", later).unwrap();
        assert!(!info.is_rate_limited);
        assert_eq!(info.remaining, 2);
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = limiter();
        let now = Utc::now();
        for _ in 0..4 {
            limiter.check_at("a", now).unwrap();
        }
        assert!(!limiter.check_at("b", now).unwrap().is_rate_limited);
    }

    #[test]
    fn test_sweep_drops_only_expired_windows() {
        let limiter = limiter();
        let start = Utc::now();
        limiter.check_at("old", start).unwrap();
        limiter
            .check_at("fresh", start + chrono::Duration::seconds(200))
            .unwrap();

        let removed = limiter.sweep_expired(start + chrono::Duration::seconds(301));
        assert_eq!(removed, 1);
        assert_eq!(limiter.tracked_keys(), 1);
    }
}
