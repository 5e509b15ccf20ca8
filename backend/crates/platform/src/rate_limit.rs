//! Rate Limiting Infrastructure
//!
//! Sliding-window rate limiting abstractions:
//! - [`RateLimitConfig`] - cap and window length for one action class
//! - [`RateLimitStore`] - the shared counting store; one call evicts, counts
//!   and conditionally records an attempt as a single atomic step
//! - [`RateLimitResult`] - the caller-facing decision derived from a
//!   [`WindowSnapshot`]
//! - [`MemoryRateLimitStore`] - process-local store for tests and
//!   single-instance development

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;

use crate::crypto::sha256_hex;

/// Rate limit configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum attempts allowed in the window
    pub max_requests: u32,
    /// Sliding window length
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }
}

/// State of one identifier's window right after a store call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSnapshot {
    /// Whether this call's attempt was recorded
    pub admitted: bool,
    /// Attempts in the window after the call (including this one if admitted)
    pub count: u32,
    /// Timestamp of the oldest attempt still in the window
    pub oldest_ms: Option<i64>,
}

/// Rate limit check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    /// When the oldest attempt leaves the window (Unix ms)
    pub reset_at_ms: i64,
}

impl RateLimitResult {
    /// Derive the decision from a store snapshot
    pub fn from_snapshot(snapshot: WindowSnapshot, config: &RateLimitConfig, now_ms: i64) -> Self {
        let oldest_ms = snapshot.oldest_ms.unwrap_or(now_ms);
        Self {
            allowed: snapshot.admitted,
            remaining: config.max_requests.saturating_sub(snapshot.count),
            reset_at_ms: oldest_ms + config.window_ms(),
        }
    }

    /// Decision used when the counting store cannot be consulted
    pub fn allow_unmetered(config: &RateLimitConfig, now_ms: i64) -> Self {
        Self {
            allowed: true,
            remaining: config.max_requests,
            reset_at_ms: now_ms,
        }
    }
}

/// Counting store failure
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Rate limit store unavailable: {0}")]
    Unavailable(String),

    #[error("Rate limit store returned an unexpected reply: {0}")]
    Protocol(String),
}

/// Build the store key for an identifier and action class
///
/// The identifier is hashed so arbitrary header content never becomes part
/// of a key.
pub fn rate_limit_key(action: &str, identifier: &str) -> String {
    format!("rl:{}:{}", action, sha256_hex(identifier.as_bytes()))
}

/// Trait for rate limit storage backends
///
/// Implementations must perform the whole call atomically with respect to
/// other callers on the same key: drop attempts at or before
/// `now_ms - window_ms`, then record `now_ms` only if fewer than `limit`
/// attempts remain. A separate read followed by a separate write is not a
/// valid implementation.
#[trait_variant::make(RateLimitStore: Send)]
pub trait LocalRateLimitStore {
    async fn record_attempt(
        &self,
        key: &str,
        now_ms: i64,
        window_ms: i64,
        limit: u32,
    ) -> Result<WindowSnapshot, StoreError>;
}

/// Attempts recorded for one key
#[derive(Debug, Default)]
struct Window {
    attempts: VecDeque<i64>,
    /// Last attempt plus the key's own window length
    expires_at_ms: i64,
}

/// In-process sliding window store
///
/// Only correct for a single server process; multi-instance deployments
/// need a shared store. Idle keys are aged out against the window they were
/// recorded with, so keys of different action classes never evict each other.
#[derive(Debug, Default)]
pub struct MemoryRateLimitStore {
    state: Mutex<Windows>,
}

#[derive(Debug, Default)]
struct Windows {
    by_key: HashMap<String, Window>,
    /// No key expires before this instant
    next_expiry_ms: i64,
}

impl Windows {
    /// Drop keys whose own window has fully passed
    fn sweep(&mut self, now_ms: i64) {
        if now_ms < self.next_expiry_ms {
            return;
        }
        self.by_key.retain(|_, window| window.expires_at_ms > now_ms);
        self.next_expiry_ms = self
            .by_key
            .values()
            .map(|window| window.expires_at_ms)
            .min()
            .unwrap_or(i64::MAX);
    }
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of identifiers currently holding attempts
    pub async fn tracked_keys(&self) -> usize {
        self.state.lock().await.by_key.len()
    }
}

impl RateLimitStore for MemoryRateLimitStore {
    async fn record_attempt(
        &self,
        key: &str,
        now_ms: i64,
        window_ms: i64,
        limit: u32,
    ) -> Result<WindowSnapshot, StoreError> {
        let cutoff = now_ms - window_ms;
        let mut state = self.state.lock().await;
        state.sweep(now_ms);

        let window = state.by_key.entry(key.to_string()).or_default();
        while let Some(&front) = window.attempts.front() {
            if front <= cutoff {
                window.attempts.pop_front();
            } else {
                break;
            }
        }

        let admitted = (window.attempts.len() as u64) < u64::from(limit);
        if admitted {
            window.attempts.push_back(now_ms);
        }
        if let Some(&last) = window.attempts.back() {
            window.expires_at_ms = last + window_ms;
        }

        let snapshot = WindowSnapshot {
            admitted,
            count: window.attempts.len() as u32,
            oldest_ms: window.attempts.front().copied(),
        };

        if window.attempts.is_empty() {
            state.by_key.remove(key);
        } else {
            let expires_at_ms = window.expires_at_ms;
            state.next_expiry_ms = state.next_expiry_ms.min(expires_at_ms);
        }

        Ok(snapshot)
    }
}
