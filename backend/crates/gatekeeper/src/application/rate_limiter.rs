//! Rate Limiter
//!
//! Sliding-window limiter over an injected [`RateLimitStore`]. The store
//! call is the atomic step; this layer picks the policy per action class,
//! bounds the call with a timeout and degrades open when the store is
//! missing or failing.

use std::sync::Arc;
use std::time::Duration;

use platform::rate_limit::{RateLimitConfig, RateLimitResult, RateLimitStore, rate_limit_key};

use crate::application::config::GatekeeperConfig;

/// Group of actions sharing one quota
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionClass {
    /// Sign-in and sign-up attempts
    Auth,
}

impl ActionClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionClass::Auth => "auth",
        }
    }
}

/// Rate limiter
pub struct RateLimiter<S>
where
    S: RateLimitStore + Sync,
{
    store: Option<Arc<S>>,
    auth: RateLimitConfig,
    timeout: Duration,
}

impl<S> RateLimiter<S>
where
    S: RateLimitStore + Sync,
{
    /// `store: None` means rate limiting is unconfigured; every call is allowed
    pub fn new(store: Option<Arc<S>>, config: &GatekeeperConfig) -> Self {
        Self {
            store,
            auth: config.auth_rate_limit.clone(),
            timeout: config.store_timeout,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    pub fn policy(&self, action: ActionClass) -> &RateLimitConfig {
        match action {
            ActionClass::Auth => &self.auth,
        }
    }

    pub async fn check_and_consume(&self, identifier: &str, action: ActionClass) -> RateLimitResult {
        let now_ms = chrono::Utc::now().timestamp_millis();
        self.check_and_consume_at(identifier, action, now_ms).await
    }

    /// Record one attempt at `now_ms` if the window has room
    pub async fn check_and_consume_at(
        &self,
        identifier: &str,
        action: ActionClass,
        now_ms: i64,
    ) -> RateLimitResult {
        let policy = self.policy(action);

        let Some(store) = &self.store else {
            tracing::debug!(action = action.as_str(), "Rate limit store not configured; allowing");
            return RateLimitResult::allow_unmetered(policy, now_ms);
        };

        let key = rate_limit_key(action.as_str(), identifier);
        let attempt = store.record_attempt(&key, now_ms, policy.window_ms(), policy.max_requests);

        match tokio::time::timeout(self.timeout, attempt).await {
            Ok(Ok(snapshot)) => {
                let result = RateLimitResult::from_snapshot(snapshot, policy, now_ms);
                if !result.allowed {
                    tracing::info!(
                        action = action.as_str(),
                        reset_at_ms = result.reset_at_ms,
                        "Rate limit reached"
                    );
                }
                result
            }
            Ok(Err(e)) => {
                tracing::warn!(action = action.as_str(), error = %e, "Rate limit store failed; allowing");
                RateLimitResult::allow_unmetered(policy, now_ms)
            }
            Err(_) => {
                tracing::warn!(
                    action = action.as_str(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Rate limit store timed out; allowing"
                );
                RateLimitResult::allow_unmetered(policy, now_ms)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::rate_limit::{MemoryRateLimitStore, StoreError, WindowSnapshot};

    const WINDOW_MS: i64 = 15 * 60 * 1000;
    const T0: i64 = 1_700_000_000_000;

    struct FailingStore;

    impl RateLimitStore for FailingStore {
        async fn record_attempt(
            &self,
            _key: &str,
            _now_ms: i64,
            _window_ms: i64,
            _limit: u32,
        ) -> Result<WindowSnapshot, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    struct StalledStore;

    impl RateLimitStore for StalledStore {
        async fn record_attempt(
            &self,
            _key: &str,
            _now_ms: i64,
            _window_ms: i64,
            _limit: u32,
        ) -> Result<WindowSnapshot, StoreError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Err(StoreError::Unavailable("unreachable".into()))
        }
    }

    fn limiter() -> RateLimiter<MemoryRateLimitStore> {
        RateLimiter::new(
            Some(Arc::new(MemoryRateLimitStore::new())),
            &GatekeeperConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_five_allowed_then_sixth_rejected() {
        let limiter = limiter();

        for i in 0..5 {
            let result = limiter
                .check_and_consume_at("203.0.113.7", ActionClass::Auth, T0 + i * 1_000)
                .await;
            assert!(result.allowed, "attempt {}", i + 1);
            assert_eq!(result.remaining, 4 - i as u32);
        }

        let sixth = limiter
            .check_and_consume_at("203.0.113.7", ActionClass::Auth, T0 + 10_000)
            .await;
        assert!(!sixth.allowed);
        assert_eq!(sixth.remaining, 0);
        assert_eq!(sixth.reset_at_ms, T0 + WINDOW_MS);
        assert!(sixth.reset_at_ms > T0 + 10_000);
    }

    #[tokio::test]
    async fn test_allowed_again_after_reset() {
        let limiter = limiter();
        for i in 0..5 {
            limiter
                .check_and_consume_at("client", ActionClass::Auth, T0 + i * 60_000)
                .await;
        }
        let rejected = limiter
            .check_and_consume_at("client", ActionClass::Auth, T0 + 300_000)
            .await;
        assert!(!rejected.allowed);

        // Only the oldest attempt has left the window
        let after = limiter
            .check_and_consume_at("client", ActionClass::Auth, rejected.reset_at_ms)
            .await;
        assert!(after.allowed);
        assert_eq!(after.remaining, 0);

        let still_full = limiter
            .check_and_consume_at("client", ActionClass::Auth, rejected.reset_at_ms + 1)
            .await;
        assert!(!still_full.allowed);
        assert_eq!(still_full.reset_at_ms, T0 + 60_000 + WINDOW_MS);
    }

    #[tokio::test]
    async fn test_identifiers_are_independent() {
        let limiter = limiter();
        for i in 0..5 {
            limiter.check_and_consume_at("a", ActionClass::Auth, T0 + i).await;
        }
        assert!(!limiter.check_and_consume_at("a", ActionClass::Auth, T0 + 10).await.allowed);
        assert!(limiter.check_and_consume_at("b", ActionClass::Auth, T0 + 10).await.allowed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_admit_exactly_cap() {
        let limiter = Arc::new(limiter());

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    limiter
                        .check_and_consume_at("198.51.100.1", ActionClass::Auth, T0)
                        .await
                        .allowed
                })
            })
            .collect();

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 5);
    }

    #[tokio::test]
    async fn test_unconfigured_store_allows() {
        let limiter: RateLimiter<MemoryRateLimitStore> =
            RateLimiter::new(None, &GatekeeperConfig::default());
        assert!(!limiter.is_configured());
        for i in 0..20 {
            let result = limiter.check_and_consume_at("x", ActionClass::Auth, T0 + i).await;
            assert!(result.allowed);
            assert_eq!(result.remaining, 5);
        }
    }

    #[tokio::test]
    async fn test_failing_store_allows() {
        let limiter = RateLimiter::new(Some(Arc::new(FailingStore)), &GatekeeperConfig::default());
        for i in 0..10 {
            assert!(limiter.check_and_consume_at("x", ActionClass::Auth, T0 + i).await.allowed);
        }
    }

    #[tokio::test]
    async fn test_stalled_store_times_out_open() {
        let config = GatekeeperConfig {
            store_timeout: Duration::from_millis(20),
            ..GatekeeperConfig::default()
        };
        let limiter = RateLimiter::new(Some(Arc::new(StalledStore)), &config);
        let result = limiter.check_and_consume("x", ActionClass::Auth).await;
        assert!(result.allowed);
    }
}
