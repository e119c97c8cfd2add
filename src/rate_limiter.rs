use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use crate::{clock::Clock, config::Config, policy::LimiterPolicy};

pub struct RateLimiter {
    policy: LimiterPolicy,
    clock: Arc<dyn Clock>,
    inner: Mutex<HashMap<String, ClientWindow>>,
}

#[derive(Debug, Clone)]
struct ClientWindow {
    count: u32,
    reset_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub retry_after_ms: u64,
    pub reset_at: DateTime<Utc>,
}

impl RateLimiter {
    pub fn new(policy: LimiterPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy,
            clock,
            inner: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &LimiterPolicy {
        &self.policy
    }

    pub async fn check(&self, client_id: &str) -> Decision {
        let now = self.clock.now();
        self.record_and_check(client_id, now).await
    }

    /// Rejected requests leave the count untouched.
    pub async fn record_and_check(&self, client_id: &str, now: DateTime<Utc>) -> Decision {
        let mut map = self.inner.lock().await;
        map.retain(|_, window| window.reset_at > now);

        let window = map
            .entry(client_id.to_string())
            .or_insert_with(|| ClientWindow {
                count: 0,
                reset_at: window_end(now, self.policy.window_ms),
            });

        if window.count >= self.policy.max_requests {
            let retry_after_ms = (window.reset_at - now).num_milliseconds().max(0) as u64;
            return Decision {
                allowed: false,
                limit: self.policy.max_requests,
                remaining: 0,
                retry_after_ms,
                reset_at: window.reset_at,
            };
        }

        window.count += 1;
        Decision {
            allowed: true,
            limit: self.policy.max_requests,
            remaining: self.policy.max_requests - window.count,
            retry_after_ms: 0,
            reset_at: window.reset_at,
        }
    }

    pub async fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let mut map = self.inner.lock().await;
        let before = map.len();
        map.retain(|_, window| window.reset_at > now);
        before - map.len()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

// Windows past the representable range never reset, so the ceiling still holds.
fn window_end(now: DateTime<Utc>, window_ms: u64) -> DateTime<Utc> {
    i64::try_from(window_ms)
        .ok()
        .and_then(Duration::try_milliseconds)
        .and_then(|len| now.checked_add_signed(len))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

pub struct RateLimits {
    pub auth: RateLimiter,
    pub api: RateLimiter,
    pub strict: RateLimiter,
    clock: Arc<dyn Clock>,
}

impl RateLimits {
    pub fn new(cfg: &Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            auth: RateLimiter::new(cfg.auth_policy.clone(), clock.clone()),
            api: RateLimiter::new(cfg.api_policy.clone(), clock.clone()),
            strict: RateLimiter::new(cfg.strict_policy.clone(), clock.clone()),
            clock,
        }
    }

    pub async fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        for limiter in [&self.auth, &self.api, &self.strict] {
            removed += limiter.evict_expired(now).await;
        }
        removed
    }
}
