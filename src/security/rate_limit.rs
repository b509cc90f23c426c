//! Per-identifier rate limiting with exponential backoff.
//!
//! Each identifier owns one [`RateLimitRecord`]. Requests accumulate attempts
//! inside a fixed window; exceeding the threshold blocks the identifier for a
//! backoff that starts at the window length and doubles on each repeat
//! offence, capped at the policy maximum.
//!
//! ```text
//! Fresh ──request──▶ Accumulating ──(attempts > max)──▶ Blocked
//!   ▲                     │                                │
//!   └──(window elapsed)───┘◀──────(block elapsed)──────────┘
//! ```
//!
//! Requests that arrive during a block are rejected without touching the
//! record. Once the window has elapsed the record starts over with a zero
//! backoff, so doubling only applies to a record that escalates again before
//! its window resets.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::config::RateLimitConfig;
use crate::observability::metrics;
use crate::security::identifier::Identifier;
use crate::security::store::MemoryStore;

/// Tunables for the backoff state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub window: Duration,
    pub max_attempts: u32,
    pub max_backoff: Duration,
    pub expiry_margin: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::from_config(&RateLimitConfig::default())
    }
}

/// Stored state for one identifier. Timestamps are Unix epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRecord {
    pub attempts: u32,
    pub first_attempt_ms: u64,
    pub backoff_ms: u64,
    pub block_until_ms: Option<u64>,
}

impl RateLimitRecord {
    fn fresh(now_ms: u64) -> Self {
        Self {
            attempts: 0,
            first_attempt_ms: now_ms,
            backoff_ms: 0,
            block_until_ms: None,
        }
    }

    pub fn is_blocked_at(&self, now_ms: u64) -> bool {
        matches!(self.block_until_ms, Some(until) if now_ms < until)
    }
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Limited,
}

/// A record to persist and how long the store should keep it.
pub type RecordWrite = (RateLimitRecord, Duration);

impl RateLimitPolicy {
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self {
            window: Duration::from_secs(config.window_secs),
            max_attempts: config.max_attempts,
            max_backoff: Duration::from_secs(config.max_backoff_secs),
            expiry_margin: Duration::from_secs(config.expiry_margin_secs),
        }
    }

    /// Compute the decision for one request at `now_ms` and the record to
    /// persist, if any. `None` leaves the stored record untouched.
    pub fn evaluate(
        &self,
        current: Option<&RateLimitRecord>,
        now_ms: u64,
    ) -> (Decision, Option<RecordWrite>) {
        let window_ms = as_millis(self.window);

        let mut record = match current {
            Some(prev) if prev.is_blocked_at(now_ms) => return (Decision::Limited, None),
            Some(prev) if now_ms.saturating_sub(prev.first_attempt_ms) > window_ms => {
                RateLimitRecord::fresh(now_ms)
            }
            Some(prev) => RateLimitRecord {
                block_until_ms: None,
                ..*prev
            },
            None => RateLimitRecord::fresh(now_ms),
        };

        record.attempts = record.attempts.saturating_add(1);

        if record.attempts > self.max_attempts {
            record.backoff_ms = as_millis(self.next_backoff(Duration::from_millis(record.backoff_ms)));
            record.block_until_ms = Some(now_ms.saturating_add(record.backoff_ms));
            let ttl = Duration::from_millis(record.backoff_ms) + self.expiry_margin;
            (Decision::Limited, Some((record, ttl)))
        } else {
            let elapsed = Duration::from_millis(now_ms.saturating_sub(record.first_attempt_ms));
            let ttl = self.window.saturating_sub(elapsed) + self.expiry_margin;
            (Decision::Allowed, Some((record, ttl)))
        }
    }

    /// Block duration following `previous`: the window on first escalation,
    /// then doubling up to `max_backoff`.
    pub fn next_backoff(&self, previous: Duration) -> Duration {
        if previous.is_zero() {
            self.window.min(self.max_backoff)
        } else {
            previous.saturating_mul(2).min(self.max_backoff)
        }
    }
}

/// Rate limiter over an in-process store.
pub struct RateLimiter {
    policy: RateLimitPolicy,
    store: MemoryStore<RateLimitRecord>,
    key_prefix: String,
}

impl RateLimiter {
    pub fn new(policy: RateLimitPolicy, key_prefix: impl Into<String>, sweep_interval: u64) -> Self {
        Self {
            policy,
            store: MemoryStore::new(sweep_interval),
            key_prefix: key_prefix.into(),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            RateLimitPolicy::from_config(config),
            config.key_prefix.clone(),
            config.sweep_interval,
        )
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Count this request against `identifier` and decide whether it may pass.
    pub fn check(&self, identifier: &Identifier) -> Decision {
        self.check_at(identifier, now_ms())
    }

    /// [`check`](Self::check) with an explicit clock.
    pub fn check_at(&self, identifier: &Identifier, now_ms: u64) -> Decision {
        let key = self.key_for(identifier);
        let decision = self
            .store
            .update(&key, now_ms, |current| self.policy.evaluate(current, now_ms));

        if decision == Decision::Limited {
            tracing::warn!(kind = identifier.kind(), "Rate limit exceeded");
            metrics::record_rate_limited(identifier.kind());
        }
        decision
    }

    /// Current record for an identifier, if one is live.
    pub fn record_at(&self, identifier: &Identifier, now_ms: u64) -> Option<RateLimitRecord> {
        self.store.get(&self.key_for(identifier), now_ms)
    }

    /// Number of identifiers currently held by the store.
    pub fn tracked(&self) -> usize {
        self.store.len()
    }

    fn key_for(&self, identifier: &Identifier) -> String {
        format!("{}:{}", self.key_prefix, identifier)
    }
}

/// Wall clock in Unix epoch milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(as_millis)
        .unwrap_or_default()
}

fn as_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
