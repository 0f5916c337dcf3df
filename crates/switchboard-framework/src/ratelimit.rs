//! Per-command, per-user rate limiting.
//!
//! [`RateLimiter`] keeps fixed-window hit counters keyed by
//! `(command, user)`. The map is split into independently locked shards so
//! concurrent invocations only contend when their keys hash to the same
//! shard, and the check-then-increment for one key happens under a single
//! shard lock.
//!
//! Expiry is evaluated at read time against a monotonic clock. Expired
//! entries are treated as absent whatever their stored count;
//! [`RateLimiter::sweep`] reclaims their memory but is never needed for
//! correctness.

use std::collections::HashMap;
use std::hash::{BuildHasher, RandomState};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::command::RateLimit;

const DEFAULT_SHARDS: usize = 16;

/// Stand-in expiry for windows too long to represent as an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Outcome of a [`RateLimiter::check`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// The invocation is within budget.
    Allowed {
        /// Invocations left in the current window.
        remaining: u32,
    },
    /// The budget for the current window is exhausted.
    Limited {
        /// Time until the window expires.
        retry_after: Duration,
    },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RateKey {
    command: String,
    user: String,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    expires_at: Instant,
}

/// A sharded map of fixed-window counters.
#[derive(Debug)]
pub struct RateLimiter {
    shards: Box<[Mutex<HashMap<RateKey, Window>>]>,
    hasher: RandomState,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    /// Creates a limiter with `shards` independently locked shards (at least one).
    pub fn with_shards(shards: usize) -> Self {
        Self {
            shards: (0..shards.max(1))
                .map(|_| Mutex::new(HashMap::new()))
                .collect(),
            hasher: RandomState::new(),
        }
    }

    fn shard(&self, key: &RateKey) -> &Mutex<HashMap<RateKey, Window>> {
        let index = self.hasher.hash_one(key) as usize % self.shards.len();
        &self.shards[index]
    }

    /// Records one invocation of `command` by `user` and decides whether it
    /// is within `limit`.
    ///
    /// The first hit on an absent or expired key opens a new window of
    /// `limit.window`; later hits increment the counter and are allowed while
    /// the count stays at or below `limit.max`.
    pub fn check(&self, command: &str, user: &str, limit: RateLimit) -> RateDecision {
        let key = RateKey {
            command: command.to_string(),
            user: user.to_string(),
        };
        let now = Instant::now();
        let mut shard = self.shard(&key).lock();

        match shard.get_mut(&key) {
            Some(window) if window.expires_at > now => {
                window.count = window.count.saturating_add(1);
                if window.count <= limit.max {
                    RateDecision::Allowed {
                        remaining: limit.max - window.count,
                    }
                } else {
                    RateDecision::Limited {
                        retry_after: window.expires_at - now,
                    }
                }
            }
            _ => {
                shard.insert(
                    key,
                    Window {
                        count: 1,
                        expires_at: expiry(now, limit.window),
                    },
                );
                RateDecision::Allowed {
                    remaining: limit.max.saturating_sub(1),
                }
            }
        }
    }

    /// Removes expired entries, returning how many were evicted.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        self.shards
            .iter()
            .map(|shard| {
                let mut shard = shard.lock();
                let before = shard.len();
                shard.retain(|_, window| window.expires_at > now);
                before - shard.len()
            })
            .sum()
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn expiry(now: Instant, window: Duration) -> Instant {
    now.checked_add(window)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}
