//! Rate limiter (SPEC_FULL.md §4.3, component C3).
//!
//! Process-local, rolling-window counters keyed by client identifier
//! (hashed ip) and endpoint. Explicitly tolerated as inconsistent across a
//! multi-process deployment (§5 "Shared-resource policy") — strictness is
//! bounded by `max_workers × per_process_limit`.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct Quota {
    pub limit: u32,
    pub window: Duration,
}

impl Quota {
    pub const fn per_minute(limit: u32) -> Self {
        Quota { limit, window: Duration::from_secs(60) }
    }
}

/// The endpoints named explicitly in §4.3; anything else falls back to the
/// global default (200/day, 50/hour — the hourly window binds first in
/// practice since it is checked in addition to the daily one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitedEndpoint {
    CreateParticipant,
    Consent,
    Submit,
    RandomImage,
    ImageById,
    RewardSelect,
    Default,
}

impl LimitedEndpoint {
    pub fn quotas(self) -> &'static [Quota] {
        const MINUTE: Duration = Duration::from_secs(60);
        const HOUR: Duration = Duration::from_secs(3600);
        const DAY: Duration = Duration::from_secs(86_400);
        match self {
            LimitedEndpoint::CreateParticipant => &[Quota { limit: 30, window: MINUTE }],
            LimitedEndpoint::Consent => &[Quota { limit: 20, window: MINUTE }],
            LimitedEndpoint::Submit => &[Quota { limit: 60, window: MINUTE }],
            LimitedEndpoint::RandomImage => &[Quota { limit: 120, window: MINUTE }],
            LimitedEndpoint::ImageById => &[Quota { limit: 300, window: MINUTE }],
            LimitedEndpoint::RewardSelect => &[Quota { limit: 10, window: MINUTE }],
            LimitedEndpoint::Default => &[
                Quota { limit: 50, window: HOUR },
                Quota { limit: 200, window: DAY },
            ],
        }
    }
}

#[derive(Debug, Default)]
struct Counter {
    hits: Vec<Instant>,
}

/// A rolling-window limiter. One instance lives on the `Core` context and is
/// shared (behind a `Mutex`) across every worker task, per §5's enumeration
/// of the process's shared mutable state.
pub struct RateLimiter {
    counters: Mutex<HashMap<(String, &'static str), Counter>>,
}

pub struct Decision {
    pub allowed: bool,
    pub retry_after_secs: u64,
}

impl RateLimiter {
    pub fn new() -> Self {
        RateLimiter { counters: Mutex::new(HashMap::new()) }
    }

    /// Records one hit for `client_key` against `endpoint`'s quotas and
    /// reports whether it was within limits. Always records, even when it
    /// denies — a client that keeps hammering a blocked endpoint should not
    /// get a free pass once the window rolls over mid-burst.
    pub fn check(&self, client_key: &str, endpoint: LimitedEndpoint) -> Decision {
        let now = Instant::now();
        let mut guard = self.counters.lock().expect("rate limiter mutex poisoned");
        let key = (client_key.to_string(), discriminant_name(endpoint));
        let counter = guard.entry(key).or_default();

        let mut worst_retry = 0u64;
        let mut allowed = true;
        for quota in endpoint.quotas() {
            counter.hits.retain(|hit| now.duration_since(*hit) < quota.window);
            if counter.hits.len() as u32 >= quota.limit {
                allowed = false;
                let oldest = counter.hits.iter().min().copied().unwrap_or(now);
                let elapsed = now.duration_since(oldest);
                let retry = quota.window.saturating_sub(elapsed).as_secs().max(1);
                worst_retry = worst_retry.max(retry);
            }
        }
        counter.hits.push(now);

        Decision { allowed, retry_after_secs: worst_retry }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

fn discriminant_name(endpoint: LimitedEndpoint) -> &'static str {
    match endpoint {
        LimitedEndpoint::CreateParticipant => "create_participant",
        LimitedEndpoint::Consent => "consent",
        LimitedEndpoint::Submit => "submit",
        LimitedEndpoint::RandomImage => "random_image",
        LimitedEndpoint::ImageById => "image_by_id",
        LimitedEndpoint::RewardSelect => "reward_select",
        LimitedEndpoint::Default => "default",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kth_plus_one_call_is_denied() {
        let limiter = RateLimiter::new();
        let endpoint = LimitedEndpoint::RewardSelect; // limit 10/minute
        for _ in 0..10 {
            assert!(limiter.check("client-a", endpoint).allowed);
        }
        let decision = limiter.check("client-a", endpoint);
        assert!(!decision.allowed);
        assert!(decision.retry_after_secs > 0);
    }

    #[test]
    fn clients_are_independent() {
        let limiter = RateLimiter::new();
        let endpoint = LimitedEndpoint::Consent; // limit 20/minute
        for _ in 0..20 {
            assert!(limiter.check("client-a", endpoint).allowed);
        }
        assert!(!limiter.check("client-a", endpoint).allowed);
        assert!(limiter.check("client-b", endpoint).allowed);
    }
}
