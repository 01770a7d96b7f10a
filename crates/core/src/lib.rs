//! Core domain crate (SPEC_FULL.md §2): storage, validation, identity,
//! rate-limiting, session exclusion, and the service layer that orchestrates
//! them. The HTTP transport lives in the `imagedesc-server` crate; nothing
//! in here knows about axum.

pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod models;
pub mod ratelimit;
pub mod services;
pub mod session_cache;
pub mod validation;

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::SeedableRng;

use config::Config;
use db::Store;
use ratelimit::RateLimiter;
use session_cache::SessionExclusion;

/// The explicit context threaded through every handler and service call
/// (SPEC_FULL.md §9 "implicit global state" design note). Constructed once
/// at startup in production; tests build their own via [`Core::new`].
pub struct Core {
    store: Store,
    config: Config,
    rate_limiter: RateLimiter,
    session_exclusion: SessionExclusion,
    rng: Mutex<StdRng>,
}

impl Core {
    pub fn new(store: Store, config: Config) -> Self {
        Core {
            store,
            config,
            rate_limiter: RateLimiter::new(),
            session_exclusion: SessionExclusion::new(),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    pub fn session_exclusion(&self) -> &SessionExclusion {
        &self.session_exclusion
    }

    pub fn rng(&self) -> &Mutex<StdRng> {
        &self.rng
    }
}
