//! Session-exclusion TTL map (SPEC_FULL.md §4.6, "Session exclusion" in the
//! GLOSSARY). Process-local state tracking which images a session has
//! already been served, so a 24-hour-old entry never blocks a fresh draw.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const EXCLUSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Default)]
struct SessionEntry {
    served: HashMap<String, Instant>,
}

pub struct SessionExclusion {
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionExclusion {
    pub fn new() -> Self {
        SessionExclusion { sessions: Mutex::new(HashMap::new()) }
    }

    /// Returns the set of image ids still excluded for `session_id` (served
    /// within the last 24h). Expired entries are pruned as a side effect.
    pub fn excluded_for(&self, session_id: &str) -> Vec<String> {
        let now = Instant::now();
        let mut guard = self.sessions.lock().expect("session exclusion mutex poisoned");
        let Some(entry) = guard.get_mut(session_id) else {
            return Vec::new();
        };
        entry.served.retain(|_, served_at| now.duration_since(*served_at) < EXCLUSION_TTL);
        entry.served.keys().cloned().collect()
    }

    pub fn mark_served(&self, session_id: &str, image_id: &str) {
        let mut guard = self.sessions.lock().expect("session exclusion mutex poisoned");
        let entry = guard.entry(session_id.to_string()).or_default();
        entry.served.insert(image_id.to_string(), Instant::now());
    }

    /// Clears exclusions for a session once the whole catalog has been
    /// served, per §4.6's "exclusion is reset" fallback.
    pub fn reset(&self, session_id: &str) {
        let mut guard = self.sessions.lock().expect("session exclusion mutex poisoned");
        guard.remove(session_id);
    }
}

impl Default for SessionExclusion {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_and_reports_exclusions_per_session() {
        let cache = SessionExclusion::new();
        assert!(cache.excluded_for("s-1").is_empty());
        cache.mark_served("s-1", "img-a");
        cache.mark_served("s-1", "img-b");
        let excluded = cache.excluded_for("s-1");
        assert_eq!(excluded.len(), 2);
        assert!(cache.excluded_for("s-2").is_empty());
    }

    #[test]
    fn reset_clears_a_sessions_exclusions() {
        let cache = SessionExclusion::new();
        cache.mark_served("s-1", "img-a");
        cache.reset("s-1");
        assert!(cache.excluded_for("s-1").is_empty());
    }
}
