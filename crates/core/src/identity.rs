//! Identity & privacy utilities (SPEC_FULL.md §4.2, component C2).

use sha2::{Digest, Sha256};

/// Sentinel hash returned for an empty or unparseable client IP, so that a
/// missing address never collides with a real one that happens to hash to
/// all zeroes.
pub const SENTINEL_IP_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000"; // 64 zeros

pub const MAX_USER_AGENT_LEN: usize = 500;

/// `SHA-256(salt || raw_ip)`, lowercase hex. An empty input yields the
/// sentinel so callers can distinguish "we hashed nothing" from a collision.
pub fn hash_ip(raw_ip: &str, salt: &str) -> String {
    let trimmed = raw_ip.trim();
    if trimmed.is_empty() {
        return SENTINEL_IP_HASH.to_string();
    }
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(trimmed.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// 36-char UUID v4, used for business ids minted server-side and for
/// request correlation ids.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// `SHA-256(text)`, lowercase hex. Used for the submission description hash
/// that drives idempotent-replay detection (§4.7 "Failure semantics").
pub fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect()
}

/// Truncates to the first 500 bytes on a UTF-8 boundary and strips control
/// characters, so a hostile or buggy client can't bloat audit rows.
pub fn truncate_ua(raw: &str) -> String {
    let stripped: String = raw.chars().filter(|c| !c.is_control()).collect();
    if stripped.len() <= MAX_USER_AGENT_LEN {
        return stripped;
    }
    let mut end = MAX_USER_AGENT_LEN;
    while !stripped.is_char_boundary(end) {
        end -= 1;
    }
    stripped[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_ip_is_deterministic_and_salted() {
        let a = hash_ip("203.0.113.7", "salt-a");
        let b = hash_ip("203.0.113.7", "salt-a");
        let c = hash_ip("203.0.113.7", "salt-b");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn hash_ip_empty_is_sentinel() {
        assert_eq!(hash_ip("", "salt"), SENTINEL_IP_HASH);
        assert_eq!(hash_ip("   ", "salt"), SENTINEL_IP_HASH);
    }

    #[test]
    fn new_id_is_uuid_v4_shaped() {
        let id = new_id();
        assert_eq!(id.len(), 36);
        assert_eq!(id.chars().filter(|&c| c == '-').count(), 4);
    }

    #[test]
    fn truncate_ua_strips_control_chars_and_caps_length() {
        let raw = format!("agent\u{0007}{}", "x".repeat(600));
        let out = truncate_ua(&raw);
        assert_eq!(out.len(), MAX_USER_AGENT_LEN);
        assert!(!out.contains('\u{0007}'));
    }
}
