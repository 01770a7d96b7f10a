//! Cross-cutting HTTP middleware (SPEC_FULL.md §4.3, §4.9, §4.13).

pub mod audit_metric;
pub mod content_type;
pub mod correlation;
pub mod rate_limit;
pub mod security_headers;
