//! Validation layer (SPEC_FULL.md §4.4, component C4).
//!
//! Every inbound payload is checked here before it reaches a service. A
//! failure yields [`CoreError::Validation`] describing the first offending
//! field; downstream components never re-validate.

use crate::error::CoreError;
use crate::models::{Demographics, RegisterParticipantRequest};

const MAX_PARTICIPANT_ID_LEN: usize = 100;
const MAX_USERNAME_LEN: usize = 100;
const MIN_USERNAME_LEN: usize = 2;
const MAX_EMAIL_LEN: usize = 255;
const MIN_PHONE_LEN: usize = 7;
const MAX_PHONE_LEN: usize = 20;
const MIN_AGE: i32 = 1;
const MAX_AGE: i32 = 120;
const MIN_RATING: i32 = 1;
const MAX_RATING: i32 = 10;
const MAX_DESCRIPTION_LEN: usize = 10_000;
const MAX_FEEDBACK_LEN: usize = 2_000;
const MAX_IMAGE_ID_LEN: usize = 200;
const MAX_ATTENTION_EXPECTED_LEN: usize = 100;

/// Trims a string and treats an all-whitespace value as missing, per §4.4's
/// "empty after trimming = missing" rule.
fn trimmed_or_missing(raw: &str, field: &'static str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn trimmed_optional(raw: &Option<String>) -> Option<String> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn validate_username(username: &str) -> Result<(), CoreError> {
    let len = username.chars().count();
    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&len) {
        return Err(CoreError::validation(format!(
            "username must be {MIN_USERNAME_LEN}-{MAX_USERNAME_LEN} characters"
        )));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(CoreError::validation(
            "username may only contain letters, digits, and underscores",
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), CoreError> {
    if email.len() > MAX_EMAIL_LEN {
        return Err(CoreError::validation("email exceeds maximum length"));
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !local.contains(char::is_whitespace)
                && !domain.contains(char::is_whitespace)
                && domain.contains('.')
        }
        None => false,
    };
    if !valid {
        return Err(CoreError::validation("email is not a valid address"));
    }
    Ok(())
}

fn validate_phone(phone: &str) -> Result<(), CoreError> {
    let len = phone.chars().count();
    if !(MIN_PHONE_LEN..=MAX_PHONE_LEN).contains(&len) {
        return Err(CoreError::validation(format!(
            "phone must be {MIN_PHONE_LEN}-{MAX_PHONE_LEN} characters"
        )));
    }
    if !phone.chars().all(|c| c.is_ascii_digit() || " +-()".contains(c)) {
        return Err(CoreError::validation("phone contains invalid characters"));
    }
    Ok(())
}

fn validate_age(age: i32) -> Result<(), CoreError> {
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(CoreError::validation(format!("age must be {MIN_AGE}-{MAX_AGE}")));
    }
    Ok(())
}

pub fn validate_registration(req: RegisterParticipantRequest) -> Result<Demographics, CoreError> {
    let participant_id = trimmed_or_missing(&req.participant_id, "participant_id")?;
    if participant_id.len() > MAX_PARTICIPANT_ID_LEN {
        return Err(CoreError::validation("participant_id exceeds maximum length"));
    }
    let session_id = trimmed_or_missing(&req.session_id, "session_id")?;
    let username = trimmed_or_missing(&req.username, "username")?;
    validate_username(&username)?;
    let email = trimmed_or_missing(&req.email, "email")?.to_lowercase();
    validate_email(&email)?;
    let phone = match trimmed_optional(&req.phone) {
        Some(p) => {
            validate_phone(&p)?;
            Some(p)
        }
        None => None,
    };
    validate_age(req.age)?;

    Ok(Demographics {
        participant_id,
        session_id,
        username,
        email,
        phone,
        gender: trimmed_optional(&req.gender),
        age: req.age,
        place: trimmed_optional(&req.place),
        native_language: trimmed_optional(&req.native_language),
        prior_experience: trimmed_optional(&req.prior_experience),
    })
}

pub fn validate_rating(rating: i32) -> Result<(), CoreError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(CoreError::validation(format!("rating must be {MIN_RATING}-{MAX_RATING}")));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<String, CoreError> {
    let trimmed = trimmed_or_missing(description, "description")?;
    if trimmed.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(CoreError::validation("description exceeds maximum length"));
    }
    check_suspicious_content(&trimmed)?;
    Ok(trimmed)
}

pub fn validate_feedback(feedback: &Option<String>) -> Result<Option<String>, CoreError> {
    match trimmed_optional(feedback) {
        Some(f) if f.chars().count() > MAX_FEEDBACK_LEN => {
            Err(CoreError::validation("feedback exceeds maximum length"))
        }
        other => Ok(other),
    }
}

pub fn validate_image_id(image_id: &str) -> Result<String, CoreError> {
    let trimmed = trimmed_or_missing(image_id, "image_id")?;
    if trimmed.len() > MAX_IMAGE_ID_LEN {
        return Err(CoreError::validation("image_id exceeds maximum length"));
    }
    if trimmed.starts_with('/') || trimmed.split('/').any(|segment| segment == "..") {
        return Err(CoreError::validation("image_id must not escape the catalog directory"));
    }
    Ok(trimmed)
}

pub fn validate_time_spent(seconds: i64) -> Result<(), CoreError> {
    if seconds < 0 {
        return Err(CoreError::validation("time_spent_seconds must be non-negative"));
    }
    Ok(())
}

pub fn validate_attention_expected(
    is_attention: bool,
    attention_expected: &Option<String>,
) -> Result<Option<String>, CoreError> {
    let trimmed = trimmed_optional(attention_expected);
    if is_attention && trimmed.is_none() {
        return Err(CoreError::validation(
            "attention_expected is required when is_attention is true",
        ));
    }
    if let Some(value) = &trimmed {
        if value.chars().count() > MAX_ATTENTION_EXPECTED_LEN {
            return Err(CoreError::validation("attention_expected exceeds maximum length"));
        }
    }
    Ok(trimmed)
}

/// Rejects obvious injection/low-effort markers per §4.4. Anything matched
/// here also drives a `security_violation` audit event at the call site.
pub fn check_suspicious_content(description: &str) -> Result<(), CoreError> {
    let lowered = description.to_lowercase();
    const BANNED_SUBSTRINGS: [&str; 3] = ["<script", "javascript:", "onerror="];
    for needle in BANNED_SUBSTRINGS {
        if lowered.contains(needle) {
            return Err(CoreError::validation("description contains disallowed content"));
        }
    }
    if has_long_identical_run(description, 100) {
        return Err(CoreError::validation("description contains disallowed content"));
    }
    Ok(())
}

fn has_long_identical_run(s: &str, threshold: usize) -> bool {
    let mut chars = s.chars();
    let Some(mut prev) = chars.next() else {
        return false;
    };
    let mut run = 1usize;
    for c in chars {
        if c == prev {
            run += 1;
            if run > threshold {
                return true;
            }
        } else {
            prev = c;
            run = 1;
        }
    }
    false
}

/// Splits on Unicode whitespace, the server's sole word-count source of
/// truth (client-supplied counts are always ignored, per §4.4).
pub fn word_count(description: &str) -> usize {
    description.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rejects_special_characters() {
        assert!(validate_username("alice_01").is_ok());
        assert!(validate_username("a").is_err());
        assert!(validate_username("alice!").is_err());
    }

    #[test]
    fn email_requires_at_and_dot() {
        assert!(validate_email("a@x.io").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("a@b").is_err());
    }

    #[test]
    fn word_count_splits_on_unicode_whitespace() {
        assert_eq!(word_count("one two  three\tfour\nfive"), 5);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn suspicious_content_blocks_script_tags_and_long_runs() {
        assert!(check_suspicious_content("a normal description").is_ok());
        assert!(check_suspicious_content("<script>alert(1)</script>").is_err());
        assert!(check_suspicious_content(&"a".repeat(150)).is_err());
    }

    #[test]
    fn image_id_rejects_path_traversal() {
        assert!(validate_image_id("survey/aurora-lake.svg").is_ok());
        assert!(validate_image_id("../../etc/passwd").is_err());
        assert!(validate_image_id("/etc/passwd").is_err());
        assert!(validate_image_id("survey/../../secret.svg").is_err());
    }

    #[test]
    fn attention_expected_required_only_when_attention_flag_set() {
        assert!(validate_attention_expected(false, &None).is_ok());
        assert!(validate_attention_expected(true, &None).is_err());
        assert!(validate_attention_expected(true, &Some("red".to_string())).is_ok());
    }
}
