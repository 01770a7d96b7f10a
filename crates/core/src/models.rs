//! Shared record types (SPEC_FULL.md §3, §9 "tagged record types per endpoint").
//!
//! Every inbound payload and outbound projection has its own named type here;
//! nothing downstream of [`crate::validation`] touches a raw `serde_json::Value`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterParticipantRequest {
    pub participant_id: String,
    pub session_id: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    pub age: i32,
    #[serde(default)]
    pub place: Option<String>,
    #[serde(default)]
    pub native_language: Option<String>,
    #[serde(default)]
    pub prior_experience: Option<String>,
}

/// Validated, trimmed demographic fields — the only shape [`crate::db`] ever
/// writes or compares for idempotent re-registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Demographics {
    pub participant_id: String,
    pub session_id: String,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub age: i32,
    pub place: Option<String>,
    pub native_language: Option<String>,
    pub prior_experience: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterParticipantResponse {
    pub status: &'static str,
    pub participant_id: String,
}

/// Public projection of a participant row: no ip hash, no user agent (§4.5).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ParticipantPublic {
    pub participant_id: String,
    pub session_id: String,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub age: i32,
    pub place: Option<String>,
    pub native_language: Option<String>,
    pub prior_experience: Option<String>,
    pub payment_status: String,
    pub consent_given: bool,
    pub consent_timestamp: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Internal row including privacy-sensitive fields, used only inside C1/C5.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ParticipantRow {
    pub id: i64,
    pub participant_id: String,
    pub session_id: String,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub age: i32,
    pub place: Option<String>,
    pub native_language: Option<String>,
    pub prior_experience: Option<String>,
    pub payment_status: String,
    pub ip_hash: String,
    pub user_agent: String,
    pub consent_given: bool,
    pub consent_timestamp: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Consent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ConsentRequest {
    pub participant_id: String,
    pub consent_given: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsentResponse {
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsentStateResponse {
    pub consent_given: bool,
    pub consent_timestamp: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RandomImageResponse {
    pub image_id: String,
    pub image_url: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ImageRow {
    pub id: i64,
    pub image_id: String,
    pub image_url: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub object_count: Option<i32>,
    pub difficulty: Option<String>,
}

// ---------------------------------------------------------------------------
// Submissions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    pub participant_id: String,
    pub session_id: String,
    pub image_id: String,
    pub image_url: String,
    pub description: String,
    pub rating: i32,
    #[serde(default)]
    pub feedback: Option<String>,
    pub time_spent_seconds: i64,
    #[serde(default)]
    pub is_survey: bool,
    #[serde(default)]
    pub is_attention: bool,
    #[serde(default)]
    pub attention_expected: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    pub status: &'static str,
    pub word_count: usize,
    pub attention_passed: Option<bool>,
    pub submission_id: i64,
    pub survey_index: i64,
    pub is_flagged_now: bool,
}

/// Fields [`crate::services::submission`] has already computed and validated;
/// this is what crosses into C1's `record_submission`.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub participant_fk: i64,
    pub image_fk: i64,
    pub session_id: String,
    pub description: String,
    pub description_hash: String,
    pub word_count: i32,
    pub rating: i32,
    pub feedback: Option<String>,
    pub elapsed_seconds: i64,
    pub is_survey: bool,
    pub is_attention: bool,
    pub attention_passed: Option<bool>,
    pub too_fast_flag: bool,
    pub attention_score_snapshot: f64,
    pub quality_score: Option<f64>,
    pub ai_suspected: bool,
    pub ip_hash: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubmissionRow {
    pub id: i64,
    pub participant_fk: i64,
    pub image_fk: i64,
    pub session_id: String,
    pub survey_index: i64,
    pub description: String,
    pub description_hash: String,
    pub word_count: i32,
    pub rating: i32,
    pub feedback: Option<String>,
    pub elapsed_seconds: i64,
    pub is_survey: bool,
    pub is_attention: bool,
    pub attention_passed: Option<bool>,
    pub too_fast_flag: bool,
    pub quality_score: Option<f64>,
    pub ai_suspected: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionPublic {
    pub submission_id: i64,
    pub survey_index: i64,
    pub word_count: i32,
    pub rating: i32,
    pub attention_passed: Option<bool>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct AttentionStats {
    pub total_checks: i64,
    pub passed_checks: i64,
    pub failed_checks: i64,
    pub attention_score: f64,
    pub is_flagged: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ParticipantStats {
    pub total_words: i64,
    pub total_submissions: i64,
    pub survey_rounds: i64,
    pub attention_score: f64,
    pub priority_eligible: bool,
    pub last_reward_attempt_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Reward
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RewardStateResponse {
    pub is_winner: bool,
    pub reward_amount: Option<i64>,
    pub status: Option<String>,
    pub total_words: i64,
    pub survey_rounds: i64,
    pub priority_eligible: bool,
    pub last_reward_attempt_at: Option<DateTime<Utc>>,
}

/// `selected: true` carries `reward_amount`; `selected: false` carries
/// `reason` instead — plain fields rather than a tagged enum, since serde's
/// internal tagging always serializes the tag as a JSON string, never the
/// boolean `{"selected":true,...}` shape this endpoint's clients expect.
#[derive(Debug, Clone, Serialize)]
pub struct RewardSelectResponse {
    pub selected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

impl RewardSelectResponse {
    pub fn selected(reward_amount: i64) -> Self {
        RewardSelectResponse { selected: true, reward_amount: Some(reward_amount), reason: None }
    }

    pub fn not_selected(reason: &'static str) -> Self {
        RewardSelectResponse { selected: false, reward_amount: None, reason: Some(reason) }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RewardWinnerRow {
    pub participant_fk: i64,
    pub amount: i64,
    pub status: String,
    pub selected_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Audit & metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub event_type: String,
    pub participant_fk: Option<i64>,
    pub endpoint: String,
    pub method: String,
    pub status_code: u16,
    pub ip_hash: String,
    pub user_agent: String,
    pub details: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PerformanceMetric {
    pub endpoint: String,
    pub response_time_ms: i64,
    pub status_code: u16,
    pub request_size: i64,
    pub response_size: i64,
}
