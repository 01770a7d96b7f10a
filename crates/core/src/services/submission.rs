//! Submission service (SPEC_FULL.md §4.7, component C7).

use crate::db::RecordOutcome;
use crate::error::{CoreError, CoreResult};
use crate::identity::hash_text;
use crate::models::{AuditEvent, NewSubmission, SubmitRequest, SubmitResponse};
use crate::validation;
use crate::Core;

/// Below this word-diversity-adjusted score, a submission is never flagged
/// AI-suspected regardless of structural markers (§4.7 step 4).
const AI_SUSPECT_SCORE_THRESHOLD: f64 = 0.95;
const AI_SUSPECT_MIN_MARKERS: u32 = 3;
const WORD_COUNT_CAP: f64 = 500.0;
const SENTENCE_COUNT_CAP: f64 = 10.0;

pub async fn submit(
    core: &Core,
    req: SubmitRequest,
    raw_ip: &str,
    raw_user_agent: &str,
) -> CoreResult<SubmitResponse> {
    let participant = core
        .store()
        .get_participant_row(&req.participant_id)
        .await?
        .ok_or(CoreError::NotFound("participant"))?;

    let (consent_given, _) =
        core.store().latest_consent(&req.participant_id).await?.ok_or(CoreError::NotFound("participant"))?;
    if !consent_given {
        return Err(CoreError::ConsentRequired);
    }

    if !req.is_survey && core.config().payment_required {
        let has_paid = core.store().has_paid_payment(&req.participant_id).await?;
        if !has_paid {
            return Err(CoreError::PaymentRequired);
        }
    }

    let validated = (|| {
        validation::validate_rating(req.rating)?;
        let description = validation::validate_description(&req.description)?;
        let feedback = validation::validate_feedback(&req.feedback)?;
        let image_id = validation::validate_image_id(&req.image_id)?;
        validation::validate_time_spent(req.time_spent_seconds)?;
        let attention_expected = validation::validate_attention_expected(req.is_attention, &req.attention_expected)?;

        let word_count = validation::word_count(&description);
        if word_count < core.config().min_word_count {
            return Err(CoreError::validation(format!(
                "minimum {} words required",
                core.config().min_word_count
            )));
        }
        Ok((description, feedback, image_id, attention_expected, word_count))
    })();

    let (description, feedback, image_id, attention_expected, word_count) = match validated {
        Ok(v) => v,
        Err(err) => {
            core.store()
                .append_audit(&AuditEvent {
                    event_type: "security_violation".to_string(),
                    participant_fk: Some(participant.id),
                    endpoint: "/api/submit".to_string(),
                    method: "POST".to_string(),
                    status_code: 400,
                    ip_hash: crate::identity::hash_ip(raw_ip, &core.config().ip_hash_salt),
                    user_agent: crate::identity::truncate_ua(raw_user_agent),
                    details: Some(err.to_string()),
                })
                .await;
            return Err(err);
        }
    };

    let too_fast_flag = req.time_spent_seconds < core.config().too_fast_seconds;

    let attention_passed = if req.is_attention {
        let expected = attention_expected.as_deref().unwrap_or_default();
        Some(contains_whole_word(&description, expected))
    } else {
        None
    };

    let (quality_score, ai_suspected) = score_quality(&description, word_count);

    let image_fk = core.store().ensure_image_exists(&image_id, &req.image_url).await?;
    let attention_score_snapshot = core.store().get_attention_stats(participant.id).await?.attention_score;
    let description_hash = hash_text(&description);
    let ip_hash = crate::identity::hash_ip(raw_ip, &core.config().ip_hash_salt);
    let user_agent = crate::identity::truncate_ua(raw_user_agent);

    let new_submission = NewSubmission {
        participant_fk: participant.id,
        image_fk,
        session_id: req.session_id,
        description,
        description_hash,
        word_count: word_count as i32,
        rating: req.rating,
        feedback,
        elapsed_seconds: req.time_spent_seconds,
        is_survey: req.is_survey,
        is_attention: req.is_attention,
        attention_passed,
        too_fast_flag,
        attention_score_snapshot,
        quality_score: Some(quality_score),
        ai_suspected,
        ip_hash,
        user_agent,
    };

    let (submission_id, survey_index) = match core.store().record_submission(&new_submission).await? {
        RecordOutcome::Created { submission_id, survey_index } => (submission_id, survey_index),
        RecordOutcome::Replayed { submission_id, survey_index } => (submission_id, survey_index),
    };

    let is_flagged_now = core.store().get_attention_stats(participant.id).await?.is_flagged;

    Ok(SubmitResponse {
        status: "ok",
        word_count,
        attention_passed,
        submission_id,
        survey_index,
        is_flagged_now,
    })
}

/// Whole-word, case-insensitive containment check (§4.7 step 3). `split_whitespace`
/// tokens are compared directly rather than via regex word boundaries, since the
/// corpus only ever needs simple alphanumeric keywords here.
fn contains_whole_word(description: &str, expected: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    let expected = expected.to_lowercase();
    let lowered = description.to_lowercase();
    lowered
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == expected)
}

/// Cheap, deterministic quality heuristic (§4.7 step 4). Four equally-weighted
/// signals blended into a single [0,1] score; spec §9 allows an equivalent
/// substitute as long as the bounds hold.
fn score_quality(description: &str, word_count: usize) -> (f64, bool) {
    let char_count = description.chars().count().max(1);
    let unique_chars = description.chars().collect::<std::collections::HashSet<_>>().len();

    let word_component = (word_count as f64).min(WORD_COUNT_CAP) / WORD_COUNT_CAP;
    let diversity_component = unique_chars as f64 / char_count as f64;
    let punctuation_component = if description.chars().any(|c| ".,!?;:".contains(c)) { 1.0 } else { 0.0 };
    let sentence_count = description.split(|c| ".!?".contains(c)).filter(|s| !s.trim().is_empty()).count();
    let sentence_component = (sentence_count as f64).min(SENTENCE_COUNT_CAP) / SENTENCE_COUNT_CAP;

    let score = (word_component + diversity_component + punctuation_component + sentence_component) / 4.0;
    let score = score.clamp(0.0, 1.0);

    let markers = structural_marker_count(description);
    let ai_suspected = score > AI_SUSPECT_SCORE_THRESHOLD && markers >= AI_SUSPECT_MIN_MARKERS;

    (score, ai_suspected)
}

/// Counts occurrences of the three "uncommon structural markers" named in
/// §4.7 step 4: enumerated-list lines, parenthetical asides, semicolons.
fn structural_marker_count(description: &str) -> u32 {
    let enumerated_lines = description
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            trimmed.starts_with('-')
                || trimmed.starts_with(|c: char| c.is_ascii_digit())
                    && trimmed.find('.').map(|i| trimmed[..i].chars().all(|c| c.is_ascii_digit())).unwrap_or(false)
        })
        .count() as u32;
    let parenthetical = description.matches('(').count().min(description.matches(')').count()) as u32;
    let semicolons = description.matches(';').count() as u32;
    enumerated_lines + parenthetical + semicolons
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_word_match_is_case_insensitive_and_boundary_aware() {
        assert!(contains_whole_word("The RED square sits there", "red"));
        assert!(!contains_whole_word("threadbare fabric", "red"));
    }

    #[test]
    fn quality_score_stays_bounded() {
        let (score, _) = score_quality("a short plain description without much variety", 8);
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn structural_markers_count_all_three_kinds() {
        let text = "Item one; item two (an aside).\n- bullet one\n- bullet two";
        assert!(structural_marker_count(text) >= 3);
    }
}
