use sqlx::{Postgres, Transaction};

use crate::error::CoreResult;
use crate::models::{AttentionStats, ParticipantStats};

use super::Store;

/// Threshold below which a participant's attention score flags them for
/// review (§3 "is_flagged when score drops below a policy threshold (0.5)").
const FLAG_SCORE_THRESHOLD: f64 = 0.5;

/// A participant becomes priority-eligible for the reward draw once they've
/// written at least this many total words, or completed at least this many
/// survey rounds (GLOSSARY "Priority eligible"). Eligibility is sticky: once
/// earned it is never revoked by a later, smaller submission.
const PRIORITY_MIN_WORDS: i64 = 500;
const PRIORITY_MIN_SURVEY_ROUNDS: i64 = 3;

impl Store {
    /// Folds one submission's outcome into both stats tables in its own,
    /// standalone transaction. Only used where no enclosing submission
    /// transaction exists (tests seeding `participant_stats` directly);
    /// `record_submission` instead calls [`increment_stats_tx`] inside its
    /// own transaction so the stats update is atomic with the insert (§5
    /// "increments ... occur in the same transaction as the submission").
    pub async fn increment_stats(
        &self,
        participant_fk: i64,
        word_count: i32,
        is_survey: bool,
        attention_passed: Option<bool>,
    ) -> CoreResult<()> {
        let mut tx = self.pool().begin().await?;
        increment_stats_tx(&mut tx, participant_fk, word_count, is_survey, attention_passed).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn get_attention_stats(&self, participant_fk: i64) -> CoreResult<AttentionStats> {
        let row = sqlx::query_as::<_, AttentionStats>(
            r#"
            SELECT total_checks, passed_checks, failed_checks, attention_score, is_flagged
            FROM attention_stats WHERE participant_fk = $1
            "#,
        )
        .bind(participant_fk)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.unwrap_or_default())
    }

    pub async fn get_participant_stats(&self, participant_fk: i64) -> CoreResult<Option<ParticipantStats>> {
        let row = sqlx::query_as::<_, ParticipantStats>(
            r#"
            SELECT total_words, total_submissions, survey_rounds, attention_score, priority_eligible,
                   last_reward_attempt_at
            FROM participant_stats WHERE participant_fk = $1
            "#,
        )
        .bind(participant_fk)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }
}

/// Same update as [`Store::increment_stats`], run against a caller-owned
/// transaction so it commits atomically with whatever wrote the row that
/// triggered it.
pub(super) async fn increment_stats_tx(
    tx: &mut Transaction<'_, Postgres>,
    participant_fk: i64,
    word_count: i32,
    is_survey: bool,
    attention_passed: Option<bool>,
) -> CoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO attention_stats (participant_fk) VALUES ($1)
        ON CONFLICT (participant_fk) DO NOTHING
        "#,
    )
    .bind(participant_fk)
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO participant_stats (participant_fk) VALUES ($1)
        ON CONFLICT (participant_fk) DO NOTHING
        "#,
    )
    .bind(participant_fk)
    .execute(&mut **tx)
    .await?;

    if let Some(passed) = attention_passed {
        sqlx::query(
            r#"
            UPDATE attention_stats
            SET total_checks = total_checks + 1,
                passed_checks = passed_checks + CASE WHEN $2 THEN 1 ELSE 0 END,
                failed_checks = failed_checks + CASE WHEN $2 THEN 0 ELSE 1 END,
                attention_score = (passed_checks + CASE WHEN $2 THEN 1 ELSE 0 END)::DOUBLE PRECISION
                    / (total_checks + 1)::DOUBLE PRECISION,
                is_flagged = (passed_checks + CASE WHEN $2 THEN 1 ELSE 0 END)::DOUBLE PRECISION
                    / (total_checks + 1)::DOUBLE PRECISION < $3
            WHERE participant_fk = $1
            "#,
        )
        .bind(participant_fk)
        .bind(passed)
        .bind(FLAG_SCORE_THRESHOLD)
        .execute(&mut **tx)
        .await?;
    }

    sqlx::query(
        r#"
        UPDATE participant_stats ps
        SET total_words = total_words + $2,
            total_submissions = total_submissions + 1,
            survey_rounds = survey_rounds + CASE WHEN $3 THEN 1 ELSE 0 END,
            attention_score = COALESCE(
                (SELECT attention_score FROM attention_stats WHERE participant_fk = $1),
                ps.attention_score
            ),
            priority_eligible = ps.priority_eligible
                OR total_words + $2 >= $4
                OR survey_rounds + CASE WHEN $3 THEN 1 ELSE 0 END >= $5
        WHERE ps.participant_fk = $1
        "#,
    )
    .bind(participant_fk)
    .bind(word_count)
    .bind(is_survey)
    .bind(PRIORITY_MIN_WORDS)
    .bind(PRIORITY_MIN_SURVEY_ROUNDS)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
