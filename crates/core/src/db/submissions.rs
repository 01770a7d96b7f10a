use sqlx::Row;

use crate::error::{CoreError, CoreResult};
use crate::models::{NewSubmission, SubmissionRow};

use super::stats::increment_stats_tx;
use super::Store;

const UNIQUE_VIOLATION: &str = "23505";

pub enum RecordOutcome {
    Created { submission_id: i64, survey_index: i64 },
    Replayed { submission_id: i64, survey_index: i64 },
}

impl Store {
    /// Assigns the next per-participant `survey_index` under a row lock on
    /// the participant, inserts the submission, and folds the resulting stats
    /// delta into `attention_stats`/`participant_stats` — all in the same
    /// transaction (§4.1, §5 "survey_index is strictly monotonic and dense";
    /// "increments ... occur in the same transaction as the submission").
    ///
    /// Before assigning a new index, checks whether this participant's most
    /// recent submission already has the same `description_hash`: since
    /// `survey_index` is assigned server-side, a client replay never collides
    /// on the `(participant_fk, survey_index)` UNIQUE constraint on its own —
    /// the hash comparison is what actually makes a dropped-response retry
    /// idempotent (§4.7 failure semantics), under the same lock that
    /// serializes concurrent submits for this participant.
    pub async fn record_submission(&self, submission: &NewSubmission) -> CoreResult<RecordOutcome> {
        let mut tx = self.pool().begin().await?;

        sqlx::query("SELECT id FROM participants WHERE id = $1 FOR UPDATE")
            .bind(submission.participant_fk)
            .fetch_one(&mut *tx)
            .await?;

        let latest: Option<(i64, i64, String)> = sqlx::query_as(
            r#"
            SELECT id, survey_index, description_hash FROM submissions
            WHERE participant_fk = $1
            ORDER BY survey_index DESC
            LIMIT 1
            "#,
        )
        .bind(submission.participant_fk)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some((id, survey_index, hash)) = &latest {
            if *hash == submission.description_hash {
                tx.commit().await?;
                return Ok(RecordOutcome::Replayed { submission_id: *id, survey_index: *survey_index });
            }
        }

        let next_index = latest.map(|(_, survey_index, _)| survey_index + 1).unwrap_or(0);

        let insert = sqlx::query(
            r#"
            INSERT INTO submissions (
                participant_fk, image_fk, session_id, survey_index, description, description_hash,
                word_count, rating, feedback, elapsed_seconds, is_survey, is_attention, attention_passed,
                too_fast_flag, attention_score_snapshot, quality_score, ai_suspected, ip_hash, user_agent
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING id
            "#,
        )
        .bind(submission.participant_fk)
        .bind(submission.image_fk)
        .bind(&submission.session_id)
        .bind(next_index)
        .bind(&submission.description)
        .bind(&submission.description_hash)
        .bind(submission.word_count)
        .bind(submission.rating)
        .bind(&submission.feedback)
        .bind(submission.elapsed_seconds)
        .bind(submission.is_survey)
        .bind(submission.is_attention)
        .bind(submission.attention_passed)
        .bind(submission.too_fast_flag)
        .bind(submission.attention_score_snapshot)
        .bind(submission.quality_score)
        .bind(submission.ai_suspected)
        .bind(&submission.ip_hash)
        .bind(&submission.user_agent)
        .fetch_one(&mut *tx)
        .await;

        let row = match insert {
            Ok(row) => row,
            // The replay check above already covers a dropped-response retry;
            // reaching this means two distinct descriptions were assigned the
            // same index, which the participant row lock should make
            // impossible — treated as a genuine conflict, not an idempotent
            // replay.
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                return Err(CoreError::conflict("submission already exists for this participant"));
            }
            Err(other) => return Err(other.into()),
        };
        let submission_id: i64 = row.try_get("id")?;

        increment_stats_tx(
            &mut tx,
            submission.participant_fk,
            submission.word_count,
            submission.is_survey,
            submission.attention_passed,
        )
        .await?;

        tx.commit().await?;
        Ok(RecordOutcome::Created { submission_id, survey_index: next_index })
    }

    pub async fn get_submission_public(&self, submission_id: i64) -> CoreResult<Option<SubmissionRow>> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, participant_fk, image_fk, session_id, survey_index, description, description_hash,
                   word_count, rating, feedback, elapsed_seconds, is_survey, is_attention, attention_passed,
                   too_fast_flag, quality_score, ai_suspected, created_at
            FROM submissions WHERE id = $1
            "#,
        )
        .bind(submission_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }
}
