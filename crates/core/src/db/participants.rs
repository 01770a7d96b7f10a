use crate::error::CoreResult;
use crate::models::{Demographics, ParticipantPublic, ParticipantRow};

use super::Store;

pub enum CreateOutcome {
    Created(ParticipantRow),
    AlreadyExists(ParticipantRow),
}

impl Store {
    /// Inserts a participant, or reports the existing row when the business
    /// id is already taken so the caller (C5) can decide idempotent-replay
    /// vs. conflict by comparing demographics (§4.5).
    pub async fn create_participant(
        &self,
        demographics: &Demographics,
        ip_hash: &str,
        user_agent: &str,
    ) -> CoreResult<CreateOutcome> {
        if let Some(existing) = self.get_participant_row(&demographics.participant_id).await? {
            return Ok(CreateOutcome::AlreadyExists(existing));
        }

        let inserted = sqlx::query_as::<_, ParticipantRow>(
            r#"
            INSERT INTO participants (
                participant_id, session_id, username, email, phone, gender, age,
                place, native_language, prior_experience, ip_hash, user_agent
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (participant_id) DO NOTHING
            RETURNING id, participant_id, session_id, username, email, phone, gender, age,
                      place, native_language, prior_experience, payment_status, ip_hash, user_agent,
                      consent_given, consent_timestamp, created_at
            "#,
        )
        .bind(&demographics.participant_id)
        .bind(&demographics.session_id)
        .bind(&demographics.username)
        .bind(&demographics.email)
        .bind(&demographics.phone)
        .bind(&demographics.gender)
        .bind(demographics.age)
        .bind(&demographics.place)
        .bind(&demographics.native_language)
        .bind(&demographics.prior_experience)
        .bind(ip_hash)
        .bind(user_agent)
        .fetch_optional(self.pool())
        .await?;

        match inserted {
            Some(row) => Ok(CreateOutcome::Created(row)),
            // Lost the race to a concurrent insert between the read above and this write.
            None => {
                let row = self.get_participant_row(&demographics.participant_id).await?.ok_or_else(|| {
                    crate::error::CoreError::internal(anyhow::anyhow!("participant vanished after conflicting insert"))
                })?;
                Ok(CreateOutcome::AlreadyExists(row))
            }
        }
    }

    pub async fn get_participant_row(&self, business_id: &str) -> CoreResult<Option<ParticipantRow>> {
        let row = sqlx::query_as::<_, ParticipantRow>(
            r#"
            SELECT id, participant_id, session_id, username, email, phone, gender, age,
                   place, native_language, prior_experience, payment_status, ip_hash, user_agent,
                   consent_given, consent_timestamp, created_at
            FROM participants WHERE participant_id = $1
            "#,
        )
        .bind(business_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    pub async fn get_participant_public(&self, business_id: &str) -> CoreResult<Option<ParticipantPublic>> {
        let row = sqlx::query_as::<_, ParticipantPublic>(
            r#"
            SELECT participant_id, session_id, username, email, phone, gender, age,
                   place, native_language, prior_experience, payment_status,
                   consent_given, consent_timestamp, created_at
            FROM participants WHERE participant_id = $1
            "#,
        )
        .bind(business_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }
}
